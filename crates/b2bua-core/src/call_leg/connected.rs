//! Connected: the final 2xx has been sent.

use tracing::{debug, warn};

use super::context::LegContext;
use super::events::{CallEvent, CallEventKind};
use super::state::{Outcome, StateId, Transition, UaState};

pub struct UaConnected;

impl UaState for UaConnected {
    fn id(&self) -> StateId {
        StateId::Connected
    }

    fn recv_event(&mut self, leg: &mut LegContext, event: CallEvent) -> Outcome {
        let CallEvent { kind, rtime, origin } = event;
        match kind {
            CallEventKind::Disconnect { reason } => {
                debug!(leg = %leg.call_id, "Disconnecting established call");
                leg.send_bye(reason);
                leg.cancel_timers();
                leg.disconnect_ts = Some(rtime);
                Outcome::Transition(Transition::to(StateId::Disconnected).notify(leg.disc_cbs.clone(), rtime, origin))
            }
            other => {
                warn!(leg = %leg.call_id, "Wrong event {} in the {} state", other.name(), StateId::Connected);
                Outcome::NoTransition
            }
        }
    }
}
