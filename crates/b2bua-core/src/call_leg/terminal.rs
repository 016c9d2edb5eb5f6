//! Terminal states. Every event is discarded and cancellation is refused.

use tracing::debug;

use super::context::LegContext;
use super::events::CallEvent;
use super::state::{Outcome, StateId, UaState};

pub struct UaFailed;

impl UaState for UaFailed {
    fn id(&self) -> StateId {
        StateId::Failed
    }

    fn recv_event(&mut self, leg: &mut LegContext, event: CallEvent) -> Outcome {
        debug!(leg = %leg.call_id, "Ignoring {} in the {} state", event, StateId::Failed);
        Outcome::NoTransition
    }
}

pub struct UaDisconnected;

impl UaState for UaDisconnected {
    fn id(&self) -> StateId {
        StateId::Disconnected
    }

    fn recv_event(&mut self, leg: &mut LegContext, event: CallEvent) -> Outcome {
        debug!(leg = %leg.call_id, "Ignoring {} in the {} state", event, StateId::Disconnected);
        Outcome::NoTransition
    }
}
