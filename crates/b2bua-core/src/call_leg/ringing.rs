//! Ringing(UAS): a provisional response has been sent, the final one has not.

use tokio::time::Instant;
use tracing::warn;

use super::context::LegContext;
use super::events::{CallEvent, CallEventKind, ResponseData};
use super::state::{Cancellation, Outcome, StateId, UaState};
use super::trying;
use super::types::HeaderSource;

pub struct UasRinging;

impl UaState for UasRinging {
    fn id(&self) -> StateId {
        StateId::Ringing
    }

    fn recv_event(&mut self, leg: &mut LegContext, event: CallEvent) -> Outcome {
        if trying::is_trying_indication(&event) {
            return Outcome::NoTransition;
        }
        let Some(event) = leg.suspend_for_renegotiation(event) else {
            return Outcome::Suspend;
        };

        let CallEvent { kind, rtime, origin } = event;
        match kind {
            // Further provisional responses stay in Ringing
            CallEventKind::Ring(data) => {
                let data = data.unwrap_or_else(|| ResponseData::new(180, "Ringing", None));
                trying::send_progress(leg, data, rtime);
                Outcome::NoTransition
            }
            CallEventKind::Connect { data, extra_headers } => {
                trying::connect(leg, data, extra_headers, rtime, origin)
            }
            CallEventKind::PreConnect { data, extra_headers } => trying::pre_connect(leg, data, extra_headers),
            CallEventKind::Redirect(data) => trying::redirect(leg, data, rtime, origin),
            CallEventKind::Fail {
                status,
                extra_headers,
                challenge,
                reason,
            } => trying::fail(leg, status, extra_headers, challenge, reason, rtime, origin),
            CallEventKind::Disconnect { reason } => trying::disconnect(leg, reason, rtime, origin),
            kind @ (CallEventKind::Info { .. } | CallEventKind::Update { .. }) => {
                warn!(leg = %leg.call_id, "Wrong event {} in the {} state", kind.name(), StateId::Ringing);
                Outcome::NoTransition
            }
        }
    }

    fn cancel(
        &mut self,
        leg: &mut LegContext,
        rtime: Instant,
        req: Option<&dyn HeaderSource>,
    ) -> Option<Cancellation> {
        Some(trying::cancel(leg, rtime, req))
    }
}
