//! Trying(UAS): an INVITE has been received and no provisional response
//! other than the implicit 100 has been sent yet.
//!
//! The final-response handlers here are shared with Ringing(UAS), which
//! reacts to Connect, Redirect, Fail and Disconnect in the same way.

use tokio::time::Instant;
use tracing::{debug, warn};

use super::context::LegContext;
use super::events::{CallEvent, CallEventKind, RedirectData, ResponseData};
use super::state::{Cancellation, Outcome, StateId, Transition, UaState};
use super::types::{HeaderSource, ReasonHeader, SipContact, SipHeader, UasResponse};

pub struct UasTrying;

impl UaState for UasTrying {
    fn id(&self) -> StateId {
        StateId::Trying
    }

    fn recv_event(&mut self, leg: &mut LegContext, event: CallEvent) -> Outcome {
        if is_trying_indication(&event) {
            return Outcome::NoTransition;
        }
        let Some(event) = leg.suspend_for_renegotiation(event) else {
            return Outcome::Suspend;
        };

        let CallEvent { kind, rtime, origin } = event;
        match kind {
            CallEventKind::Ring(data) => {
                let data = data.unwrap_or_else(|| ResponseData::new(180, "Ringing", None));
                let code = data.code;
                send_progress(leg, data, rtime);
                // The first provisional answer replaces the no-progress
                // deadline with the expiration deadline.
                if leg.cancel_no_progress_timer() {
                    leg.arm_expire_timer();
                }
                Outcome::Transition(
                    Transition::to(StateId::Ringing)
                        .notify(leg.ring_cbs.clone(), rtime, origin)
                        .with_code(code),
                )
            }
            CallEventKind::Connect { data, extra_headers } => connect(leg, data, extra_headers, rtime, origin),
            CallEventKind::PreConnect { data, extra_headers } => pre_connect(leg, data, extra_headers),
            CallEventKind::Redirect(data) => redirect(leg, data, rtime, origin),
            CallEventKind::Fail {
                status,
                extra_headers,
                challenge,
                reason,
            } => fail(leg, status, extra_headers, challenge, reason, rtime, origin),
            CallEventKind::Disconnect { reason } => disconnect(leg, reason, rtime, origin),
            kind @ (CallEventKind::Info { .. } | CallEventKind::Update { .. }) => {
                warn!(leg = %leg.call_id, "Wrong event {} in the {} state", kind.name(), StateId::Trying);
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
        Some(cancel(leg, rtime, req))
    }
}

/// A Ring carrying 100 repeats the implicit Trying indication
pub(super) fn is_trying_indication(event: &CallEvent) -> bool {
    matches!(&event.kind, CallEventKind::Ring(Some(data)) if data.code == 100)
}

/// Send a provisional response and record the first-progress timestamp
pub(super) fn send_progress(leg: &mut LegContext, data: ResponseData, rtime: Instant) {
    leg.local_sdp = data.body.clone();
    leg.send_response(UasResponse::new(data.code, data.reason).with_body(data.body));
    if leg.p1xx_ts.is_none() {
        leg.p1xx_ts = Some(rtime);
    }
}

pub(super) fn connect(
    leg: &mut LegContext,
    data: ResponseData,
    extra_headers: Option<Vec<SipHeader>>,
    rtime: Instant,
    origin: String,
) -> Outcome {
    leg.local_sdp = data.body.clone();
    leg.cancel_no_progress_timer();
    let response = UasResponse::new(data.code, data.reason)
        .with_body(data.body)
        .with_contact(leg.local_contact.clone())
        .with_ack_wait(false)
        .with_extra_headers(extra_headers);
    leg.send_response(response);
    leg.cancel_expire_timer();
    leg.start_credit_timer(rtime);
    leg.connect_ts = Some(rtime);
    Outcome::Transition(Transition::to(StateId::Connected).notify(leg.conn_cbs.clone(), rtime, origin))
}

/// 2xx that still waits for the ACK; completion is up to the Connected state
pub(super) fn pre_connect(
    leg: &mut LegContext,
    data: ResponseData,
    extra_headers: Option<Vec<SipHeader>>,
) -> Outcome {
    leg.local_sdp = data.body.clone();
    leg.cancel_no_progress_timer();
    let response = UasResponse::new(data.code, data.reason)
        .with_body(data.body)
        .with_contact(leg.local_contact.clone())
        .with_ack_wait(true)
        .with_extra_headers(extra_headers);
    leg.send_response(response);
    Outcome::Transition(Transition::to(StateId::Connected))
}

pub(super) fn redirect(
    leg: &mut LegContext,
    data: Option<RedirectData>,
    rtime: Instant,
    origin: String,
) -> Outcome {
    let data = data.unwrap_or_default();
    let code = data.code;
    let response = UasResponse::new(data.code, data.reason)
        .with_body(data.body)
        .with_contact(data.target.map(SipContact::new));
    leg.send_response(response);
    leg.cancel_timers();
    leg.disconnect_ts = Some(rtime);
    Outcome::Transition(
        Transition::to(StateId::Failed)
            .notify(leg.fail_cbs.clone(), rtime, origin)
            .with_code(code),
    )
}

#[allow(clippy::too_many_arguments)]
pub(super) fn fail(
    leg: &mut LegContext,
    status: Option<(u16, String)>,
    extra_headers: Option<Vec<SipHeader>>,
    challenge: Option<SipHeader>,
    reason: Option<ReasonHeader>,
    rtime: Instant,
    origin: String,
) -> Outcome {
    let (code, phrase) = status.unwrap_or_else(|| (500, "Failed".to_string()));
    let mut headers = extra_headers.unwrap_or_default();
    headers.extend(challenge);
    let response = UasResponse::new(code, phrase)
        .with_extra_headers(Some(headers))
        .with_reason(reason);
    leg.send_response(response);
    leg.cancel_timers();
    leg.disconnect_ts = Some(rtime);
    Outcome::Transition(
        Transition::to(StateId::Failed)
            .notify(leg.fail_cbs.clone(), rtime, origin)
            .with_code(code),
    )
}

pub(super) fn disconnect(
    leg: &mut LegContext,
    reason: Option<ReasonHeader>,
    rtime: Instant,
    origin: String,
) -> Outcome {
    leg.send_response(UasResponse::new(500, "Disconnected").with_reason(reason));
    leg.cancel_timers();
    leg.disconnect_ts = Some(rtime);
    Outcome::Transition(
        Transition::to(StateId::Disconnected)
            .notify(leg.disc_cbs.clone(), rtime, origin)
            .with_code(leg.last_scode),
    )
}

/// Orchestrator-initiated abort of an unanswered call
pub(super) fn cancel(leg: &mut LegContext, rtime: Instant, req: Option<&dyn HeaderSource>) -> Cancellation {
    leg.disconnect_ts = Some(rtime);
    let transition = Transition::to(StateId::Disconnected).notify(leg.disc_cbs.clone(), rtime, leg.origin.clone());
    let reason = req.and_then(|req| request_reason(leg, req));
    let notify = CallEvent::new(CallEventKind::Disconnect { reason }, rtime, leg.origin.clone());
    Cancellation { transition, notify }
}

/// Reason header of the request that triggered a cancel. Malformed values
/// are dropped.
fn request_reason(leg: &LegContext, req: &dyn HeaderSource) -> Option<ReasonHeader> {
    let raw = req.header_value("reason")?;
    match raw.parse::<ReasonHeader>() {
        Ok(reason) => Some(reason),
        Err(e) => {
            debug!(leg = %leg.call_id, "Ignoring unusable Reason header: {}", e);
            None
        }
    }
}
