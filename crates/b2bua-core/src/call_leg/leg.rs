//! Dispatcher driving a UAS call leg through its states.

use tokio::time::Instant;
use tracing::{debug, error, info};

use super::context::LegContext;
use super::events::{CallEvent, PendingEvent};
use super::state::{Outcome, StateId, Transition, TransitionNotice, UaState};
use super::types::HeaderSource;

/// What happened to an event handed to [`UasLeg`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// No state change (handled in place, invalid for the state, or refused)
    Ignored,
    /// Parked until the renegotiation hook resumes it
    Suspended,
    Changed { from: StateId, to: StateId },
}

/// Server side of one call leg.
///
/// Owns the current state handler and the leg context. All calls for one
/// leg must be serialized by the owner; nothing here locks.
pub struct UasLeg {
    state: Box<dyn UaState>,
    ctx: LegContext,
}

impl UasLeg {
    /// A fresh leg in Trying(UAS)
    pub fn new(ctx: LegContext) -> Self {
        Self {
            state: StateId::Trying.handler(),
            ctx,
        }
    }

    pub fn state(&self) -> StateId {
        self.state.id()
    }

    pub fn context(&self) -> &LegContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut LegContext {
        &mut self.ctx
    }

    pub fn recv_event(&mut self, event: CallEvent) -> Dispatch {
        debug!(leg = %self.ctx.call_id, state = %self.state.id(), "Received {}", event);
        match self.state.recv_event(&mut self.ctx, event) {
            Outcome::NoTransition => Dispatch::Ignored,
            Outcome::Suspend => Dispatch::Suspended,
            Outcome::Transition(transition) => self.change_state(transition),
        }
    }

    /// Re-submit an event once its body has been renegotiated. The event may
    /// suspend again if the body still needs updating.
    pub fn resume(&mut self, pending: PendingEvent) -> Dispatch {
        self.recv_event(pending.into_event())
    }

    /// Abort the leg on behalf of the orchestrator. `req` is the request that
    /// triggered the abort, if any; its Reason header is forwarded upward.
    pub fn cancel(&mut self, rtime: Instant, req: Option<&dyn HeaderSource>) -> Dispatch {
        match self.state.cancel(&mut self.ctx, rtime, req) {
            Some(cancellation) => {
                let dispatch = self.change_state(cancellation.transition);
                self.ctx.emit_event(cancellation.notify);
                dispatch
            }
            None => {
                debug!(leg = %self.ctx.call_id, state = %self.state.id(), "Cancel ignored");
                Dispatch::Ignored
            }
        }
    }

    fn change_state(&mut self, transition: Transition) -> Dispatch {
        let from = self.state.id();
        if self.state.is_terminal() {
            debug_assert!(false, "transition {} -> {} out of a terminal state", from, transition.next);
            error!(leg = %self.ctx.call_id, "Refusing transition {} -> {} out of a terminal state", from, transition.next);
            return Dispatch::Ignored;
        }

        let to = transition.next;
        self.state = to.handler();
        if to.is_terminal() {
            self.ctx.mark_terminated();
        }
        info!(leg = %self.ctx.call_id, "State changed {} -> {}", from, to);

        let notice = TransitionNotice {
            call_id: self.ctx.call_id.clone(),
            state: to,
            rtime: transition.rtime,
            origin: transition.origin,
            code: transition.code,
        };
        for callback in &transition.callbacks {
            callback(&notice);
        }
        Dispatch::Changed { from, to }
    }
}

impl std::fmt::Debug for UasLeg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UasLeg")
            .field("state", &self.state.id())
            .field("ctx", &self.ctx)
            .finish()
    }
}
