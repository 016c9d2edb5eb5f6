//! The contract shared by every UAS state handler.
//!
//! A handler never installs the next state itself. It performs the protocol
//! side effects for an event against the [`LegContext`] and returns an
//! [`Outcome`]; the dispatcher in [`super::UasLeg`] installs the new state and
//! runs the callbacks carried by the [`Transition`].

use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;

use super::context::LegContext;
use super::events::CallEvent;
use super::types::HeaderSource;

/// Lifecycle callback run by the dispatcher after a transition
pub type LegCallback = Arc<dyn Fn(&TransitionNotice) + Send + Sync>;

/// Identifier of a UAS call-leg state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateId {
    Trying,
    Ringing,
    Connected,
    Failed,
    Disconnected,
}

impl StateId {
    /// No transitions leave a terminal state
    pub fn is_terminal(self) -> bool {
        matches!(self, StateId::Failed | StateId::Disconnected)
    }

    pub(crate) fn handler(self) -> Box<dyn UaState> {
        match self {
            StateId::Trying => Box::new(super::trying::UasTrying),
            StateId::Ringing => Box::new(super::ringing::UasRinging),
            StateId::Connected => Box::new(super::connected::UaConnected),
            StateId::Failed => Box::new(super::terminal::UaFailed),
            StateId::Disconnected => Box::new(super::terminal::UaDisconnected),
        }
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StateId::Trying => "Trying(UAS)",
            StateId::Ringing => "Ringing(UAS)",
            StateId::Connected => "Connected",
            StateId::Failed => "Failed",
            StateId::Disconnected => "Disconnected",
        };
        f.write_str(name)
    }
}

/// What the dispatcher passes to lifecycle callbacks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionNotice {
    pub call_id: String,
    pub state: StateId,
    pub rtime: Option<Instant>,
    pub origin: Option<String>,
    pub code: Option<u16>,
}

/// A requested state change with the metadata handed to callbacks
#[derive(Clone)]
pub struct Transition {
    pub next: StateId,
    pub callbacks: Vec<LegCallback>,
    pub rtime: Option<Instant>,
    pub origin: Option<String>,
    pub code: Option<u16>,
}

impl Transition {
    /// Transition without callbacks or metadata
    pub fn to(next: StateId) -> Self {
        Self {
            next,
            callbacks: Vec::new(),
            rtime: None,
            origin: None,
            code: None,
        }
    }

    pub fn notify(mut self, callbacks: Vec<LegCallback>, rtime: Instant, origin: impl Into<String>) -> Self {
        self.callbacks = callbacks;
        self.rtime = Some(rtime);
        self.origin = Some(origin.into());
        self
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(code);
        self
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("next", &self.next)
            .field("callbacks", &self.callbacks.len())
            .field("rtime", &self.rtime)
            .field("origin", &self.origin)
            .field("code", &self.code)
            .finish()
    }
}

/// Result of handing an event to a state
#[derive(Debug)]
pub enum Outcome {
    /// Nothing to install: the event was handled in place or was invalid
    /// for this state
    NoTransition,
    /// Waiting on session renegotiation; no side effect was performed
    Suspend,
    Transition(Transition),
}

/// Forced teardown produced by [`UaState::cancel`]
#[derive(Debug)]
pub struct Cancellation {
    pub transition: Transition,
    /// Emitted upward after the transition is installed
    pub notify: CallEvent,
}

pub trait UaState: Send {
    fn id(&self) -> StateId;

    fn recv_event(&mut self, leg: &mut LegContext, event: CallEvent) -> Outcome;

    /// Abort the call on behalf of the orchestrator. States that cannot be
    /// cancelled return `None`.
    fn cancel(
        &mut self,
        _leg: &mut LegContext,
        _rtime: Instant,
        _req: Option<&dyn HeaderSource>,
    ) -> Option<Cancellation> {
        None
    }

    fn is_terminal(&self) -> bool {
        self.id().is_terminal()
    }
}
