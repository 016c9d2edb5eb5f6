//! Call-control events delivered to a call leg.
//!
//! Events are immutable once dispatched; the only mutation allowed is the
//! renegotiation hook updating the body of a suspended event (see
//! [`PendingEvent`]).

use std::fmt;

use tokio::time::Instant;

use super::types::{ReasonHeader, SessionBody, SipHeader};

/// Status, reason phrase and optional body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseData {
    pub code: u16,
    pub reason: String,
    pub body: Option<SessionBody>,
}

impl ResponseData {
    pub fn new(code: u16, reason: impl Into<String>, body: Option<SessionBody>) -> Self {
        Self {
            code,
            reason: reason.into(),
            body,
        }
    }
}

/// Redirect target plus the final response carrying it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectData {
    pub code: u16,
    pub reason: String,
    pub body: Option<SessionBody>,
    pub target: Option<String>,
}

impl Default for RedirectData {
    fn default() -> Self {
        Self {
            code: 500,
            reason: "Failed".to_string(),
            body: None,
            target: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEventKind {
    Ring(Option<ResponseData>),
    Connect {
        data: ResponseData,
        extra_headers: Option<Vec<SipHeader>>,
    },
    PreConnect {
        data: ResponseData,
        extra_headers: Option<Vec<SipHeader>>,
    },
    Redirect(Option<RedirectData>),
    Fail {
        status: Option<(u16, String)>,
        extra_headers: Option<Vec<SipHeader>>,
        challenge: Option<SipHeader>,
        reason: Option<ReasonHeader>,
    },
    Disconnect {
        reason: Option<ReasonHeader>,
    },
    Info {
        body: Option<SessionBody>,
    },
    Update {
        body: Option<SessionBody>,
    },
}

impl CallEventKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Ring(_) => "Ring",
            Self::Connect { .. } => "Connect",
            Self::PreConnect { .. } => "PreConnect",
            Self::Redirect(_) => "Redirect",
            Self::Fail { .. } => "Fail",
            Self::Disconnect { .. } => "Disconnect",
            Self::Info { .. } => "Info",
            Self::Update { .. } => "Update",
        }
    }
}

/// A call-control event with its receipt time and producer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallEvent {
    pub kind: CallEventKind,
    pub rtime: Instant,
    pub origin: String,
}

impl CallEvent {
    pub fn new(kind: CallEventKind, rtime: Instant, origin: impl Into<String>) -> Self {
        Self {
            kind,
            rtime,
            origin: origin.into(),
        }
    }

    /// Event received right now
    pub fn now(kind: CallEventKind, origin: impl Into<String>) -> Self {
        Self::new(kind, Instant::now(), origin)
    }

    /// Body that may require renegotiation before a response is sent
    pub fn body(&self) -> Option<&SessionBody> {
        match &self.kind {
            CallEventKind::Ring(data) => data.as_ref().and_then(|d| d.body.as_ref()),
            CallEventKind::Connect { data, .. } | CallEventKind::PreConnect { data, .. } => data.body.as_ref(),
            _ => None,
        }
    }

    fn body_mut(&mut self) -> Option<&mut SessionBody> {
        match &mut self.kind {
            CallEventKind::Ring(data) => data.as_mut().and_then(|d| d.body.as_mut()),
            CallEventKind::Connect { data, .. } | CallEventKind::PreConnect { data, .. } => data.body.as_mut(),
            _ => None,
        }
    }
}

impl fmt::Display for CallEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {}", self.kind.name(), self.origin)
    }
}

/// An event whose handling was suspended pending session renegotiation.
///
/// Handed to the renegotiation hook, which gives it back exactly once: as
/// its return value, or later through [`super::UasLeg::resume`]. Not `Clone`,
/// so it cannot be resubmitted twice.
#[derive(Debug)]
pub struct PendingEvent {
    event: CallEvent,
}

impl PendingEvent {
    pub(crate) fn new(event: CallEvent) -> Self {
        Self { event }
    }

    pub fn event(&self) -> &CallEvent {
        &self.event
    }

    /// Body awaiting renegotiation, for the hook to rewrite in place
    pub fn body_mut(&mut self) -> Option<&mut SessionBody> {
        self.event.body_mut()
    }

    pub fn into_event(self) -> CallEvent {
        self.event
    }
}
