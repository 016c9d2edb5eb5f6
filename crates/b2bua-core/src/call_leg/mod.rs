//! UAS call-leg state machine
//!
//! A leg starts in Trying(UAS) when an INVITE arrives. Call-control events
//! from the rest of the B2BUA drive it through its states:
//!
//! ```text
//!               Ring                 Connect / PreConnect
//!   Trying ───────────▶ Ringing ─────────────────────────▶ Connected
//!     │                    │                                   │
//!     │ Redirect / Fail    │ Redirect / Fail                   │ Disconnect
//!     ├───────────────────▶├──────────────▶ Failed             ▼
//!     │ Disconnect/cancel  │ Disconnect/cancel            Disconnected
//!     └────────────────────┴──────────────────────────────────▶
//! ```
//!
//! Each state implements [`UaState`]. Handlers perform the protocol side
//! effects and return an [`Outcome`]; [`UasLeg`] installs the next state and
//! invokes the lifecycle callbacks, so a transition and its side effects are
//! never observed half done.

mod connected;
mod context;
mod events;
mod leg;
mod ringing;
mod state;
mod terminal;
mod trying;
mod types;

pub use context::{LegContext, LegSignaling, LocalSdpChange};
pub use events::{CallEvent, CallEventKind, PendingEvent, RedirectData, ResponseData};
pub use leg::{Dispatch, UasLeg};
pub use state::{Cancellation, LegCallback, Outcome, StateId, Transition, TransitionNotice, UaState};
pub use types::{HeaderSource, ReasonHeader, SessionBody, SipContact, SipHeader, UasResponse};
