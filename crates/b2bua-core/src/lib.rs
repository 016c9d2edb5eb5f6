//! # RVoIP B2BUA Core
//!
//! Signaling core of a back-to-back user agent.
//!
//! ## Features
//!
//! - **UAS call leg**: the incoming leg of a call, from the first INVITE
//!   through ringing, answer, failure or cancellation
//! - **RTP proxy client**: version check, capability probing and statistics
//!   polling of an external media relay
//!
//! ## Architecture
//!
//! - `call_leg`: per-leg state machine and the signaling hooks it drives
//! - `rtpproxy`: relay control protocol, transports and client task
//! - `timer`: one-shot cancellable timers on the tokio clock
//! - `config`: TOML configuration
//! - `logging`: tracing subscriber setup
//! - `errors`: crate error type

pub mod call_leg;
pub mod config;
pub mod errors;
pub mod logging;
pub mod rtpproxy;
pub mod timer;

pub use call_leg::{CallEvent, CallEventKind, LegContext, LegSignaling, StateId, UasLeg};
pub use config::{B2buaConfig, RelayConfig, UasConfig};
pub use errors::{B2buaError, Result};
pub use logging::{setup_logging, LoggingConfig};
pub use rtpproxy::{RelayClient, RelayStatus};
pub use timer::{Scheduler, TimerHandle, TokioScheduler};
