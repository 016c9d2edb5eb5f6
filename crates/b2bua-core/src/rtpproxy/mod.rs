//! RTP proxy control client
//!
//! Supervises an external media relay over its text control protocol:
//!
//! | Command         | Purpose                      | Success reply      |
//! |-----------------|------------------------------|--------------------|
//! | `V`             | protocol version             | `20040107`         |
//! | `VF 20071218`   | copy (recording) support     | `1`                |
//! | `VF 20080403`   | statistics support           | `1`                |
//! | `VF 20081224`   | timeout notification support | `1`                |
//! | `VF 20090810`   | automatic socket bind        | `1`                |
//! | `Ib`            | usage statistics             | `key: value` lines |
//!
//! The logic lives in [`RelayMachine`]; [`RelayClient`] runs it in a task
//! over a UDP or local-socket [`ControlTransport`].

mod address;
mod client;
mod command;
mod machine;
mod stats;
pub mod transport;

pub use address::RelayAddress;
pub use client::RelayClient;
pub use command::{Capability, RelayCommand, SUPPORTED_VERSION};
pub use machine::{RelayAction, RelayCapabilities, RelayMachine, RelayStatus, RelayTimer};
pub use stats::RelayStats;
pub use transport::ControlTransport;
