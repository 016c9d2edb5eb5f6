//! Control-channel transports.
//!
//! Both transports carry one text command per exchange and hand back the
//! proxy's reply, or `None` when no usable reply arrived in time.

#[cfg(unix)]
mod local;
mod udp;

#[cfg(unix)]
pub use local::LocalControlTransport;
pub use udp::UdpControlTransport;

use async_trait::async_trait;

#[async_trait]
pub trait ControlTransport: Send + Sync {
    /// Send `command` and wait for its reply. Timeouts, I/O failures and
    /// commands issued after shutdown all yield `None`.
    async fn send_command(&self, command: &str) -> Option<String>;

    /// Whether this transport talks to a local control socket
    fn is_local(&self) -> bool;

    /// Stop the transport. Later commands yield `None`.
    async fn shutdown(&self);
}
