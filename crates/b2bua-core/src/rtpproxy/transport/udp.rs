use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

use super::ControlTransport;
use crate::errors::Result;

// Largest reply we expect from the proxy
const MAX_REPLY_SIZE: usize = 8192;

/// UDP control channel.
///
/// Each command is prefixed with a random cookie that the proxy echoes back,
/// so late replies to earlier attempts are recognised and dropped. Exchanges
/// on one socket are serialized.
pub struct UdpControlTransport {
    socket: UdpSocket,
    remote: SocketAddr,
    timeout: Duration,
    attempts: u32,
    exchange: Mutex<()>,
    closed: AtomicBool,
}

impl UdpControlTransport {
    /// Bind an ephemeral local socket for talking to `remote`
    pub async fn bind(remote: SocketAddr, timeout: Duration, attempts: u32) -> Result<Self> {
        let local: SocketAddr = if remote.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        debug!("RTP proxy control socket {} bound for {}", socket.local_addr()?, remote);
        Ok(Self {
            socket,
            remote,
            timeout,
            attempts: attempts.max(1),
            exchange: Mutex::new(()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn remote(&self) -> SocketAddr {
        self.remote
    }

    async fn await_reply(&self, cookie: &str) -> std::io::Result<String> {
        let mut buf = vec![0u8; MAX_REPLY_SIZE];
        loop {
            let (len, src) = self.socket.recv_from(&mut buf).await?;
            if src != self.remote {
                trace!("Dropping datagram from unexpected source {}", src);
                continue;
            }
            let datagram = String::from_utf8_lossy(&buf[..len]);
            match datagram.split_once(char::is_whitespace) {
                Some((got, reply)) if got == cookie => return Ok(reply.trim().to_string()),
                _ => trace!("Dropping stale reply {:?}", datagram),
            }
        }
    }
}

#[async_trait]
impl ControlTransport for UdpControlTransport {
    async fn send_command(&self, command: &str) -> Option<String> {
        if self.closed.load(Ordering::Acquire) {
            return None;
        }
        let _guard = self.exchange.lock().await;
        let cookie = format!("{:08x}", rand::random::<u32>());
        let datagram = format!("{} {}\n", cookie, command);

        for attempt in 1..=self.attempts {
            if let Err(e) = self.socket.send_to(datagram.as_bytes(), self.remote).await {
                warn!("Failed to send {:?} to {}: {}", command, self.remote, e);
                return None;
            }
            match tokio::time::timeout(self.timeout, self.await_reply(&cookie)).await {
                Ok(Ok(reply)) => return Some(reply),
                Ok(Err(e)) => {
                    warn!("Receive from {} failed: {}", self.remote, e);
                    return None;
                }
                Err(_) => debug!(attempt, "No reply to {:?} from {}", command, self.remote),
            }
        }
        None
    }

    fn is_local(&self) -> bool {
        false
    }

    async fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
