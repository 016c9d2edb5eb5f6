use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;
use tracing::debug;

use super::ControlTransport;

/// Local control socket. Every command uses its own stream connection and
/// the reply is everything the proxy writes before closing it.
pub struct LocalControlTransport {
    path: PathBuf,
    timeout: Duration,
    closed: AtomicBool,
}

impl LocalControlTransport {
    pub fn new(path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            path: path.into(),
            timeout,
            closed: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn exchange(&self, command: &str) -> std::io::Result<String> {
        let mut stream = UnixStream::connect(&self.path).await?;
        stream.write_all(format!("{}\n", command).as_bytes()).await?;
        stream.shutdown().await?;
        let mut reply = String::new();
        stream.read_to_string(&mut reply).await?;
        Ok(reply.trim().to_string())
    }
}

#[async_trait]
impl ControlTransport for LocalControlTransport {
    async fn send_command(&self, command: &str) -> Option<String> {
        if self.closed.load(Ordering::Acquire) {
            return None;
        }
        match tokio::time::timeout(self.timeout, self.exchange(command)).await {
            Ok(Ok(reply)) => Some(reply),
            Ok(Err(e)) => {
                debug!("Control socket {} failed for {:?}: {}", self.path.display(), command, e);
                None
            }
            Err(_) => {
                debug!("No reply to {:?} from {}", command, self.path.display());
                None
            }
        }
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
    }
}
