use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use crate::errors::{B2buaError, Result};

/// Where the RTP proxy control channel lives.
///
/// Parsed from `udp:host:port` or `host:port` for a networked proxy, and
/// `unix:/path` or `/path` for a local control socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayAddress {
    Udp(SocketAddr),
    Local(PathBuf),
}

impl RelayAddress {
    pub fn is_local(&self) -> bool {
        matches!(self, RelayAddress::Local(_))
    }
}

impl FromStr for RelayAddress {
    type Err = B2buaError;

    fn from_str(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if let Some(path) = raw.strip_prefix("unix:") {
            return local_path(path, raw);
        }
        if raw.starts_with('/') {
            return local_path(raw, raw);
        }
        let host_port = raw.strip_prefix("udp:").unwrap_or(raw);
        host_port
            .parse::<SocketAddr>()
            .map(RelayAddress::Udp)
            .map_err(|_| B2buaError::InvalidAddress(raw.to_string()))
    }
}

fn local_path(path: &str, raw: &str) -> Result<RelayAddress> {
    if path.is_empty() {
        return Err(B2buaError::InvalidAddress(raw.to_string()));
    }
    Ok(RelayAddress::Local(PathBuf::from(path)))
}

impl fmt::Display for RelayAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayAddress::Udp(addr) => write!(f, "udp:{}", addr),
            RelayAddress::Local(path) => write!(f, "unix:{}", path.display()),
        }
    }
}
