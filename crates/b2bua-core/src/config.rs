//! Configuration for the UAS call leg and the RTP proxy control client.
//!
//! Loaded from TOML; every section and field falls back to its default so a
//! partial file is valid.
//!
//! ```toml
//! [logging]
//! level = "debug"
//!
//! [uas]
//! no_progress_secs = 5
//! expire_secs = 300
//!
//! [relay]
//! address = "udp:127.0.0.1:22222"
//! heartbeat_interval_secs = 10
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::errors::{B2buaError, Result};
use crate::logging::LoggingConfig;
use crate::rtpproxy::RelayAddress;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct B2buaConfig {
    pub logging: LoggingConfig,
    pub uas: UasConfig,
    pub relay: RelayConfig,
}

impl B2buaConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self =
            toml::from_str(raw).map_err(|e| B2buaError::Config(format!("Invalid TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&raw)
    }

    fn validate(&self) -> Result<()> {
        self.relay.relay_address()?;
        if self.relay.heartbeat_interval_secs == 0 {
            return Err(B2buaError::Config("relay.heartbeat_interval_secs must be positive".into()));
        }
        if self.relay.version_retry_secs == 0 {
            return Err(B2buaError::Config("relay.version_retry_secs must be positive".into()));
        }
        Ok(())
    }
}

/// UAS leg timers
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UasConfig {
    /// Time allowed before the first provisional response
    pub no_progress_secs: Option<u64>,
    /// Time allowed between the first provisional and the final response
    pub expire_secs: Option<u64>,
}

impl UasConfig {
    pub fn no_progress(&self) -> Option<Duration> {
        self.no_progress_secs.map(Duration::from_secs)
    }

    pub fn expire(&self) -> Option<Duration> {
        self.expire_secs.map(Duration::from_secs)
    }
}

/// RTP proxy control channel settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// `udp:host:port`, `host:port`, `unix:/path` or `/path`
    pub address: String,
    pub heartbeat_interval_secs: u64,
    pub version_retry_secs: u64,
    pub command_timeout_ms: u64,
    pub command_retries: u32,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            address: "unix:/var/run/rtpproxy.sock".to_string(),
            heartbeat_interval_secs: 10,
            version_retry_secs: 60,
            command_timeout_ms: 1000,
            command_retries: 3,
        }
    }
}

impl RelayConfig {
    pub fn relay_address(&self) -> Result<RelayAddress> {
        self.address.parse()
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn version_retry(&self) -> Duration {
        Duration::from_secs(self.version_retry_secs)
    }

    pub fn command_timeout(&self) -> Duration {
        Duration::from_millis(self.command_timeout_ms)
    }
}
