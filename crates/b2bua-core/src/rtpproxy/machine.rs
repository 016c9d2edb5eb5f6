//! RTP proxy control-client state machine.
//!
//! [`RelayMachine`] holds one proxy's online status, capability flags and
//! usage gauges. It performs no I/O: every input (a reply or a fired timer)
//! yields the [`RelayAction`]s the driver must carry out. Replies arrive as
//! `Option<String>`, `None` standing for a timeout or transport failure.
//!
//! ```text
//!   offline ──V == SUPPORTED_VERSION──▶ online ──▶ caps chain + heartbeat
//!      ▲  │                                │
//!      │  └─ other reply: retry V later    │ V mismatch / Ib timeout
//!      └───────────────────────────────────┘ (retry V later)
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::command::{Capability, RelayCommand, SUPPORTED_VERSION};
use super::stats::RelayStats;

/// Timers the machine asks the driver to arm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayTimer {
    VersionCheck,
    Heartbeat,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayAction {
    /// Send a command; its reply must be fed to [`RelayMachine::on_reply`]
    Send(RelayCommand),
    /// Arm a one-shot timer; on expiry call [`RelayMachine::on_timer`]
    Schedule { timer: RelayTimer, after: Duration },
    /// Shut down the transport worker. Emitted at most once.
    ReleaseWorker,
}

/// Optional features confirmed by the proxy for the current online period
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayCapabilities {
    pub copy: bool,
    pub stat: bool,
    pub tnot: bool,
    pub sbind: bool,
}

/// Snapshot published to observers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayStatus {
    pub online: bool,
    pub capabilities: RelayCapabilities,
    pub caps_done: bool,
    pub stats: RelayStats,
}

pub struct RelayMachine {
    label: String,
    online: bool,
    capabilities: RelayCapabilities,
    caps_done: bool,
    stats: RelayStats,
    shutdown: Arc<AtomicBool>,
    worker_released: bool,
    heartbeat_interval: Duration,
    version_retry: Duration,
}

impl RelayMachine {
    pub fn new(
        label: impl Into<String>,
        shutdown: Arc<AtomicBool>,
        heartbeat_interval: Duration,
        version_retry: Duration,
    ) -> Self {
        Self {
            label: label.into(),
            online: false,
            capabilities: RelayCapabilities::default(),
            caps_done: false,
            stats: RelayStats::default(),
            shutdown,
            worker_released: false,
            heartbeat_interval,
            version_retry,
        }
    }

    pub fn status(&self) -> RelayStatus {
        RelayStatus {
            online: self.online,
            capabilities: self.capabilities,
            caps_done: self.caps_done,
            stats: self.stats,
        }
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn worker_released(&self) -> bool {
        self.worker_released
    }

    /// Initial version check
    pub fn start(&mut self) -> Vec<RelayAction> {
        let mut actions = Vec::new();
        if !self.stopping(&mut actions) {
            actions.push(RelayAction::Send(RelayCommand::Version));
        }
        actions
    }

    pub fn on_timer(&mut self, timer: RelayTimer) -> Vec<RelayAction> {
        let mut actions = Vec::new();
        if self.stopping(&mut actions) {
            return actions;
        }
        match timer {
            RelayTimer::VersionCheck => actions.push(RelayAction::Send(RelayCommand::Version)),
            RelayTimer::Heartbeat => actions.push(RelayAction::Send(RelayCommand::Stats)),
        }
        actions
    }

    pub fn on_reply(&mut self, command: RelayCommand, reply: Option<&str>) -> Vec<RelayAction> {
        let mut actions = Vec::new();
        if self.stopping(&mut actions) {
            return actions;
        }
        match command {
            RelayCommand::Version => self.version_check_reply(reply, &mut actions),
            RelayCommand::Feature(capability) => self.caps_reply(capability, reply, &mut actions),
            RelayCommand::Stats => self.heartbeat_reply(reply, &mut actions),
        }
        actions
    }

    /// Shutdown gate checked before any other work. Releases the worker the
    /// first time it observes the flag.
    fn stopping(&mut self, actions: &mut Vec<RelayAction>) -> bool {
        if !self.shutdown.load(Ordering::Acquire) {
            return false;
        }
        if !self.worker_released {
            self.worker_released = true;
            debug!(relay = %self.label, "Shutdown observed, releasing worker");
            actions.push(RelayAction::ReleaseWorker);
        }
        true
    }

    fn version_check_reply(&mut self, version: Option<&str>, actions: &mut Vec<RelayAction>) {
        if version == Some(SUPPORTED_VERSION) {
            self.go_online(actions);
        } else if self.online {
            warn!(relay = %self.label, ?version, "Unsupported protocol version");
            self.go_offline(actions);
        } else {
            debug!(relay = %self.label, ?version, "Relay still unavailable");
            actions.push(self.retry_version_check());
        }
    }

    fn caps_reply(&mut self, capability: Capability, reply: Option<&str>, actions: &mut Vec<RelayAction>) {
        if !self.online {
            return;
        }
        // No reply: the chain stalls until the next online transition
        let Some(reply) = reply else {
            debug!(relay = %self.label, ?capability, "Capability probe timed out");
            return;
        };
        let supported = reply == "1";
        debug!(relay = %self.label, ?capability, supported, "Capability probe answered");

        match capability {
            Capability::Copy => {
                self.capabilities.copy = supported;
                if supported {
                    actions.push(RelayAction::Send(RelayCommand::Feature(Capability::Stat)));
                } else {
                    self.capabilities = RelayCapabilities::default();
                    self.finish_caps();
                }
            }
            Capability::Stat => {
                self.capabilities.stat = supported;
                if supported {
                    actions.push(RelayAction::Send(RelayCommand::Feature(Capability::Tnot)));
                } else {
                    self.capabilities.tnot = false;
                    self.capabilities.sbind = false;
                    self.finish_caps();
                }
            }
            // Unlike copy and stat, a negative tnot answer does not end the chain
            Capability::Tnot => {
                self.capabilities.tnot = supported;
                actions.push(RelayAction::Send(RelayCommand::Feature(Capability::Sbind)));
            }
            Capability::Sbind => {
                self.capabilities.sbind = supported;
                self.finish_caps();
            }
        }
    }

    fn finish_caps(&mut self) {
        self.caps_done = true;
        info!(relay = %self.label, capabilities = ?self.capabilities, "Capability probing complete");
    }

    fn heartbeat_reply(&mut self, reply: Option<&str>, actions: &mut Vec<RelayAction>) {
        if !self.online {
            return;
        }
        match reply {
            Some(reply) => self.stats = RelayStats::parse(reply),
            None => {
                warn!(relay = %self.label, "Heartbeat timed out");
                self.stats.active_sessions = None;
                self.go_offline(actions);
            }
        }
        // TODO: a heartbeat is re-armed even right after going offline; drop it
        // once the retry policy for offline relays is settled.
        actions.push(RelayAction::Schedule {
            timer: RelayTimer::Heartbeat,
            after: self.heartbeat_interval,
        });
    }

    fn go_online(&mut self, actions: &mut Vec<RelayAction>) {
        if self.online {
            return;
        }
        self.caps_done = false;
        self.capabilities = RelayCapabilities::default();
        actions.push(RelayAction::Send(RelayCommand::Feature(Capability::Copy)));
        self.online = true;
        info!(relay = %self.label, "Relay is online");
        actions.push(RelayAction::Send(RelayCommand::Stats));
    }

    fn go_offline(&mut self, actions: &mut Vec<RelayAction>) {
        if !self.online {
            return;
        }
        self.online = false;
        warn!(relay = %self.label, "Relay is offline");
        actions.push(self.retry_version_check());
    }

    fn retry_version_check(&self) -> RelayAction {
        RelayAction::Schedule {
            timer: RelayTimer::VersionCheck,
            after: self.version_retry,
        }
    }
}
