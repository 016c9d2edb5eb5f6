use tracing::warn;

/// Usage gauges reported by the proxy's `Ib` reply. `None` means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub sessions_created: Option<u64>,
    pub active_sessions: Option<u64>,
    pub active_streams: Option<u64>,
    pub packets_received: Option<u64>,
    pub packets_transmitted: Option<u64>,
}

impl RelayStats {
    /// Parse newline-separated `key: value` records. Every gauge is set;
    /// keys absent from the reply read as zero.
    pub fn parse(reply: &str) -> Self {
        let mut sessions_created = 0;
        let mut active_sessions = 0;
        let mut active_streams = 0;
        let mut packets_received = 0;
        let mut packets_transmitted = 0;

        for line in reply.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            let slot = match key {
                "sessions created" => &mut sessions_created,
                "active sessions" => &mut active_sessions,
                "active streams" => &mut active_streams,
                "packets received" => &mut packets_received,
                "packets transmitted" => &mut packets_transmitted,
                _ => continue,
            };
            *slot = value.trim().parse().unwrap_or_else(|_| {
                warn!("Unparseable value {:?} for {:?} in relay stats", value.trim(), key);
                0
            });
        }

        Self {
            sessions_created: Some(sessions_created),
            active_sessions: Some(active_sessions),
            active_streams: Some(active_streams),
            packets_received: Some(packets_received),
            packets_transmitted: Some(packets_transmitted),
        }
    }
}
