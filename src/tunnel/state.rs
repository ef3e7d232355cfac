//! Tunnel lifecycle state machine (§4.6). Close cousin of `TunnelStatus`
//! (`models/ssh/tunnel.rs`) but adds `Timeout` as its own terminal state
//! rather than folding it into `Error`, since §4.6 tracks timeout as a
//! distinct outcome from a general connection failure.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TunnelState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
    Timeout,
}

/// Bookkeeping for one live tunnel (§4.6 "tunnel metrics"). Timestamps are
/// kept as `Instant`s — this struct never crosses a serialization boundary,
/// unlike `models::progress`/`models::diff`, which do.
#[derive(Debug, Clone)]
pub struct TunnelInfo {
    pub id: String,
    pub reuse_key: String,
    pub local_port: u16,
    pub state: TunnelState,
    pub created_at: Instant,
    pub connected_at: Option<Instant>,
    pub last_activity: Instant,
    pub connection_latency: Option<Duration>,
    pub reconnect_attempts: u32,
    pub error_count: u32,
    pub last_error: Option<String>,
    /// Number of times a caller has acquired this tunnel, including the
    /// initial creation — incremented on every `reuse_index` cache hit so
    /// callers can tell a shared tunnel from a freshly opened one.
    pub connections_count: u32,
}

impl TunnelInfo {
    pub fn new(id: String, reuse_key: String, local_port: u16) -> Self {
        let now = Instant::now();
        Self {
            id,
            reuse_key,
            local_port,
            state: TunnelState::Connecting,
            created_at: now,
            connected_at: None,
            last_activity: now,
            connection_latency: None,
            reconnect_attempts: 0,
            error_count: 0,
            last_error: None,
            connections_count: 1,
        }
    }

    pub fn mark_reused(&mut self) {
        self.connections_count += 1;
        self.last_activity = Instant::now();
        tracing::debug!(tunnel_id = %self.id, connections_count = self.connections_count, "tunnel acquired from reuse cache");
    }

    pub fn mark_connected(&mut self) {
        let now = Instant::now();
        self.state = TunnelState::Connected;
        self.connected_at = Some(now);
        self.last_activity = now;
        self.connection_latency = Some(now.duration_since(self.created_at));
        self.last_error = None;
        tracing::info!(tunnel_id = %self.id, local_port = self.local_port, "tunnel connected");
    }

    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.state = TunnelState::Failed;
        self.error_count += 1;
        let error = error.into();
        tracing::warn!(tunnel_id = %self.id, %error, "tunnel failed");
        self.last_error = Some(error);
    }

    pub fn mark_timeout(&mut self) {
        self.state = TunnelState::Timeout;
        self.error_count += 1;
        self.last_error = Some("connection timeout".to_string());
        tracing::warn!(tunnel_id = %self.id, "tunnel create timed out");
    }

    pub fn is_healthy(&self) -> bool {
        self.state == TunnelState::Connected
    }

    pub fn is_stale(&self, max_idle: Duration) -> bool {
        self.state == TunnelState::Failed || self.last_activity.elapsed() > max_idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuse_increments_connections_count_without_touching_other_fields() {
        let mut info = TunnelInfo::new("t1".to_string(), "rk".to_string(), 10000);
        info.mark_connected();
        assert_eq!(info.connections_count, 1);

        info.mark_reused();
        info.mark_reused();
        assert_eq!(info.connections_count, 3);
        assert_eq!(info.state, TunnelState::Connected);
    }
}
