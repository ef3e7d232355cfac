//! Tunnel metrics snapshot (§4.6 `get_tunnel_metrics`): uptime, latency,
//! and error counts derived from a `TunnelInfo`.

use std::time::Duration;

use serde::Serialize;

use super::state::{TunnelInfo, TunnelState};

#[derive(Debug, Clone, Serialize)]
pub struct TunnelMetrics {
    pub tunnel_id: String,
    pub state: TunnelState,
    pub local_port: u16,
    pub uptime: Option<Duration>,
    pub connection_latency: Option<Duration>,
    pub reconnect_attempts: u32,
    pub error_count: u32,
    pub last_error: Option<String>,
    pub is_healthy: bool,
    pub connections_count: u32,
}

impl TunnelMetrics {
    pub fn from_info(info: &TunnelInfo) -> Self {
        Self {
            tunnel_id: info.id.clone(),
            state: info.state,
            local_port: info.local_port,
            uptime: info.connected_at.map(|at| at.elapsed()),
            connection_latency: info.connection_latency,
            reconnect_attempts: info.reconnect_attempts,
            error_count: info.error_count,
            last_error: info.last_error.clone(),
            is_healthy: info.is_healthy(),
            connections_count: info.connections_count,
        }
    }
}
