//! SSH Tunnel Manager (C6, §4.6). Local-forward tunnel lifecycle
//! (DISCONNECTED→CONNECTING→CONNECTED→{FAILED,TIMEOUT}), reused across
//! comparisons by `SshTunnelSpec::reuse_key()`. Grounded in
//! `services/tunnel.rs` (`TunnelService`) for the accept-loop/session-map
//! shape and `core/terminal/ssh.rs` for authentication, generalized from
//! tauri commands over a SQLite-backed profile store to a plain async API
//! over `SshTunnelSpec` values the orchestrator (C3) constructs directly.

mod auth;
mod manager;
mod metrics;
mod proxy;
mod state;

pub use auth::TunnelClientHandler;
pub use manager::TunnelManager;
pub use metrics::TunnelMetrics;
pub use state::{TunnelInfo, TunnelState};

pub use proxy::{create_tunnel as create_tunnel_via_proxy, close_tunnel as close_tunnel_via_proxy, test_connection as test_connection_via_proxy};
