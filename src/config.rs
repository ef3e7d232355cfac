//! Process-wide tunables. Kept as plain structs with `Default` impls rather
//! than a global settings singleton, matching how the rest of this crate
//! threads small config structs through constructors instead of reaching for
//! module-level statics (see §9 "Global mutable state").

use std::time::Duration;

/// Schemas never returned by the catalog introspector (§6).
pub const SYSTEM_SCHEMAS: &[&str] = &[
    "information_schema",
    "performance_schema",
    "mysql",
    "sys",
    "percona_schema",
];

/// Pool/timeout tunables for a general-purpose (non-tunneled) connection.
#[derive(Debug, Clone, Copy)]
pub struct PoolDefaults {
    pub pool_size: u32,
    pub max_overflow: u32,
    pub pool_timeout: Duration,
    pub pool_recycle: Duration,
}

impl Default for PoolDefaults {
    fn default() -> Self {
        Self {
            pool_size: 20,
            max_overflow: 10,
            pool_timeout: Duration::from_secs(30),
            pool_recycle: Duration::from_secs(3600),
        }
    }
}

/// Pool/timeout tunables applied when the resolved host is loopback or a
/// named tunnel host (§4.5 "Tunnel-aware sizing").
#[derive(Debug, Clone, Copy)]
pub struct TunnelPoolDefaults {
    pub pool_size: u32,
    pub max_overflow: u32,
    pub pool_timeout: Duration,
    pub pool_recycle: Duration,
    pub wait_timeout_secs: u32,
    pub interactive_timeout_secs: u32,
    pub net_read_timeout_secs: u32,
    pub net_write_timeout_secs: u32,
}

impl Default for TunnelPoolDefaults {
    fn default() -> Self {
        Self {
            pool_size: 1,
            max_overflow: 0,
            pool_timeout: Duration::from_secs(300),
            pool_recycle: Duration::from_secs(1800),
            wait_timeout_secs: 600,
            interactive_timeout_secs: 600,
            net_read_timeout_secs: 60,
            net_write_timeout_secs: 60,
        }
    }
}

/// Query timeout selection per §4.5.
#[derive(Debug, Clone, Copy)]
pub struct QueryTimeouts {
    pub direct: Duration,
    pub tunneled: Duration,
    pub tunneled_schema_discovery: Duration,
}

impl Default for QueryTimeouts {
    fn default() -> Self {
        Self {
            direct: Duration::from_secs(30),
            tunneled: Duration::from_secs(120),
            tunneled_schema_discovery: Duration::from_secs(600),
        }
    }
}

/// Retry policy knobs per §4.5.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts_direct: u32,
    pub max_attempts_tunneled_schema_discovery: u32,
    pub backoff_growth: f64,
    pub max_tunnel_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts_direct: 3,
            max_attempts_tunneled_schema_discovery: 5,
            backoff_growth: 1.5,
            max_tunnel_delay: Duration::from_secs(30),
        }
    }
}

/// Tunnel manager maintenance cadence (§4.6, §5).
#[derive(Debug, Clone, Copy)]
pub struct TunnelMaintenanceConfig {
    pub period: Duration,
    pub probe_timeout: Duration,
    pub max_idle: Duration,
    pub local_port_scan_start: u16,
}

impl Default for TunnelMaintenanceConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(5),
            max_idle: Duration::from_secs(30 * 60),
            local_port_scan_start: 10000,
        }
    }
}

/// Timeouts for §5(d) / the host-side SSH proxy RPC.
#[derive(Debug, Clone, Copy)]
pub struct ProxyRpcConfig {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
}

impl Default for ProxyRpcConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            read_timeout: Duration::from_secs(30),
        }
    }
}

/// Default tunnel-create timeout (§5(a)).
pub const DEFAULT_TUNNEL_CREATE_TIMEOUT: Duration = Duration::from_secs(30);
pub const SCHEMA_DISCOVERY_TUNNEL_CREATE_TIMEOUT: Duration = Duration::from_secs(120);

/// Maximum number of entries kept in `data/comparison_history.json`.
pub const COMPARISON_HISTORY_CAP: usize = 20;

/// `is_stale` threshold for a schema-discovery connection (§4.5).
pub const SCHEMA_DISCOVERY_MAX_IDLE: Duration = Duration::from_secs(1800);

pub fn is_system_schema(schema: &str) -> bool {
    SYSTEM_SCHEMAS.iter().any(|s| s.eq_ignore_ascii_case(schema))
}
