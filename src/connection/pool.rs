//! Pool construction (§4.5 "Tunnel-aware sizing"). One `MySqlPool` per
//! `EndpointConfig::connection_key()`, sized from `config::PoolDefaults` or
//! `config::TunnelPoolDefaults` depending on `EndpointConfig::is_loopback()`.

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::MySqlPool;

use crate::config::{PoolDefaults, TunnelPoolDefaults};
use crate::error::{ConnectionError, ConnectionResult};
use crate::models::endpoint::EndpointConfig;

/// Tags the purpose a pooled connection was checked out for: schema
/// discovery gets the long tunneled timeout class even when sharing a pool
/// with general queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionTag {
    General,
    SchemaDiscovery,
}

pub async fn build_pool(endpoint: &EndpointConfig) -> ConnectionResult<MySqlPool> {
    let mut connect_options = MySqlConnectOptions::new()
        .host(&endpoint.host)
        .port(endpoint.port)
        .username(&endpoint.user)
        .password(&endpoint.password);
    if let Some(database) = &endpoint.default_database {
        connect_options = connect_options.database(database);
    }

    let pool = if endpoint.is_loopback() {
        let defaults = TunnelPoolDefaults::default();
        let session_settings = format!(
            "SET SESSION wait_timeout={}, interactive_timeout={}, net_read_timeout={}, net_write_timeout={}",
            defaults.wait_timeout_secs,
            defaults.interactive_timeout_secs,
            defaults.net_read_timeout_secs,
            defaults.net_write_timeout_secs,
        );
        MySqlPoolOptions::new()
            .max_connections(defaults.pool_size + defaults.max_overflow)
            .acquire_timeout(defaults.pool_timeout)
            .max_lifetime(defaults.pool_recycle)
            .after_connect(move |conn, _meta| {
                let session_settings = session_settings.clone();
                Box::pin(async move {
                    sqlx::query(&session_settings).execute(&mut *conn).await?;
                    Ok(())
                })
            })
            .connect_with(connect_options)
            .await
    } else {
        let defaults = PoolDefaults::default();
        MySqlPoolOptions::new()
            .max_connections(defaults.pool_size + defaults.max_overflow)
            .acquire_timeout(defaults.pool_timeout)
            .max_lifetime(defaults.pool_recycle)
            .connect_with(connect_options)
            .await
    };

    pool.map_err(ConnectionError::Pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(host: &str) -> EndpointConfig {
        EndpointConfig {
            host: host.to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            default_database: None,
            ssh_tunnel: None,
        }
    }

    #[test]
    fn loopback_detection_drives_pool_class_selection() {
        assert!(endpoint("127.0.0.1").is_loopback());
        assert!(endpoint("localhost").is_loopback());
        assert!(!endpoint("db.internal.example.com").is_loopback());
    }
}
