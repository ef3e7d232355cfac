//! Endpoint configuration (§3) — one database reachable either directly or
//! through an SSH tunnel to a bastion host.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::secrets::Classification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SshAuthMethod {
    Password,
    PrivateKey,
    Agent,
}

/// Credential material for one auth method. Classified per §3: key content
/// and passphrases are RESTRICTED, passwords CONFIDENTIAL.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum SshCredential {
    Password { password: String },
    PrivateKey { key: PrivateKeyMaterial, passphrase: Option<String> },
    Agent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrivateKeyMaterial {
    /// Already-encrypted content, or a plaintext PEM beginning with
    /// `-----BEGIN` (§4.6 "Authentication").
    Content(String),
    Path(PathBuf),
}

impl SshCredential {
    pub fn classification(&self) -> Classification {
        match self {
            SshCredential::Password { .. } => Classification::Confidential,
            SshCredential::PrivateKey { .. } => Classification::Restricted,
            SshCredential::Agent => Classification::Internal,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SshTunnelSpec {
    pub ssh_host: String,
    pub ssh_port: u16,
    pub ssh_user: String,
    pub auth_method: SshAuthMethod,
    pub credential: SshCredential,
    /// Overwritten at use by the orchestrator with the real DB host/port
    /// (§4.3).
    pub remote_bind_host: String,
    pub remote_bind_port: u16,
    pub local_bind_port: Option<u16>,
    pub connect_timeout: std::time::Duration,
    pub keepalive_interval: std::time::Duration,
    pub compression: bool,
    pub strict_host_key_checking: bool,
    pub known_hosts_path: Option<PathBuf>,
}

impl SshTunnelSpec {
    /// The 4-tuple reuse key of §6/§9 — identifies a tunnel for sharing
    /// across comparisons, independent of any particular comparison.
    pub fn reuse_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.ssh_host, self.ssh_port, self.remote_bind_host, self.remote_bind_port
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub default_database: Option<String>,
    pub ssh_tunnel: Option<SshTunnelSpec>,
}

impl EndpointConfig {
    /// Stable key for the process-wide connection pool map (§4.5, §3
    /// "Endpoint identity").
    pub fn connection_key(&self) -> String {
        format!(
            "{}:{}:{}:{}",
            self.host,
            self.port,
            self.user,
            self.default_database.as_deref().unwrap_or("")
        )
    }

    /// True once the orchestrator has rewritten host/port to point at a
    /// local tunnel forwarder (loopback sizing in §4.5 keys off this).
    pub fn is_loopback(&self) -> bool {
        matches!(self.host.as_str(), "127.0.0.1" | "localhost" | "::1")
    }

    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.host.trim().is_empty() {
            errors.push("host is required".to_string());
        }
        if self.port == 0 {
            errors.push("port must be nonzero".to_string());
        }
        if self.user.trim().is_empty() {
            errors.push("user is required".to_string());
        }
        if let Some(tunnel) = &self.ssh_tunnel {
            if tunnel.ssh_host.trim().is_empty() {
                errors.push("ssh_tunnel.ssh_host is required".to_string());
            }
            if tunnel.ssh_port == 0 {
                errors.push("ssh_tunnel.ssh_port must be nonzero".to_string());
            }
            if tunnel.ssh_user.trim().is_empty() {
                errors.push("ssh_tunnel.ssh_user is required".to_string());
            }
            match (&tunnel.auth_method, &tunnel.credential) {
                (SshAuthMethod::Password, SshCredential::Password { .. }) => {}
                (SshAuthMethod::PrivateKey, SshCredential::PrivateKey { .. }) => {}
                (SshAuthMethod::Agent, SshCredential::Agent) => {}
                _ => errors.push("ssh_tunnel.auth_method does not match credential".to_string()),
            }
        }
        errors
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonOptions {
    pub compare_tables: bool,
    pub compare_columns: bool,
    pub compare_indexes: bool,
    pub compare_constraints: bool,
    pub include_schemas: Vec<String>,
    pub exclude_schemas: Vec<String>,
    pub include_tables: Vec<String>,
    pub exclude_tables: Vec<String>,
    pub ignore_auto_increment: bool,
    pub ignore_comments: bool,
    pub ignore_charset: bool,
    pub ignore_collation: bool,
    pub case_sensitive: bool,
}

impl ComparisonOptions {
    pub fn schema_allowed(&self, schema: &str) -> bool {
        if crate::config::is_system_schema(schema) {
            return false;
        }
        if !self.include_schemas.is_empty() && !self.include_schemas.iter().any(|s| s == schema) {
            return false;
        }
        if self.exclude_schemas.iter().any(|s| s == schema) {
            return false;
        }
        true
    }

    pub fn table_allowed(&self, table: &str) -> bool {
        if !self.include_tables.is_empty() && !self.include_tables.iter().any(|t| t == table) {
            return false;
        }
        if self.exclude_tables.iter().any(|t| t == table) {
            return false;
        }
        true
    }
}

impl ComparisonOptions {
    pub fn all_enabled() -> Self {
        Self {
            compare_tables: true,
            compare_columns: true,
            compare_indexes: true,
            compare_constraints: true,
            ..Default::default()
        }
    }
}
