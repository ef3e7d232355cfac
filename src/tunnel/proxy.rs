//! Host-side SSH proxy client (§5(d)). When this process runs inside a
//! container that cannot originate SSH connections with the host's source
//! IP, tunnel creation is delegated to a proxy daemon listening on the host
//! network: a single JSON request/response per TCP connection with an
//! `action` dispatch (`create_tunnel`, `close_tunnel`, `test_connection`).

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::config::ProxyRpcConfig;
use crate::error::TunnelError;
use crate::models::endpoint::SshTunnelSpec;

#[derive(Debug, Serialize)]
struct ProxyRequest<'a> {
    action: &'a str,
    tunnel_id: Option<&'a str>,
    local_port: Option<u16>,
    config: Option<ProxyTunnelConfig<'a>>,
}

#[derive(Debug, Serialize)]
struct ProxyTunnelConfig<'a> {
    ssh_host: &'a str,
    ssh_port: u16,
    ssh_user: &'a str,
    remote_bind_host: &'a str,
    remote_bind_port: u16,
    connect_timeout: u64,
    keepalive_interval: u64,
    auth_method: &'a str,
}

#[derive(Debug, Deserialize)]
struct ProxyResponse {
    success: bool,
    #[serde(default)]
    local_port: Option<u16>,
    #[serde(default)]
    error: Option<String>,
}

fn tunnel_config(spec: &SshTunnelSpec) -> ProxyTunnelConfig<'_> {
    ProxyTunnelConfig {
        ssh_host: &spec.ssh_host,
        ssh_port: spec.ssh_port,
        ssh_user: &spec.ssh_user,
        remote_bind_host: &spec.remote_bind_host,
        remote_bind_port: spec.remote_bind_port,
        connect_timeout: spec.connect_timeout.as_secs(),
        keepalive_interval: spec.keepalive_interval.as_secs(),
        auth_method: match spec.auth_method {
            crate::models::endpoint::SshAuthMethod::Password => "password",
            crate::models::endpoint::SshAuthMethod::PrivateKey => "private_key",
            crate::models::endpoint::SshAuthMethod::Agent => "agent",
        },
    }
}

async fn send_request(proxy_addr: &str, rpc: &ProxyRpcConfig, request: &ProxyRequest<'_>) -> Result<ProxyResponse, TunnelError> {
    let mut stream = tokio::time::timeout(rpc.connect_timeout, TcpStream::connect(proxy_addr))
        .await
        .map_err(|_| TunnelError::Timeout(rpc.connect_timeout))?
        .map_err(TunnelError::Io)?;

    let payload = serde_json::to_vec(request).map_err(|e| TunnelError::Proxy(e.to_string()))?;
    stream.write_all(&payload).await.map_err(TunnelError::Io)?;
    stream.flush().await.map_err(TunnelError::Io)?;

    let mut buf = Vec::with_capacity(4096);
    tokio::time::timeout(rpc.read_timeout, stream.read_to_end(&mut buf))
        .await
        .map_err(|_| TunnelError::Timeout(rpc.read_timeout))?
        .map_err(TunnelError::Io)?;

    serde_json::from_slice(&buf).map_err(|e| TunnelError::Proxy(format!("malformed proxy response: {e}")))
}

/// Requests the host-side proxy open a local-forward tunnel, returning the
/// local port it bound.
pub async fn create_tunnel(proxy_addr: &str, tunnel_id: &str, requested_port: Option<u16>, spec: &SshTunnelSpec) -> Result<u16, TunnelError> {
    let config = tunnel_config(spec);
    let request = ProxyRequest {
        action: "create_tunnel",
        tunnel_id: Some(tunnel_id),
        local_port: requested_port,
        config: Some(config),
    };

    let response = send_request(proxy_addr, &ProxyRpcConfig::default(), &request).await?;
    if !response.success {
        return Err(TunnelError::Proxy(response.error.unwrap_or_else(|| "proxy tunnel creation failed".to_string())));
    }
    response.local_port.ok_or_else(|| TunnelError::Proxy("proxy response missing local_port".to_string()))
}

pub async fn close_tunnel(proxy_addr: &str, tunnel_id: &str) -> Result<(), TunnelError> {
    let request = ProxyRequest { action: "close_tunnel", tunnel_id: Some(tunnel_id), local_port: None, config: None };
    let response = send_request(proxy_addr, &ProxyRpcConfig::default(), &request).await?;
    if !response.success {
        return Err(TunnelError::Proxy(response.error.unwrap_or_else(|| "proxy tunnel close failed".to_string())));
    }
    Ok(())
}

pub async fn test_connection(proxy_addr: &str, spec: &SshTunnelSpec) -> Result<(), TunnelError> {
    let config = tunnel_config(spec);
    let request = ProxyRequest { action: "test_connection", tunnel_id: None, local_port: None, config: Some(config) };
    let response = send_request(proxy_addr, &ProxyRpcConfig::default(), &request).await?;
    if !response.success {
        return Err(TunnelError::Proxy(response.error.unwrap_or_else(|| "proxy connection test failed".to_string())));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_method_serializes_to_proxy_protocol_strings() {
        let spec = SshTunnelSpec {
            ssh_host: "bastion".to_string(),
            ssh_port: 22,
            ssh_user: "deploy".to_string(),
            auth_method: crate::models::endpoint::SshAuthMethod::Agent,
            credential: crate::models::endpoint::SshCredential::Agent,
            remote_bind_host: "10.0.0.5".to_string(),
            remote_bind_port: 3306,
            local_bind_port: None,
            connect_timeout: std::time::Duration::from_secs(30),
            keepalive_interval: std::time::Duration::from_secs(15),
            compression: false,
            strict_host_key_checking: false,
            known_hosts_path: None,
        };
        assert_eq!(tunnel_config(&spec).auth_method, "agent");
    }
}
