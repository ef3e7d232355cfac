use thiserror::Error;

/// Catalog introspection errors (C1)
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("query failed for object kind {kind}: {source}")]
    QueryFailed {
        kind: &'static str,
        #[source]
        source: sqlx::Error,
    },

    #[error("object kind {kind} is unsupported on this server and produced no rows")]
    Unsupported { kind: &'static str },

    #[error("partial discovery for object kind {kind}: {source}")]
    Partial {
        kind: &'static str,
        #[source]
        source: sqlx::Error,
    },
}

/// Object comparison errors (C2)
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("catalog introspection failed: {0}")]
    Catalog(#[from] CatalogError),

    #[error("connection error during discovery: {0}")]
    Connection(#[from] ConnectionError),
}

/// Sync-script generation errors (C4)
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("no generator registered for diff type {0:?}")]
    Unsupported(crate::models::diff::DiffType),

    #[error("malformed difference for {object_type} {object_name}: {reason}")]
    MalformedDifference {
        object_type: String,
        object_name: String,
        reason: String,
    },
}

/// Connection-layer errors (C5)
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("connection pool error: {0}")]
    Pool(#[from] sqlx::Error),

    #[error("query timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("query retries exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },

    #[error("endpoint unreachable: {0}")]
    Unreachable(String),
}

/// SSH tunnel errors (C6)
#[derive(Error, Debug)]
pub enum TunnelError {
    #[error("invalid tunnel configuration: {0:?}")]
    InvalidConfig(Vec<String>),

    #[error("SSH authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("SSH session error: {0}")]
    Session(String),

    #[error("failed to bind local port: {0}")]
    PortBind(#[source] std::io::Error),

    #[error("tunnel {0} not found")]
    NotFound(String),

    #[error("tunnel create timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("host-side SSH proxy error: {0}")]
    Proxy(String),

    #[error("secret store error: {0}")]
    Secret(#[from] SecretError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Secret-store errors (C7)
#[derive(Error, Debug)]
pub enum SecretError {
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("key derivation failed: {0}")]
    KeyDerivationFailed(String),

    #[error("invalid encrypted payload format")]
    InvalidFormat,

    #[error("master key file corrupted (expected {expected} bytes, found {found})")]
    CorruptMasterKey { expected: usize, found: usize },

    #[error("SSH key validation failed: {0}")]
    KeyValidation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Top-level error returned by the comparison orchestrator and sync-script
/// generator's public entry points.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("configuration invalid: {0:?}")]
    ConfigValidation(Vec<String>),

    #[error("SSH tunnel setup failed for endpoint {endpoint}: {source}")]
    TunnelSetup {
        endpoint: String,
        #[source]
        source: TunnelError,
    },

    #[error("could not reach {side} database: {source}")]
    ConnectionUnreachable {
        side: ComparisonSide,
        #[source]
        source: ConnectionError,
    },

    #[error(transparent)]
    Compare(#[from] CompareError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Tunnel(#[from] TunnelError),

    #[error(transparent)]
    Secret(#[from] SecretError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonSide {
    Source,
    Target,
}

impl std::fmt::Display for ComparisonSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ComparisonSide::Source => write!(f, "source"),
            ComparisonSide::Target => write!(f, "target"),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
pub type CatalogResult<T> = Result<T, CatalogError>;
pub type CompareResult<T> = Result<T, CompareError>;
pub type GeneratorResult<T> = Result<T, GeneratorError>;
pub type ConnectionResult<T> = Result<T, ConnectionError>;
pub type TunnelResult<T> = Result<T, TunnelError>;
pub type SecretResult<T> = Result<T, SecretError>;
