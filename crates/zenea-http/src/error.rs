/// Errors from parsing a [`RemoteEndpoint`](crate::RemoteEndpoint).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EndpointError {
    #[error("missing scheme in endpoint: {0}")]
    MissingScheme(String),

    #[error("unsupported scheme: {0}")]
    UnknownScheme(String),

    #[error("missing host in endpoint: {0}")]
    MissingHost(String),

    #[error("invalid host: {0}")]
    InvalidHost(String),

    #[error("invalid port: {0}")]
    InvalidPort(String),
}
