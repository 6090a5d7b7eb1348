//! TLS-specific error types

#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("invalid TLS server name: {0}")]
    InvalidServerName(String),
}
