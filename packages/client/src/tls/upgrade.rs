//! TLS upgrade of an established tunnel

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;

use super::config::build_client_config;
use super::errors::TlsError;
use super::options::TlsOptions;
use crate::config::{ConfigResult, Validator};
use crate::error::{self, Result};

/// Runs the client side of a TLS handshake over any connected stream.
#[derive(Clone)]
pub struct TlsUpgrader {
    connector: TlsConnector,
    server_name: Option<String>,
    handshake_timeout: Duration,
}

impl TlsUpgrader {
    /// # Errors
    ///
    /// Returns a `ConfigurationError` when `options` are invalid.
    pub fn new(options: &TlsOptions) -> ConfigResult<Self> {
        options.validate()?;
        let config = build_client_config(options)?;
        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
            server_name: options.server_name.clone(),
            handshake_timeout: options.handshake_timeout,
        })
    }

    /// Handshake with `host` over `stream`. The override from the options,
    /// when set, replaces `host` for SNI and verification.
    ///
    /// # Errors
    ///
    /// Fails with a TLS handshake error. A handshake that exceeds its bound
    /// is also a TLS handshake error, and reports `is_timeout()`.
    pub async fn handshake<S>(&self, stream: S, host: &str) -> Result<TlsStream<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let name = self.server_name.as_deref().unwrap_or(host);
        let bare = name
            .strip_prefix('[')
            .and_then(|n| n.strip_suffix(']'))
            .unwrap_or(name);
        let server_name = ServerName::try_from(bare.to_string())
            .map_err(|_| error::tls_handshake(TlsError::InvalidServerName(bare.to_string())))?;

        tracing::debug!(target: "proxychain::tls", server_name = bare, "starting TLS handshake");

        let stream = tokio::time::timeout(
            self.handshake_timeout,
            self.connector.connect(server_name, stream),
        )
        .await
        .map_err(error::tls_handshake)?
        .map_err(error::tls_handshake)?;

        tracing::debug!(
            target: "proxychain::tls",
            server_name = bare,
            alpn = ?stream.get_ref().1.alpn_protocol().map(String::from_utf8_lossy),
            "TLS handshake complete"
        );

        Ok(stream)
    }
}

impl fmt::Debug for TlsUpgrader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsUpgrader")
            .field("server_name", &self.server_name)
            .field("handshake_timeout", &self.handshake_timeout)
            .finish()
    }
}
