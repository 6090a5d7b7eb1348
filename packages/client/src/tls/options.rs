use std::time::Duration;

use crate::config::{ConfigResult, ConfigValidator, ConfigurationError, Validator};

/// Default bound on a TLS handshake with the target.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// How the server certificate is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CertificateVerification {
    /// Chain and hostname validated against the configured roots.
    #[default]
    Full,
    /// Any certificate is accepted. Only for testing against self-signed peers.
    Disabled,
}

/// Client-side TLS settings applied when upgrading an https connection.
#[derive(Debug, Clone)]
pub struct TlsOptions {
    pub verification: CertificateVerification,
    pub alpn_protocols: Vec<Vec<u8>>,
    /// SNI and verification name used instead of the request host.
    pub server_name: Option<String>,
    pub handshake_timeout: Duration,
    pub use_native_roots: bool,
    /// PEM encoded certificates trusted in addition to the system roots.
    pub extra_root_certificates: Vec<Vec<u8>>,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self {
            verification: CertificateVerification::Full,
            alpn_protocols: Vec::new(),
            server_name: None,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            use_native_roots: true,
            extra_root_certificates: Vec::new(),
        }
    }
}

impl TlsOptions {
    #[must_use]
    pub fn with_verification(mut self, verification: CertificateVerification) -> Self {
        self.verification = verification;
        self
    }

    #[must_use]
    pub fn with_alpn_protocols<I, P>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Vec<u8>>,
    {
        self.alpn_protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_server_name(mut self, server_name: impl Into<String>) -> Self {
        self.server_name = Some(server_name.into());
        self
    }

    #[must_use]
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    #[must_use]
    pub fn use_native_roots(mut self, enabled: bool) -> Self {
        self.use_native_roots = enabled;
        self
    }

    #[must_use]
    pub fn add_root_certificate_pem(mut self, pem: impl Into<Vec<u8>>) -> Self {
        self.extra_root_certificates.push(pem.into());
        self
    }
}

impl Validator for TlsOptions {
    fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::validate_timeout(self.handshake_timeout, "TLS handshake timeout")?;

        if self.alpn_protocols.iter().any(|p| p.is_empty() || p.len() > 255) {
            return Err(ConfigurationError::InvalidParameter(
                "ALPN protocol identifiers must be 1 to 255 bytes".to_string(),
            ));
        }

        if let Some(name) = &self.server_name
            && rustls::pki_types::ServerName::try_from(name.as_str()).is_err()
        {
            return Err(ConfigurationError::InvalidParameter(format!(
                "invalid TLS server name `{name}`"
            )));
        }

        Ok(())
    }
}
