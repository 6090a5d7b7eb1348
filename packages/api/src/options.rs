//! Dispatcher settings

use std::time::Duration;

use proxychain_client::config::{ConfigResult, ConfigValidator, Validator};
use proxychain_client::{ConnectorConfig, TlsOptions};

/// Settings shared by every dispatcher flavour.
#[derive(Debug, Clone, Default)]
pub struct DispatcherOptions {
    pub connector: ConnectorConfig,
    pub tls: TlsOptions,
    /// Bound on a whole exchange: connect, handshake and response head.
    pub request_timeout: Option<Duration>,
}

impl DispatcherOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_connector(mut self, connector: ConnectorConfig) -> Self {
        self.connector = connector;
        self
    }

    /// Shorthand for the connector's per-hop timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connector.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_tls(mut self, tls: TlsOptions) -> Self {
        self.tls = tls;
        self
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }
}

impl Validator for DispatcherOptions {
    fn validate(&self) -> ConfigResult<()> {
        self.connector.validate()?;
        self.tls.validate()?;
        if let Some(timeout) = self.request_timeout {
            ConfigValidator::validate_timeout(timeout, "request timeout")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_timeout_shorthand() {
        let options = DispatcherOptions::new().with_connect_timeout(Duration::from_secs(2));
        assert_eq!(options.connector.connect_timeout, Duration::from_secs(2));
        assert!(options.validate().is_ok());
    }

    #[test]
    fn zero_request_timeout_is_rejected() {
        let options = DispatcherOptions::new().with_request_timeout(Duration::ZERO);
        assert!(options.validate().is_err());
    }
}
