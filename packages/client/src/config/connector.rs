//! Chain-walking connector settings

use std::time::Duration;

use super::validation::{ConfigResult, ConfigValidator, Validator};

/// Per-hop connect timeout used when none is configured.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings applied to every connection attempt made by a connector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    /// Deadline for each hop: TCP connect plus SOCKS negotiation
    pub connect_timeout: Duration,
    /// Disable Nagle's algorithm on the resulting socket
    pub nodelay: bool,
    /// TCP keepalive idle time for freshly dialed sockets
    pub keepalive: Option<Duration>,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            nodelay: true,
            keepalive: None,
        }
    }
}

impl ConnectorConfig {
    /// Set the per-hop connect timeout
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use proxychain_client::config::ConnectorConfig;
    ///
    /// let config = ConnectorConfig::default()
    ///     .with_connect_timeout(Duration::from_secs(3));
    /// assert_eq!(config.connect_timeout, Duration::from_secs(3));
    /// ```
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_nodelay(mut self, nodelay: bool) -> Self {
        self.nodelay = nodelay;
        self
    }

    #[must_use]
    pub fn with_keepalive(mut self, keepalive: Option<Duration>) -> Self {
        self.keepalive = keepalive;
        self
    }
}

impl Validator for ConnectorConfig {
    fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::validate_timeout(self.connect_timeout, "connect timeout")?;
        if let Some(keepalive) = self.keepalive {
            ConfigValidator::validate_timeout(keepalive, "keepalive")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConnectorConfig::default();
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert!(config.nodelay);
        assert!(config.keepalive.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_keepalive_fails_validation() {
        let config = ConnectorConfig::default().with_keepalive(Some(Duration::ZERO));
        assert!(config.validate().is_err());
    }
}
