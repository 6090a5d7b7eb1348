//! Core Configuration Utilities
//!
//! Configuration error type, the `Validator` trait and common checks.

use std::time::Duration;

/// Configuration validation result type
pub type ConfigResult<T> = Result<T, ConfigurationError>;

/// Configuration error types
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Invalid timeout value: {0}")]
    InvalidTimeout(String),

    #[error("Invalid port: {0}")]
    InvalidPort(String),

    #[error("Proxy hop has neither a host nor an IP address: {0}")]
    MissingAddress(String),

    #[error("Invalid proxy credentials: {0}")]
    InvalidCredentials(String),

    #[error("Unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("Malformed proxy entry: {0}")]
    MalformedEntry(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid certificate: {0}")]
    InvalidCertificate(String),

    #[error("Invalid configuration parameter: {0}")]
    InvalidParameter(String),
}

/// Configuration validation trait
pub trait Validator {
    /// Validates the configuration settings
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` variant describing the first rule that
    /// the configuration violates.
    fn validate(&self) -> ConfigResult<()>;
}

/// Common configuration validation utilities
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate timeout duration
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidTimeout` if:
    /// - The timeout duration is zero
    /// - The timeout duration exceeds 1 hour (3600 seconds)
    pub fn validate_timeout(timeout: Duration, name: &str) -> ConfigResult<()> {
        if timeout.is_zero() {
            return Err(ConfigurationError::InvalidTimeout(format!(
                "{name} cannot be zero"
            )));
        }

        if timeout.as_secs() > 3600 {
            return Err(ConfigurationError::InvalidTimeout(format!(
                "{name} cannot exceed 1 hour"
            )));
        }

        Ok(())
    }

    /// Validate a TCP port
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidPort` if the port is zero.
    pub fn validate_port(port: u16, name: &str) -> ConfigResult<()> {
        if port == 0 {
            return Err(ConfigurationError::InvalidPort(format!(
                "{name} must be between 1 and 65535"
            )));
        }
        Ok(())
    }

    /// Parse a decimal port string, rejecting zero and out-of-range values
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidPort` if the string is not a port.
    pub fn parse_port(raw: &str, name: &str) -> ConfigResult<u16> {
        let port = raw.trim().parse::<u16>().map_err(|_| {
            ConfigurationError::InvalidPort(format!("{name} `{raw}` is not a valid port"))
        })?;
        Self::validate_port(port, name)?;
        Ok(port)
    }

    /// Validate a SOCKS5 username or password (RFC 1929 limits it to 255 bytes)
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidCredentials` if the value is empty
    /// or longer than 255 bytes.
    pub fn validate_credential(value: &str, name: &str) -> ConfigResult<()> {
        if value.is_empty() {
            return Err(ConfigurationError::InvalidCredentials(format!(
                "{name} cannot be empty"
            )));
        }
        if value.len() > 255 {
            return Err(ConfigurationError::InvalidCredentials(format!(
                "{name} cannot exceed 255 bytes"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_timeout_is_rejected() {
        let err = ConfigValidator::validate_timeout(Duration::ZERO, "connect timeout")
            .expect_err("zero timeout must fail");
        assert_eq!(
            err,
            ConfigurationError::InvalidTimeout("connect timeout cannot be zero".into())
        );
    }

    #[test]
    fn parse_port_bounds() {
        assert_eq!(ConfigValidator::parse_port("1080", "port"), Ok(1080));
        assert!(ConfigValidator::parse_port("0", "port").is_err());
        assert!(ConfigValidator::parse_port("65536", "port").is_err());
        assert!(ConfigValidator::parse_port("http", "port").is_err());
    }

    #[test]
    fn long_credentials_are_rejected() {
        let long = "u".repeat(256);
        assert!(ConfigValidator::validate_credential(&long, "username").is_err());
        assert!(ConfigValidator::validate_credential("alice", "username").is_ok());
    }
}
