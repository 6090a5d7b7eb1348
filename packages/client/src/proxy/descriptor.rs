//! SOCKS hop descriptors
//!
//! A `ProxyDescriptor` names one SOCKS server in a chain: its protocol
//! version, where to reach it and how to authenticate. Descriptors are
//! validated when built, so a chain never holds a hop it cannot address.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigResult, ConfigValidator, ConfigurationError, Validator};
use crate::connect::TargetAddr;

/// SOCKS protocol version enumeration.
///
/// `V4` speaks SOCKS4a when the destination is a domain name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SocksVersion {
    V4,
    V5,
}

impl TryFrom<u8> for SocksVersion {
    type Error = ConfigurationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            4 => Ok(SocksVersion::V4),
            5 => Ok(SocksVersion::V5),
            other => Err(ConfigurationError::InvalidParameter(format!(
                "SOCKS version must be 4 or 5, got {other}"
            ))),
        }
    }
}

impl From<SocksVersion> for u8 {
    fn from(version: SocksVersion) -> Self {
        match version {
            SocksVersion::V4 => 4,
            SocksVersion::V5 => 5,
        }
    }
}

/// Proxy authentication methods
#[derive(Clone, PartialEq, Eq, Default)]
pub enum SocksAuth {
    #[default]
    None,
    UsernamePassword { username: String, password: String },
}

impl fmt::Debug for SocksAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksAuth::None => f.write_str("None"),
            SocksAuth::UsernamePassword { username, .. } => f
                .debug_struct("UsernamePassword")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}

/// One SOCKS hop.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawProxyDescriptor")]
pub struct ProxyDescriptor {
    version: SocksVersion,
    host: Option<String>,
    port: u16,
    auth: SocksAuth,
    ip_address: Option<IpAddr>,
}

impl ProxyDescriptor {
    /// Create a descriptor for a proxy reachable by host name or IP literal.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the host is empty or the port is 0.
    pub fn new(version: SocksVersion, host: impl Into<String>, port: u16) -> ConfigResult<Self> {
        let descriptor = Self {
            version,
            host: Some(host.into()),
            port,
            auth: SocksAuth::None,
            ip_address: None,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// Create a descriptor that only knows the proxy's IP address.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` if the port is 0.
    pub fn from_ip(version: SocksVersion, ip_address: IpAddr, port: u16) -> ConfigResult<Self> {
        let descriptor = Self {
            version,
            host: None,
            port,
            auth: SocksAuth::None,
            ip_address: Some(ip_address),
        };
        descriptor.validate()?;
        Ok(descriptor)
    }

    /// SOCKS5 hop without authentication.
    ///
    /// # Errors
    ///
    /// See [`ProxyDescriptor::new`].
    pub fn socks5(host: impl Into<String>, port: u16) -> ConfigResult<Self> {
        Self::new(SocksVersion::V5, host, port)
    }

    /// SOCKS4 hop.
    ///
    /// # Errors
    ///
    /// See [`ProxyDescriptor::new`].
    pub fn socks4(host: impl Into<String>, port: u16) -> ConfigResult<Self> {
        Self::new(SocksVersion::V4, host, port)
    }

    /// Attach username/password credentials. SOCKS4 hops send the username
    /// as their user id and ignore the password.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidCredentials` when a SOCKS5
    /// username or password is empty or longer than 255 bytes.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> ConfigResult<Self> {
        self.auth = SocksAuth::UsernamePassword {
            username: username.into(),
            password: password.into(),
        };
        self.validate()?;
        Ok(self)
    }

    /// Record a pre-resolved IP address, used when the host is unset.
    #[must_use]
    pub fn with_ip_address(mut self, ip_address: IpAddr) -> Self {
        self.ip_address = Some(ip_address);
        self
    }

    #[must_use]
    pub fn version(&self) -> SocksVersion {
        self.version
    }

    #[must_use]
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn auth(&self) -> &SocksAuth {
        &self.auth
    }

    #[must_use]
    pub fn ip_address(&self) -> Option<IpAddr> {
        self.ip_address
    }

    /// Where this hop listens: the host name when set, otherwise the
    /// literal IP address.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingAddress` if neither is present.
    pub fn address(&self) -> ConfigResult<TargetAddr> {
        if let Some(host) = &self.host {
            return Ok(TargetAddr::new(host, self.port));
        }
        if let Some(ip) = self.ip_address {
            return Ok(TargetAddr::Ip((ip, self.port).into()));
        }
        Err(ConfigurationError::MissingAddress(format!(
            "SOCKS{} hop on port {}",
            u8::from(self.version),
            self.port
        )))
    }
}

impl Validator for ProxyDescriptor {
    fn validate(&self) -> ConfigResult<()> {
        ConfigValidator::validate_port(self.port, "proxy port")?;

        match (&self.host, self.ip_address) {
            (Some(host), _) if host.trim().is_empty() => {
                return Err(ConfigurationError::MissingAddress(
                    "proxy host cannot be empty".to_string(),
                ));
            }
            (None, None) => {
                self.address()?;
            }
            _ => {}
        }

        if let (SocksVersion::V5, SocksAuth::UsernamePassword { username, password }) =
            (self.version, &self.auth)
        {
            ConfigValidator::validate_credential(username, "username")?;
            ConfigValidator::validate_credential(password, "password")?;
        }

        Ok(())
    }
}

impl fmt::Debug for ProxyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.address() {
            Ok(addr) => write!(f, "Socks{}({addr})", u8::from(self.version)),
            Err(_) => write!(f, "Socks{}(<unaddressed>:{})", u8::from(self.version), self.port),
        }
    }
}

/// Wire shape accepted when descriptors are loaded from configuration files.
#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct RawProxyDescriptor {
    #[serde(rename = "type")]
    version: SocksVersion,
    #[serde(default)]
    host: Option<String>,
    port: u16,
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    ipaddress: Option<IpAddr>,
}

impl TryFrom<RawProxyDescriptor> for ProxyDescriptor {
    type Error = ConfigurationError;

    fn try_from(raw: RawProxyDescriptor) -> Result<Self, Self::Error> {
        let auth = match (raw.user_id, raw.password) {
            (Some(username), password) => SocksAuth::UsernamePassword {
                username,
                password: password.unwrap_or_default(),
            },
            (None, Some(_)) => {
                return Err(ConfigurationError::InvalidCredentials(
                    "password given without userId".to_string(),
                ));
            }
            (None, None) => SocksAuth::None,
        };

        let descriptor = ProxyDescriptor {
            version: raw.version,
            host: raw.host,
            port: raw.port,
            auth,
            ip_address: raw.ipaddress,
        };
        descriptor.validate()?;
        Ok(descriptor)
    }
}
