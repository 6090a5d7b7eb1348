//! Proxy URL parsing
//!
//! Turns `scheme://[user:pass@]host[:port]` proxy URLs into either a SOCKS
//! hop or an HTTP forward proxy.

use std::fmt;

use url::{Host, Url};

use super::descriptor::{ProxyDescriptor, SocksVersion};
use crate::config::{ConfigResult, ConfigValidator, ConfigurationError};
use crate::connect::{Scheme, TargetAddr};

/// Default SOCKS port when a `socks://` URL names none.
pub const DEFAULT_SOCKS_PORT: u16 = 1080;

/// HTTP forward proxy reached with `CONNECT`, over TLS when the scheme is https.
#[derive(Clone, PartialEq, Eq)]
pub struct ForwardProxy {
    url: Url,
    scheme: Scheme,
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
}

impl ForwardProxy {
    /// Build a forward proxy from an `http://` or `https://` URL.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` for other schemes or a missing host.
    pub fn from_url(url: Url) -> ConfigResult<Self> {
        let scheme = Scheme::parse(url.scheme())?;
        let host = host_of(&url)?;
        let port = url.port().unwrap_or_else(|| scheme.default_port());
        ConfigValidator::validate_port(port, "proxy port")?;
        let credentials = credentials_of(&url)?;

        Ok(Self {
            url,
            scheme,
            host,
            port,
            credentials,
        })
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    #[must_use]
    pub fn address(&self) -> TargetAddr {
        TargetAddr::new(&self.host, self.port)
    }

    /// Username and password from the URL userinfo, percent-decoded.
    #[must_use]
    pub fn credentials(&self) -> Option<(&str, &str)> {
        self.credentials
            .as_ref()
            .map(|(user, pass)| (user.as_str(), pass.as_str()))
    }
}

impl fmt::Debug for ForwardProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Forward({}://{})", self.scheme, self.address())
    }
}

/// What a single proxy URL designates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyTarget {
    Socks(ProxyDescriptor),
    Forward(ForwardProxy),
}

/// Parse a proxy URL.
///
/// `socks://` and `socks5://` (also `socks5h://`) yield a SOCKS5 hop,
/// `socks4://` and `socks4a://` a SOCKS4 hop, both defaulting to port 1080.
/// `http://` and `https://` yield a forward proxy.
///
/// # Errors
///
/// Returns a `ConfigurationError` for unparsable URLs, unknown schemes,
/// missing hosts and invalid credentials.
pub fn parse_proxy_url(input: &str) -> ConfigResult<ProxyTarget> {
    let url = Url::parse(input.trim())
        .map_err(|e| ConfigurationError::InvalidUrl(format!("`{input}`: {e}")))?;

    let version = match url.scheme() {
        "socks" | "socks5" | "socks5h" => SocksVersion::V5,
        "socks4" | "socks4a" => SocksVersion::V4,
        "http" | "https" => return ForwardProxy::from_url(url).map(ProxyTarget::Forward),
        other => {
            return Err(ConfigurationError::UnsupportedScheme(format!(
                "`{other}` is not a proxy scheme; expected socks, socks4, socks5, http or https"
            )));
        }
    };

    let host = host_of(&url)?;
    let port = url.port().unwrap_or(DEFAULT_SOCKS_PORT);
    let hop = ProxyDescriptor::new(version, host, port)?;

    match credentials_of(&url)? {
        Some((username, password)) => hop.with_credentials(username, password),
        None => Ok(hop),
    }
    .map(ProxyTarget::Socks)
}

fn host_of(url: &Url) -> ConfigResult<String> {
    match url.host() {
        Some(Host::Domain(domain)) if !domain.is_empty() => Ok(domain.to_string()),
        Some(Host::Ipv4(ip)) => Ok(ip.to_string()),
        Some(Host::Ipv6(ip)) => Ok(ip.to_string()),
        _ => Err(ConfigurationError::InvalidUrl(format!(
            "proxy URL `{url}` must have a host"
        ))),
    }
}

fn credentials_of(url: &Url) -> ConfigResult<Option<(String, String)>> {
    if url.username().is_empty() {
        return Ok(None);
    }

    let decode = |raw: &str| {
        urlencoding::decode(raw)
            .map(|s| s.into_owned())
            .map_err(|e| ConfigurationError::InvalidCredentials(e.to_string()))
    };

    let username = decode(url.username())?;
    let password = decode(url.password().unwrap_or_default())?;
    Ok(Some((username, password)))
}
