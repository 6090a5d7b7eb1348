//! Connection requests

use std::fmt;

use tokio::net::TcpStream;
use url::{Host, Url};

use super::target::TargetAddr;
use crate::config::{ConfigResult, ConfigurationError};

/// Upper-layer protocol of the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    Http,
    Https,
}

impl Scheme {
    /// Parse `http` / `https`, with or without the trailing colon.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::UnsupportedScheme` for anything else.
    pub fn parse(raw: &str) -> ConfigResult<Self> {
        match raw.trim_end_matches(':').to_ascii_lowercase().as_str() {
            "http" => Ok(Scheme::Http),
            "https" => Ok(Scheme::Https),
            other => Err(ConfigurationError::UnsupportedScheme(format!(
                "`{other}`; expected http or https"
            ))),
        }
    }

    #[must_use]
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    #[must_use]
    pub fn is_https(self) -> bool {
        matches!(self, Scheme::Https)
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        })
    }
}

/// SOCKS servers do not guess HTTP ports, so the default has to be applied
/// before the first hop is negotiated. A zero port counts as absent.
#[must_use]
pub fn resolve_port(scheme: Scheme, port: Option<u16>) -> u16 {
    match port {
        Some(port) if port != 0 => port,
        _ => scheme.default_port(),
    }
}

/// One connection attempt: the target plus, optionally, an already-open
/// socket to use as the first leg of the chain.
pub struct ConnectRequest<S = TcpStream> {
    scheme: Scheme,
    host: String,
    port: Option<u16>,
    existing: Option<S>,
}

impl<S> ConnectRequest<S> {
    #[must_use]
    pub fn new(scheme: Scheme, host: impl Into<String>) -> Self {
        Self {
            scheme,
            host: host.into(),
            port: None,
            existing: None,
        }
    }

    /// Build a request for the scheme, host and port of `url`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` when the scheme is not http/https or
    /// the URL has no host.
    pub fn from_url(url: &Url) -> ConfigResult<Self> {
        let scheme = Scheme::parse(url.scheme())?;
        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => {
                return Err(ConfigurationError::InvalidUrl(format!(
                    "`{url}` has no host"
                )));
            }
        };

        Ok(Self {
            scheme,
            host,
            port: url.port(),
            existing: None,
        })
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Reuse an open socket as the starting point of the chain.
    #[must_use]
    pub fn with_existing_socket(mut self, socket: S) -> Self {
        self.existing = Some(socket);
        self
    }

    #[must_use]
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Target port with the scheme default applied.
    #[must_use]
    pub fn port(&self) -> u16 {
        resolve_port(self.scheme, self.port)
    }

    #[must_use]
    pub fn target(&self) -> TargetAddr {
        TargetAddr::new(&self.host, self.port())
    }

    #[must_use]
    pub fn has_existing_socket(&self) -> bool {
        self.existing.is_some()
    }

    pub(crate) fn into_parts(self) -> (Scheme, String, TargetAddr, Option<S>) {
        let target = self.target();
        (self.scheme, self.host, target, self.existing)
    }
}

impl<S> fmt::Debug for ConnectRequest<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectRequest")
            .field("scheme", &self.scheme)
            .field("target", &self.target())
            .field("existing_socket", &self.existing.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(raw: &str) -> ConnectRequest {
        ConnectRequest::from_url(&Url::parse(raw).expect("valid url")).expect("http(s) url")
    }

    #[test]
    fn default_ports_per_scheme() {
        assert_eq!(request("http://example.com").port(), 80);
        assert_eq!(request("https://example.com").port(), 443);
        assert_eq!(request("https://example.com:8443").port(), 8443);
        assert_eq!(resolve_port(Scheme::Http, Some(0)), 80);
    }

    #[test]
    fn ipv6_hosts_lose_their_brackets() {
        let request = request("http://[::1]:8080/path");
        assert_eq!(request.host(), "::1");
        assert_eq!(
            request.target(),
            TargetAddr::Ip("[::1]:8080".parse().expect("valid socket addr"))
        );
    }

    #[test]
    fn other_schemes_are_rejected() {
        let url = Url::parse("ftp://example.com").expect("valid url");
        assert!(ConnectRequest::<TcpStream>::from_url(&url).is_err());
    }

    #[test]
    fn scheme_accepts_trailing_colon() {
        assert_eq!(Scheme::parse("https:"), Ok(Scheme::Https));
        assert_eq!(Scheme::parse("HTTP"), Ok(Scheme::Http));
    }
}
