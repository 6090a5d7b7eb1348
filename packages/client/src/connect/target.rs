//! Destination addresses for SOCKS negotiation and direct dialing

use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Address a single hop is asked to reach: a literal socket address or a
/// domain name the proxy resolves on our behalf.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TargetAddr {
    Ip(SocketAddr),
    Domain(String, u16),
}

impl TargetAddr {
    /// Build a destination from a host string, recognising IP literals
    /// (bracketed IPv6 included).
    #[must_use]
    pub fn new(host: &str, port: u16) -> Self {
        let bare = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        match bare.parse::<IpAddr>() {
            Ok(ip) => TargetAddr::Ip(SocketAddr::new(ip, port)),
            Err(_) => TargetAddr::Domain(bare.to_string(), port),
        }
    }

    #[must_use]
    pub fn port(&self) -> u16 {
        match self {
            TargetAddr::Ip(addr) => addr.port(),
            TargetAddr::Domain(_, port) => *port,
        }
    }

    /// Host part without brackets, suitable for DNS lookup or SNI.
    #[must_use]
    pub fn host(&self) -> String {
        match self {
            TargetAddr::Ip(addr) => addr.ip().to_string(),
            TargetAddr::Domain(domain, _) => domain.clone(),
        }
    }
}

impl From<SocketAddr> for TargetAddr {
    fn from(addr: SocketAddr) -> Self {
        TargetAddr::Ip(addr)
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ip(addr) => write!(f, "{addr}"),
            TargetAddr::Domain(domain, port) => write!(f, "{domain}:{port}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognises_ip_literals() {
        assert_eq!(
            TargetAddr::new("127.0.0.1", 1080),
            TargetAddr::Ip("127.0.0.1:1080".parse().expect("valid socket addr"))
        );
        assert_eq!(
            TargetAddr::new("[::1]", 443),
            TargetAddr::Ip("[::1]:443".parse().expect("valid socket addr"))
        );
    }

    #[test]
    fn keeps_domains() {
        let addr = TargetAddr::new("example.com", 80);
        assert_eq!(addr, TargetAddr::Domain("example.com".into(), 80));
        assert_eq!(addr.to_string(), "example.com:80");
        assert_eq!(addr.host(), "example.com");
    }
}
