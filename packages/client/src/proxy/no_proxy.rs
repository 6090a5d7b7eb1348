//! `NO_PROXY` matching
//!
//! Handles no-proxy configuration strings with domain, wildcard, IP and
//! CIDR entries.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

/// Hosts that bypass the proxy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NoProxy {
    inner: String,
}

impl NoProxy {
    /// Returns a new no-proxy configuration based on a `no_proxy` string (or
    /// `None` if the string is blank).
    ///
    /// * Entries are comma-separated; whitespace between entries is ignored
    /// * IP addresses (both IPv4 and IPv6) are allowed, as are subnets in
    ///   CIDR notation, for example `192.168.1.0/24`
    /// * An entry `*` matches all hostnames (this is the only wildcard)
    /// * Any other entry is a domain name, optionally with a leading dot, and
    ///   matches that domain and all of its subdomains
    ///
    /// With `"google.com, 192.168.1.0/24"`, `google.com`, `www.google.com` and
    /// `192.168.1.42` bypass the proxy; `notgoogle.com` does not.
    #[must_use]
    pub fn from_string(no_proxy_list: &str) -> Option<Self> {
        if no_proxy_list.trim().is_empty() {
            return None;
        }

        Some(NoProxy {
            inner: no_proxy_list.to_string(),
        })
    }

    /// Check if a host should bypass the proxy.
    #[must_use]
    pub fn matches(&self, host: &str) -> bool {
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host)
            .to_ascii_lowercase();
        let host_ip = host.parse::<IpAddr>().ok();

        for pattern in self.inner.split(',') {
            let pattern = pattern.trim().to_ascii_lowercase();
            if pattern.is_empty() {
                continue;
            }

            if pattern == "*" {
                return true;
            }

            if let Some((network, prefix_len)) = parse_cidr_pattern(&pattern) {
                if host_ip.is_some_and(|ip| ip_in_subnet(ip, network, prefix_len)) {
                    return true;
                }
                continue;
            }

            if let Ok(pattern_ip) = pattern.parse::<IpAddr>() {
                if host_ip == Some(pattern_ip) {
                    return true;
                }
                continue;
            }

            let domain = pattern.trim_start_matches('.');
            if host == domain || host.ends_with(&format!(".{domain}")) {
                return true;
            }
        }

        false
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

/// Parse a CIDR pattern (e.g., "192.168.1.0/24" or "2001:db8::/32")
fn parse_cidr_pattern(pattern: &str) -> Option<(IpAddr, u8)> {
    let (network, prefix) = pattern.split_once('/')?;
    let network = network.parse::<IpAddr>().ok()?;
    let prefix_len = prefix.parse::<u8>().ok()?;

    let max_prefix = match network {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    };

    (prefix_len <= max_prefix).then_some((network, prefix_len))
}

fn ip_in_subnet(ip: IpAddr, network: IpAddr, prefix_len: u8) -> bool {
    match (ip, network) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => ipv4_in_subnet(ip, net, prefix_len),
        (IpAddr::V6(ip), IpAddr::V6(net)) => ipv6_in_subnet(ip, net, prefix_len),
        _ => false,
    }
}

fn ipv4_in_subnet(ip: Ipv4Addr, network: Ipv4Addr, prefix_len: u8) -> bool {
    if prefix_len == 0 {
        return true;
    }
    let mask = u32::MAX << (32 - u32::from(prefix_len));
    (u32::from(ip) & mask) == (u32::from(network) & mask)
}

fn ipv6_in_subnet(ip: Ipv6Addr, network: Ipv6Addr, prefix_len: u8) -> bool {
    if prefix_len == 0 {
        return true;
    }
    let mask = u128::MAX << (128 - u32::from(prefix_len));
    (u128::from(ip) & mask) == (u128::from(network) & mask)
}
