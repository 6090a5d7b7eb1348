//! Platform proxy resolution strings
//!
//! Operating systems and browsers answer "which proxy for this URL?" with a
//! PAC-style list such as `"SOCKS5 127.0.0.1:1080; PROXY 10.0.0.1:8080"`.
//! Only the first entry is honoured; there is no failover down the list.

use url::Url;

use super::chain::ProxyChain;
use super::descriptor::{ProxyDescriptor, SocksVersion};
use super::url_handling::ForwardProxy;
use crate::config::{ConfigResult, ConfigValidator, ConfigurationError};

/// Usable proxy selected from a resolution string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedProxy {
    /// Tunnel through SOCKS hops
    Socks(ProxyChain),
    /// Tunnel through an HTTP forward proxy with `CONNECT`
    Forward(ForwardProxy),
}

/// Parse a resolution string.
///
/// Returns `Ok(None)` when the string is empty or its first entry is not a
/// proxy (`DIRECT` or an unknown type): the caller connects directly.
///
/// # Errors
///
/// Returns a `ConfigurationError` when the first entry has a recognised
/// type but a missing or malformed `host:port`.
pub fn parse_resolution(raw: &str) -> ConfigResult<Option<ResolvedProxy>> {
    let Some(first) = raw.split(';').map(str::trim).find(|entry| !entry.is_empty()) else {
        return Ok(None);
    };

    let mut parts = first.split_whitespace();
    let kind = parts.next().unwrap_or_default();
    let address = parts.next();

    let resolved = match kind {
        "SOCKS" | "SOCKS5" => ResolvedProxy::Socks(socks_chain(SocksVersion::V5, first, address)?),
        "SOCKS4" => ResolvedProxy::Socks(socks_chain(SocksVersion::V4, first, address)?),
        "PROXY" => ResolvedProxy::Forward(forward(first, "http", address)?),
        "HTTPS" => ResolvedProxy::Forward(forward(first, "https", address)?),
        other => {
            tracing::debug!(
                target: "proxychain::resolve",
                kind = %other,
                "resolution entry is not a proxy, connecting directly"
            );
            return Ok(None);
        }
    };

    if parts.next().is_some() {
        return Err(malformed(first, "unexpected trailing text"));
    }

    Ok(Some(resolved))
}

fn socks_chain(
    version: SocksVersion,
    entry: &str,
    address: Option<&str>,
) -> ConfigResult<ProxyChain> {
    let (host, port) = split_host_port(entry, address)?;
    Ok(ProxyDescriptor::new(version, host, port)?.into())
}

fn forward(entry: &str, scheme: &str, address: Option<&str>) -> ConfigResult<ForwardProxy> {
    // validate before building the URL so the error names the entry
    split_host_port(entry, address)?;
    let raw = format!("{scheme}://{}", address.unwrap_or_default());
    let url = Url::parse(&raw).map_err(|e| malformed(entry, &e.to_string()))?;
    ForwardProxy::from_url(url)
}

/// Split `host:port`, accepting bracketed IPv6 literals.
fn split_host_port(entry: &str, address: Option<&str>) -> ConfigResult<(String, u16)> {
    let address = address.ok_or_else(|| malformed(entry, "missing host:port"))?;

    let (host, port) = if let Some(rest) = address.strip_prefix('[') {
        let (host, tail) = rest
            .split_once(']')
            .ok_or_else(|| malformed(entry, "unterminated IPv6 literal"))?;
        let port = tail
            .strip_prefix(':')
            .ok_or_else(|| malformed(entry, "missing port"))?;
        (host, port)
    } else {
        address
            .rsplit_once(':')
            .ok_or_else(|| malformed(entry, "missing port"))?
    };

    if host.is_empty() {
        return Err(malformed(entry, "missing host"));
    }

    let port = ConfigValidator::parse_port(port, "proxy port")
        .map_err(|e| malformed(entry, &e.to_string()))?;

    Ok((host.to_string(), port))
}

fn malformed(entry: &str, reason: &str) -> ConfigurationError {
    ConfigurationError::MalformedEntry(format!("`{entry}`: {reason}"))
}
