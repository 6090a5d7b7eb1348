//! Proxy-resolution sources
//!
//! A `ProxyResolver` answers "which proxy for this URL?" with a resolution
//! string (see [`parse_resolution`](super::parse_resolution)). Desktop
//! shells usually ask the browser engine; headless deployments read the
//! conventional environment variables.

use std::collections::HashMap;
use std::env;
use std::future::Future;

use url::Url;

use super::no_proxy::NoProxy;
use crate::config::{ConfigResult, ConfigurationError};
use crate::error::Result;

/// Source of proxy resolution strings.
pub trait ProxyResolver: Send + Sync {
    /// Resolve the proxy for `url`. `Ok(None)` or an empty string both mean
    /// no proxy information is available.
    fn resolve(&self, url: &Url) -> impl Future<Output = Result<Option<String>>> + Send;
}

/// Resolver answering every URL with the same resolution string.
#[derive(Clone, Debug, Default)]
pub struct StaticResolver {
    answer: Option<String>,
}

impl StaticResolver {
    #[must_use]
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: Some(answer.into()),
        }
    }

    /// Resolver that never reports a proxy.
    #[must_use]
    pub fn none() -> Self {
        Self { answer: None }
    }
}

impl ProxyResolver for StaticResolver {
    async fn resolve(&self, _url: &Url) -> Result<Option<String>> {
        Ok(self.answer.clone())
    }
}

/// Resolver reading `HTTP_PROXY`, `HTTPS_PROXY`, `ALL_PROXY` and `NO_PROXY`.
///
/// Upper-case names win over lower-case ones. The scheme-specific variable
/// is consulted first, then `ALL_PROXY`. Hosts matched by `NO_PROXY`
/// resolve to `DIRECT`.
///
/// Resolution strings carry no credentials, so `user:password@` in a
/// variable is dropped. Use
/// [`ForwardProxy::from_url`](super::ForwardProxy::from_url) for a proxy
/// that needs authentication.
#[derive(Clone, Debug, Default)]
pub struct EnvProxyResolver {
    http: Option<String>,
    https: Option<String>,
    all: Option<String>,
    no_proxy: Option<NoProxy>,
}

impl EnvProxyResolver {
    /// Snapshot the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an explicit variable set.
    #[must_use]
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self::from_lookup(|name| vars.get(name).cloned())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| {
            lookup(name)
                .or_else(|| lookup(&name.to_ascii_lowercase()))
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            http: var("HTTP_PROXY"),
            https: var("HTTPS_PROXY"),
            all: var("ALL_PROXY"),
            no_proxy: var("NO_PROXY").and_then(|raw| NoProxy::from_string(&raw)),
        }
    }

    fn resolve_sync(&self, url: &Url) -> ConfigResult<Option<String>> {
        if let (Some(no_proxy), Some(host)) = (&self.no_proxy, url.host_str())
            && no_proxy.matches(host)
        {
            return Ok(Some("DIRECT".to_string()));
        }

        let scheme_specific = match url.scheme() {
            "https" | "wss" => self.https.as_ref(),
            _ => self.http.as_ref(),
        };

        scheme_specific
            .or(self.all.as_ref())
            .map(String::as_str)
            .map(resolution_entry)
            .transpose()
    }
}

impl ProxyResolver for EnvProxyResolver {
    async fn resolve(&self, url: &Url) -> Result<Option<String>> {
        self.resolve_sync(url).map_err(Into::into)
    }
}

/// Convert a proxy URL (scheme optional, `http` assumed) into a resolution
/// entry. Credentials do not survive the conversion.
fn resolution_entry(raw: &str) -> ConfigResult<String> {
    let with_scheme = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    let url = Url::parse(&with_scheme)
        .map_err(|e| ConfigurationError::InvalidUrl(format!("proxy variable `{raw}`: {e}")))?;

    let (kind, default_port) = match url.scheme() {
        "socks" | "socks5" | "socks5h" => ("SOCKS5", 1080),
        "socks4" | "socks4a" => ("SOCKS4", 1080),
        "http" => ("PROXY", 80),
        "https" => ("HTTPS", 443),
        other => {
            return Err(ConfigurationError::UnsupportedScheme(format!(
                "`{other}` in proxy variable `{raw}`"
            )));
        }
    };

    let host = match url.host() {
        Some(url::Host::Ipv6(ip)) => format!("[{ip}]"),
        Some(other) => other.to_string(),
        None => {
            return Err(ConfigurationError::InvalidUrl(format!(
                "proxy variable `{raw}` has no host"
            )));
        }
    };
    let port = url.port().unwrap_or(default_port);

    if !url.username().is_empty() || url.password().is_some() {
        tracing::warn!(
            target: "proxychain::resolve",
            proxy = %format_args!("{host}:{port}"),
            "dropping credentials from proxy environment variable"
        );
    }

    Ok(format!("{kind} {host}:{port}"))
}
