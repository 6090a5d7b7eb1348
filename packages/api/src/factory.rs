//! Dispatcher construction from chains, proxy URLs and resolvers

use proxychain_client::config::Validator;
use proxychain_client::connect::ForwardConnector;
use proxychain_client::error::Result;
use proxychain_client::proxy::{
    ForwardProxy, ProxyChain, ProxyResolver, ProxyTarget, ResolvedProxy, parse_proxy_url,
    parse_resolution,
};
use url::Url;

use crate::dispatcher::{Dispatcher, Route, SocksConnector};
use crate::options::DispatcherOptions;

/// Connector that walks `proxies` for every connection.
///
/// # Errors
///
/// Returns a configuration error when the options or a hop are invalid.
pub fn socks_connector(
    proxies: impl Into<ProxyChain>,
    options: &DispatcherOptions,
) -> Result<SocksConnector> {
    options.validate()?;
    SocksConnector::new(proxies.into(), options.connector.clone(), &options.tls)
}

/// Dispatcher sending every request through the SOCKS chain `proxies`.
///
/// # Errors
///
/// See [`socks_connector`].
pub fn socks_dispatcher(
    proxies: impl Into<ProxyChain>,
    options: &DispatcherOptions,
) -> Result<Dispatcher> {
    let connector = socks_connector(proxies, options)?;
    Ok(Dispatcher::new(Route::Socks(connector), options.request_timeout))
}

/// Dispatcher tunneling every request through an HTTP forward proxy.
///
/// # Errors
///
/// Returns a configuration error when the options are invalid.
pub fn forward_dispatcher(proxy: ForwardProxy, options: &DispatcherOptions) -> Result<Dispatcher> {
    options.validate()?;
    let connector = ForwardConnector::new(proxy, options.connector.clone(), &options.tls)?;
    Ok(Dispatcher::new(Route::Forward(connector), options.request_timeout))
}

/// Dispatcher for a single proxy URL with default options.
///
/// `socks://`, `socks4://` and `socks5://` URLs give a one-hop SOCKS
/// dispatcher; `http://` and `https://` a forward-proxy dispatcher.
///
/// # Errors
///
/// Returns a configuration error for malformed URLs or unknown schemes.
pub fn new_proxy_dispatcher(proxy_url: &str) -> Result<Dispatcher> {
    new_proxy_dispatcher_with(proxy_url, &DispatcherOptions::default())
}

/// [`new_proxy_dispatcher`] with explicit options.
///
/// # Errors
///
/// See [`new_proxy_dispatcher`].
pub fn new_proxy_dispatcher_with(proxy_url: &str, options: &DispatcherOptions) -> Result<Dispatcher> {
    match parse_proxy_url(proxy_url)? {
        ProxyTarget::Socks(hop) => socks_dispatcher(hop, options),
        ProxyTarget::Forward(proxy) => forward_dispatcher(proxy, options),
    }
}

/// Ask `resolver` how to reach `url` and build the matching dispatcher.
///
/// `Ok(None)` means connect directly: the resolver had no answer, answered
/// `DIRECT`, or offered only entry types this crate does not speak.
///
/// # Errors
///
/// Fails when the resolver fails or its first recognised entry is malformed.
pub async fn get_proxy_dispatcher<R>(
    url: &Url,
    resolver: &R,
    options: &DispatcherOptions,
) -> Result<Option<Dispatcher>>
where
    R: ProxyResolver,
{
    let Some(resolution) = resolver.resolve(url).await? else {
        tracing::debug!(target: "proxychain::dispatcher", %url, "resolver gave no answer");
        return Ok(None);
    };

    tracing::debug!(
        target: "proxychain::dispatcher",
        %url,
        resolution = %resolution,
        "resolved proxy"
    );

    match parse_resolution(&resolution)? {
        Some(ResolvedProxy::Socks(chain)) => socks_dispatcher(chain, options).map(Some),
        Some(ResolvedProxy::Forward(proxy)) => forward_dispatcher(proxy, options).map(Some),
        None => Ok(None),
    }
}
