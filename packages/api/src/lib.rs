//! proxychain public API
//!
//! Dispatchers that send HTTP requests through SOCKS chains or HTTP forward
//! proxies, built from explicit chains, proxy URLs or a proxy resolver.
//!
//! ```no_run
//! use proxychain::{DispatcherOptions, get_proxy_dispatcher, proxy::EnvProxyResolver};
//! use url::Url;
//!
//! # async fn run() -> proxychain::Result<()> {
//! let url = Url::parse("https://example.com/").expect("valid url");
//! let resolver = EnvProxyResolver::from_env();
//! match get_proxy_dispatcher(&url, &resolver, &DispatcherOptions::default()).await? {
//!     Some(dispatcher) => {
//!         let _stream = dispatcher.connect(&url).await?;
//!     }
//!     None => { /* connect directly */ }
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod dispatcher;
pub mod factory;
pub mod options;

pub use dispatcher::{Dispatcher, Route, SocksConnector};
pub use factory::{
    forward_dispatcher, get_proxy_dispatcher, new_proxy_dispatcher, new_proxy_dispatcher_with,
    socks_connector, socks_dispatcher,
};
pub use options::DispatcherOptions;

pub use proxychain_client::{
    BoxedIo, ConnectRequest, Error, Kind, ProxyChain, ProxyDescriptor, ProxyStream, Result,
    Scheme, SocksAuth, SocksVersion, TlsOptions, config, connect, proxy, tls,
};
