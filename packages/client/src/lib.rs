//! # proxychain client
//!
//! Connection establishment through chains of SOCKS4/SOCKS5 proxies and HTTP
//! forward proxies, with a TLS upgrade for https targets.
//!
//! ## Features
//!
//! - **SOCKS chains** of any length, each hop negotiated inside the previous tunnel
//! - **SOCKS5 username/password** and SOCKS4a domain requests
//! - **HTTP CONNECT** tunnels through http or https forward proxies
//! - **Rustls TLS** with native root certificates
//! - **Proxy resolution** from PAC-style strings, proxy URLs and the environment
//!
//! ## Usage
//!
//! ```no_run
//! use proxychain_client::config::ConnectorConfig;
//! use proxychain_client::connect::{ChainConnector, ConnectRequest, Scheme};
//! use proxychain_client::proxy::{ProxyChain, ProxyDescriptor};
//! use proxychain_client::tls::TlsOptions;
//!
//! # async fn run() -> proxychain_client::Result<()> {
//! let chain = ProxyChain::new(vec![
//!     ProxyDescriptor::socks5("127.0.0.1", 1080)?,
//!     ProxyDescriptor::socks4("10.0.0.2", 1080)?,
//! ]);
//! let connector = ChainConnector::new(chain, ConnectorConfig::default(), &TlsOptions::default())?;
//! let stream = connector
//!     .connect(ConnectRequest::new(Scheme::Https, "example.com"))
//!     .await?;
//! assert!(stream.is_tls());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(clippy::all)]

pub mod config;
pub mod connect;
pub mod error;
pub mod proxy;
pub mod tls;

pub use config::{ConfigurationError, ConnectorConfig};
pub use connect::{
    BoxedIo, ChainConnector, ConnectRequest, ForwardConnector, ProxyStream, Scheme, TargetAddr,
};
pub use error::{Error, Kind, Result};
pub use proxy::{
    EnvProxyResolver, ForwardProxy, ProxyChain, ProxyDescriptor, ProxyResolver, ResolvedProxy,
    SocksAuth, SocksVersion, StaticResolver,
};
pub use tls::{CertificateVerification, TlsOptions};
pub use url::Url;
