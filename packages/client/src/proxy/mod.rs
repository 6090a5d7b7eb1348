//! Proxy configuration model
//!
//! SOCKS hop descriptors and chains, forward proxies, proxy URL and
//! resolution-string parsing, `NO_PROXY` rules and resolution sources.

pub mod chain;
pub mod descriptor;
pub mod no_proxy;
pub mod resolution;
pub mod system;
pub mod url_handling;

pub use chain::ProxyChain;
pub use descriptor::{ProxyDescriptor, SocksAuth, SocksVersion};
pub use no_proxy::NoProxy;
pub use resolution::{ResolvedProxy, parse_resolution};
pub use system::{EnvProxyResolver, ProxyResolver, StaticResolver};
pub use url_handling::{DEFAULT_SOCKS_PORT, ForwardProxy, ProxyTarget, parse_proxy_url};
