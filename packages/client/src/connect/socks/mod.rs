//! SOCKS protocol implementation
//!
//! SOCKS4/4a and SOCKS5 `CONNECT` handshakes over any async byte stream, so
//! a negotiation can run inside a tunnel opened by a previous hop.

mod errors;
pub mod v4;
pub mod v5;

pub use errors::{Reply, SocksError};

use tokio::io::{AsyncRead, AsyncWrite};

use crate::connect::TargetAddr;
use crate::proxy::{ProxyDescriptor, SocksVersion};

/// Perform the `CONNECT` handshake described by `proxy` over `stream`.
pub async fn negotiate<S>(
    stream: &mut S,
    proxy: &ProxyDescriptor,
    destination: &TargetAddr,
) -> Result<(), SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    tracing::debug!(
        target: "proxychain::socks",
        proxy = ?proxy,
        %destination,
        "negotiating SOCKS connect"
    );

    match proxy.version() {
        SocksVersion::V4 => v4::connect(stream, destination, proxy.auth()).await,
        SocksVersion::V5 => v5::connect(stream, destination, proxy.auth()).await,
    }
}
