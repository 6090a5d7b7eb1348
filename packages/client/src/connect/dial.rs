//! Default network connector
//!
//! `Dial` opens the first leg of every connection: either straight to the
//! target or to the first SOCKS hop.

use std::future::Future;
use std::io;
use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

use super::target::TargetAddr;

/// Byte stream a connector can hand back to its caller.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send + 'static {
    /// Disable (or re-enable) Nagle's algorithm where the transport has one.
    fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        let _ = nodelay;
        Ok(())
    }
}

impl Transport for TcpStream {
    fn set_nodelay(&self, nodelay: bool) -> io::Result<()> {
        TcpStream::set_nodelay(self, nodelay)
    }
}

impl Transport for tokio::io::DuplexStream {}

/// Opens plain connections.
pub trait Dial: Clone + Send + Sync + 'static {
    type Stream: Transport;

    fn dial(&self, addr: &TargetAddr) -> impl Future<Output = io::Result<Self::Stream>> + Send;
}

/// TCP dialer backed by tokio.
#[derive(Clone, Debug, Default)]
pub struct TcpDialer {
    keepalive: Option<Duration>,
}

impl TcpDialer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_keepalive(mut self, keepalive: Option<Duration>) -> Self {
        self.keepalive = keepalive;
        self
    }
}

impl Dial for TcpDialer {
    type Stream = TcpStream;

    async fn dial(&self, addr: &TargetAddr) -> io::Result<TcpStream> {
        let stream = match addr {
            TargetAddr::Ip(socket_addr) => TcpStream::connect(*socket_addr).await?,
            TargetAddr::Domain(host, port) => TcpStream::connect((host.as_str(), *port)).await?,
        };

        if let Some(idle) = self.keepalive {
            SockRef::from(&stream).set_tcp_keepalive(&TcpKeepalive::new().with_time(idle))?;
        }

        tracing::trace!(
            target: "proxychain::connect",
            %addr,
            local = ?stream.local_addr().ok(),
            "tcp connection established"
        );

        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn dials_ip_targets() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let dialer = TcpDialer::new().with_keepalive(Some(Duration::from_secs(30)));
        let target = TargetAddr::Ip(addr);
        let (dialed, accepted) = tokio::join!(dialer.dial(&target), listener.accept());

        let stream = dialed.expect("dial succeeds");
        accepted.expect("accept succeeds");
        assert_eq!(stream.peer_addr().expect("peer addr"), addr);
    }

    #[tokio::test]
    async fn refused_connection_is_an_io_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let err = TcpDialer::new()
            .dial(&TargetAddr::Ip(addr))
            .await
            .expect_err("nothing listens");
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
    }
}
