//! Connected stream returned by the connectors

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project_lite::pin_project;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio_rustls::client::TlsStream;

pin_project! {
    #[project = ProxyStreamProj]
    /// Stream to the final target, TLS-wrapped when the target is https.
    pub enum ProxyStream<S> {
        Plain { #[pin] inner: S },
        Tls { #[pin] inner: TlsStream<S> },
    }
}

impl<S> ProxyStream<S> {
    pub fn plain(inner: S) -> Self {
        ProxyStream::Plain { inner }
    }

    pub fn tls(inner: TlsStream<S>) -> Self {
        ProxyStream::Tls { inner }
    }

    pub fn is_tls(&self) -> bool {
        matches!(self, ProxyStream::Tls { .. })
    }

    /// Underlying transport below any TLS layer.
    pub fn get_ref(&self) -> &S {
        match self {
            ProxyStream::Plain { inner } => inner,
            ProxyStream::Tls { inner } => inner.get_ref().0,
        }
    }

    /// ALPN protocol agreed during the TLS handshake.
    pub fn negotiated_alpn(&self) -> Option<&[u8]> {
        match self {
            ProxyStream::Plain { .. } => None,
            ProxyStream::Tls { inner } => inner.get_ref().1.alpn_protocol(),
        }
    }
}

impl<S> std::fmt::Debug for ProxyStream<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProxyStream::Plain { .. } => f.write_str("ProxyStream::Plain"),
            ProxyStream::Tls { .. } => f.write_str("ProxyStream::Tls"),
        }
    }
}

impl<S> AsyncRead for ProxyStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.project() {
            ProxyStreamProj::Plain { inner } => inner.poll_read(cx, buf),
            ProxyStreamProj::Tls { inner } => inner.poll_read(cx, buf),
        }
    }
}

impl<S> AsyncWrite for ProxyStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.project() {
            ProxyStreamProj::Plain { inner } => inner.poll_write(cx, buf),
            ProxyStreamProj::Tls { inner } => inner.poll_write(cx, buf),
        }
    }

    fn poll_write_vectored(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        bufs: &[io::IoSlice<'_>],
    ) -> Poll<io::Result<usize>> {
        match self.project() {
            ProxyStreamProj::Plain { inner } => inner.poll_write_vectored(cx, bufs),
            ProxyStreamProj::Tls { inner } => inner.poll_write_vectored(cx, bufs),
        }
    }

    fn is_write_vectored(&self) -> bool {
        match self {
            ProxyStream::Plain { inner } => inner.is_write_vectored(),
            ProxyStream::Tls { inner } => inner.is_write_vectored(),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            ProxyStreamProj::Plain { inner } => inner.poll_flush(cx),
            ProxyStreamProj::Tls { inner } => inner.poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.project() {
            ProxyStreamProj::Plain { inner } => inner.poll_shutdown(cx),
            ProxyStreamProj::Tls { inner } => inner.poll_shutdown(cx),
        }
    }
}

/// Object-safe byte stream, used where plain and tunneled connections mix.
pub trait Io: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T> Io for T where T: AsyncRead + AsyncWrite + Send + Unpin {}

impl std::fmt::Debug for dyn Io {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("BoxedIo")
    }
}

pub type BoxedIo = Box<dyn Io>;
