use std::error::Error as StdError;
use std::fmt;

/// A Result alias where the Err case is `proxychain_client::Error`.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents errors that can occur while establishing a proxied connection.
pub struct Error {
    pub inner: Box<Inner>,
}

pub struct Inner {
    pub kind: Kind,
    pub source: Option<Box<dyn StdError + Send + Sync>>,
    pub url: Option<url::Url>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// A SOCKS hop failed; `index` is its position in the chain
    HopConnect { index: usize },
    /// TLS upgrade failed
    TlsHandshake,
    /// Malformed proxy descriptor, proxy URL, resolution entry or setting
    Configuration,
    /// Direct connection or forward-proxy tunnel failed
    Connect,
    /// An operation exceeded its deadline
    Timeout,
    /// HTTP exchange failed after the connection was established
    Request,
}

impl Error {
    pub fn new(kind: Kind) -> Error {
        Error {
            inner: Box::new(Inner {
                kind,
                source: None,
                url: None,
            }),
        }
    }

    #[must_use = "Error builder methods return a new Error and should be used"]
    pub fn with<E: Into<Box<dyn StdError + Send + Sync>>>(mut self, source: E) -> Error {
        self.inner.source = Some(source.into());
        self
    }

    #[must_use]
    pub fn with_url(mut self, url: url::Url) -> Self {
        self.inner.url = Some(url);
        self
    }

    #[must_use]
    pub fn kind(&self) -> Kind {
        self.inner.kind
    }

    /// Get the URL associated with this error, if any
    #[must_use]
    pub fn url(&self) -> Option<&url::Url> {
        self.inner.url.as_ref()
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut f = f.debug_struct("proxychain::Error");

        f.field("kind", &self.inner.kind);

        if let Some(ref source) = self.inner.source {
            f.field("source", source);
        }

        if let Some(ref url) = self.inner.url {
            f.field("url", url);
        }

        f.finish()
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.kind {
            Kind::HopConnect { index } => write!(f, "proxy hop {index} failed")?,
            Kind::TlsHandshake => f.write_str("TLS handshake failed")?,
            Kind::Configuration => f.write_str("invalid proxy configuration")?,
            Kind::Connect => f.write_str("connection failed")?,
            Kind::Timeout => f.write_str("operation timed out")?,
            Kind::Request => f.write_str("error sending request")?,
        }

        if let Some(url) = &self.inner.url {
            write!(f, " for url ({url})")?;
        }

        Ok(())
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner
            .source
            .as_ref()
            .map(|err| &**err as &(dyn StdError + 'static))
    }
}
