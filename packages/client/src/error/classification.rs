use std::error::Error as StdError;
use std::io;

use super::types::{Error, Kind};

impl Error {
    /// Returns the index of the failing hop, if a SOCKS hop failed.
    #[must_use]
    pub fn hop_index(&self) -> Option<usize> {
        match self.inner.kind {
            Kind::HopConnect { index } => Some(index),
            _ => None,
        }
    }

    /// Returns true if a SOCKS hop failed.
    #[must_use]
    pub fn is_hop(&self) -> bool {
        matches!(self.inner.kind, Kind::HopConnect { .. })
    }

    /// Returns true if the TLS upgrade failed.
    #[must_use]
    pub fn is_tls(&self) -> bool {
        matches!(self.inner.kind, Kind::TlsHandshake)
    }

    /// Returns true if the error comes from an invalid configuration.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self.inner.kind, Kind::Configuration)
    }

    /// Returns true if the error is related to connecting.
    #[must_use]
    pub fn is_connect(&self) -> bool {
        matches!(
            self.inner.kind,
            Kind::Connect | Kind::HopConnect { .. } | Kind::TlsHandshake
        )
    }

    /// Returns true if the error is related to a timeout.
    ///
    /// Walks the source chain, so a hop that failed because its negotiation
    /// ran out of time also counts.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        if matches!(self.inner.kind, Kind::Timeout) {
            return true;
        }

        let mut source = self.source();

        while let Some(err) = source {
            if err.is::<tokio::time::error::Elapsed>() {
                return true;
            }
            if let Some(io) = err.downcast_ref::<io::Error>()
                && io.kind() == io::ErrorKind::TimedOut
            {
                return true;
            }
            if let Some(inner) = err.downcast_ref::<Error>()
                && inner.is_timeout()
            {
                return true;
            }
            source = err.source();
        }

        false
    }

    /// Returns true if the HTTP exchange failed after connecting.
    #[must_use]
    pub fn is_request(&self) -> bool {
        matches!(self.inner.kind, Kind::Request)
    }
}
