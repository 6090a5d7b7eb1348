use super::BoxError;
use super::types::{Error, Kind};
use crate::config::ConfigurationError;

/// Creates an `Error` for a failed SOCKS hop.
pub fn hop_connect<E: Into<BoxError>>(index: usize, e: E) -> Error {
    Error::new(Kind::HopConnect { index }).with(e.into())
}

/// Creates an `Error` for a failed TLS upgrade.
pub fn tls_handshake<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::TlsHandshake).with(e.into())
}

/// Creates an `Error` for an invalid configuration.
pub fn configuration(e: ConfigurationError) -> Error {
    Error::new(Kind::Configuration).with(e)
}

/// Creates an `Error` for a failed direct or tunneled connection.
pub fn connect<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Connect).with(e.into())
}

/// Creates an `Error` for an expired deadline.
pub fn timeout<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Timeout).with(e.into())
}

/// Creates an `Error` for a failed HTTP exchange.
pub fn request<E: Into<BoxError>>(e: E) -> Error {
    Error::new(Kind::Request).with(e.into())
}

impl From<ConfigurationError> for Error {
    fn from(e: ConfigurationError) -> Self {
        configuration(e)
    }
}
