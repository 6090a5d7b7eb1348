//! TLS support for https targets and https forward proxies
//!
//! Built on rustls with the ring provider. Roots come from the platform store
//! with the bundled webpki roots as fallback.

pub mod config;
pub mod errors;
pub mod options;
pub mod upgrade;
pub mod verifier;

pub use config::build_client_config;
pub use errors::TlsError;
pub use options::{CertificateVerification, DEFAULT_HANDSHAKE_TIMEOUT, TlsOptions};
pub use upgrade::TlsUpgrader;
