//! rustls client configuration

use std::sync::Arc;

use rustls::crypto::{CryptoProvider, ring};
use rustls::{ClientConfig, RootCertStore};

use super::options::{CertificateVerification, TlsOptions};
use super::verifier::NoCertificateVerification;
use crate::config::{ConfigResult, ConfigurationError};

/// Build the rustls configuration described by `options`.
///
/// # Errors
///
/// Fails when an extra root certificate cannot be parsed or added, or when
/// the crypto provider offers no usable protocol version.
pub fn build_client_config(options: &TlsOptions) -> ConfigResult<ClientConfig> {
    let provider: Arc<CryptoProvider> = Arc::new(ring::default_provider());

    let builder = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| ConfigurationError::InvalidParameter(e.to_string()))?;

    let mut config = match options.verification {
        CertificateVerification::Full => builder
            .with_root_certificates(root_store(options)?)
            .with_no_client_auth(),
        CertificateVerification::Disabled => {
            tracing::warn!(
                target: "proxychain::tls",
                "TLS certificate verification is disabled"
            );
            builder
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(NoCertificateVerification::new(
                    provider,
                )))
                .with_no_client_auth()
        }
    };

    config.alpn_protocols = options.alpn_protocols.clone();
    Ok(config)
}

fn root_store(options: &TlsOptions) -> ConfigResult<RootCertStore> {
    let mut roots = RootCertStore::empty();

    if options.use_native_roots {
        let loaded = rustls_native_certs::load_native_certs();
        for err in &loaded.errors {
            tracing::warn!(target: "proxychain::tls", "native certificate load error: {err}");
        }
        let (added, ignored) = roots.add_parsable_certificates(loaded.certs);
        tracing::debug!(
            target: "proxychain::tls",
            added,
            ignored,
            "loaded native root certificates"
        );

        if roots.is_empty() {
            roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        }
    }

    for pem in &options.extra_root_certificates {
        let mut reader = pem.as_slice();
        let mut found = false;
        for cert in rustls_pemfile::certs(&mut reader) {
            let cert = cert.map_err(|e| ConfigurationError::InvalidCertificate(e.to_string()))?;
            roots
                .add(cert)
                .map_err(|e| ConfigurationError::InvalidCertificate(e.to_string()))?;
            found = true;
        }
        if !found {
            return Err(ConfigurationError::InvalidCertificate(
                "no certificate found in PEM data".to_string(),
            ));
        }
    }

    Ok(roots)
}
