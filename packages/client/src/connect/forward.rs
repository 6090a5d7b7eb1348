//! Connector for HTTP forward proxies
//!
//! Every target, http or https, is reached through a `CONNECT` tunnel. An
//! https proxy is itself spoken to over TLS.

use std::fmt;
use std::sync::Arc;

use tokio::time::timeout;

use super::dial::{Dial, TcpDialer, Transport};
use super::http_connect::{basic_auth, establish_connect_tunnel};
use super::request::ConnectRequest;
use super::stream::BoxedIo;
use crate::config::{ConnectorConfig, Validator};
use crate::error::{self, Result};
use crate::proxy::ForwardProxy;
use crate::tls::{TlsOptions, TlsUpgrader};

#[derive(Clone)]
pub struct ForwardConnector<D: Dial = TcpDialer> {
    proxy: ForwardProxy,
    config: Arc<ConnectorConfig>,
    /// Handshakes with the proxy itself. Offers only `http/1.1` and never
    /// uses the target name override.
    proxy_tls: TlsUpgrader,
    target_tls: TlsUpgrader,
    authorization: Option<String>,
    dialer: D,
}

impl ForwardConnector<TcpDialer> {
    /// # Errors
    ///
    /// Returns a configuration error if the settings are invalid.
    pub fn new(proxy: ForwardProxy, config: ConnectorConfig, tls: &TlsOptions) -> Result<Self> {
        let dialer = TcpDialer::new().with_keepalive(config.keepalive);
        Self::with_dialer(proxy, config, tls, dialer)
    }
}

impl<D: Dial> ForwardConnector<D> {
    /// # Errors
    ///
    /// Returns a configuration error if the settings are invalid.
    pub fn with_dialer(
        proxy: ForwardProxy,
        config: ConnectorConfig,
        tls: &TlsOptions,
        dialer: D,
    ) -> Result<Self> {
        config.validate()?;

        // The CONNECT request is HTTP/1.1 whatever the target speaks.
        let mut proxy_options = tls.clone();
        proxy_options.server_name = None;
        proxy_options.alpn_protocols = vec![b"http/1.1".to_vec()];

        let authorization = proxy
            .credentials()
            .map(|(username, password)| basic_auth(username, password));

        Ok(Self {
            proxy,
            config: Arc::new(config),
            proxy_tls: TlsUpgrader::new(&proxy_options)?,
            target_tls: TlsUpgrader::new(tls)?,
            authorization,
            dialer,
        })
    }

    pub fn proxy(&self) -> &ForwardProxy {
        &self.proxy
    }

    /// Open a tunnel to the request's target through the forward proxy.
    ///
    /// # Errors
    ///
    /// Fails with `Kind::Connect` or `Kind::Timeout` when the proxy cannot be
    /// reached or refuses the tunnel, and `Kind::TlsHandshake` when either
    /// TLS upgrade fails.
    pub async fn connect(&self, request: ConnectRequest<D::Stream>) -> Result<BoxedIo> {
        let (scheme, host, target, existing) = request.into_parts();

        tracing::debug!(
            target: "proxychain::connect",
            proxy = ?self.proxy,
            %target,
            %scheme,
            "connecting through forward proxy"
        );

        let socket = match existing {
            Some(socket) => socket,
            None => timeout(
                self.config.connect_timeout,
                self.dialer.dial(&self.proxy.address()),
            )
            .await
            .map_err(error::timeout)?
            .map_err(error::connect)?,
        };
        if self.config.nodelay {
            socket.set_nodelay(true).map_err(error::connect)?;
        }

        let mut tunnel: BoxedIo = if self.proxy.scheme().is_https() {
            Box::new(self.proxy_tls.handshake(socket, self.proxy.host()).await?)
        } else {
            Box::new(socket)
        };

        timeout(
            self.config.connect_timeout,
            establish_connect_tunnel(&mut tunnel, &target, self.authorization.as_deref()),
        )
        .await
        .map_err(error::timeout)?
        .map_err(error::connect)?;

        if scheme.is_https() {
            let tls = self.target_tls.handshake(tunnel, &host).await?;
            return Ok(Box::new(tls));
        }

        Ok(tunnel)
    }
}

impl<D: Dial> fmt::Debug for ForwardConnector<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForwardConnector")
            .field("proxy", &self.proxy)
            .field("config", &self.config)
            .field("authorization", &self.authorization.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}
