//! Chain-walking connector
//!
//! Walks a SOCKS chain hop by hop, nesting each negotiation inside the tunnel
//! opened by the previous hop, then upgrades to TLS for https targets.

use std::fmt;
use std::sync::Arc;

use futures::stream::{self, TryStreamExt};
use tokio::time::timeout;

use super::dial::{Dial, TcpDialer, Transport};
use super::request::ConnectRequest;
use super::socks;
use super::stream::ProxyStream;
use super::target::TargetAddr;
use crate::config::{ConnectorConfig, Validator};
use crate::error::{self, Error, Result};
use crate::proxy::{ProxyChain, ProxyDescriptor};
use crate::tls::{TlsOptions, TlsUpgrader};

/// How a hop is reached: through the previous hop's tunnel or a fresh dial.
enum Leg<S> {
    Tunnel(S),
    Dial(TargetAddr),
}

/// Connects to targets through a fixed, possibly empty, SOCKS chain.
#[derive(Clone)]
pub struct ChainConnector<D: Dial = TcpDialer> {
    chain: ProxyChain,
    config: Arc<ConnectorConfig>,
    tls: TlsUpgrader,
    dialer: D,
}

impl ChainConnector<TcpDialer> {
    /// Build a connector over `chain` that dials with TCP.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the settings are invalid or a hop
    /// has neither a hostname nor an IP address.
    pub fn new(chain: ProxyChain, config: ConnectorConfig, tls: &TlsOptions) -> Result<Self> {
        let dialer = TcpDialer::new().with_keepalive(config.keepalive);
        Self::with_dialer(chain, config, tls, dialer)
    }
}

impl<D: Dial> ChainConnector<D> {
    /// Build a connector that opens its first leg through `dialer`.
    ///
    /// # Errors
    ///
    /// See [`ChainConnector::new`].
    pub fn with_dialer(
        chain: ProxyChain,
        config: ConnectorConfig,
        tls: &TlsOptions,
        dialer: D,
    ) -> Result<Self> {
        config.validate()?;
        for hop in &chain {
            hop.validate()?;
            hop.address()?;
        }

        Ok(Self {
            chain,
            config: Arc::new(config),
            tls: TlsUpgrader::new(tls)?,
            dialer,
        })
    }

    pub fn chain(&self) -> &ProxyChain {
        &self.chain
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.config
    }

    /// Open a stream to the request's target through the chain.
    ///
    /// # Errors
    ///
    /// A failing hop yields `Kind::HopConnect` with that hop's index. Direct
    /// dial failures yield `Kind::Connect` or `Kind::Timeout`, and a failed
    /// upgrade `Kind::TlsHandshake`.
    pub async fn connect(
        &self,
        request: ConnectRequest<D::Stream>,
    ) -> Result<ProxyStream<D::Stream>> {
        let (scheme, host, target, existing) = request.into_parts();

        tracing::debug!(
            target: "proxychain::connect",
            %target,
            %scheme,
            hops = self.chain.len(),
            existing_socket = existing.is_some(),
            "connecting"
        );

        if self.chain.is_empty() && !scheme.is_https() && existing.is_none() {
            let socket = self.dial_direct(&target).await?;
            self.apply_nodelay(&socket)?;
            return Ok(ProxyStream::plain(socket));
        }

        let target_ref = &target;
        let socket = stream::iter(self.chain.iter().enumerate().map(Ok::<_, Error>))
            .try_fold(existing, move |current, (index, hop)| async move {
                self.connect_hop(index, hop, current, target_ref)
                    .await
                    .map(Some)
            })
            .await?;

        let socket = match socket {
            Some(socket) => socket,
            None => self.dial_direct(&target).await?,
        };
        self.apply_nodelay(&socket)?;

        if scheme.is_https() {
            let tls = self.tls.handshake(socket, &host).await?;
            return Ok(ProxyStream::tls(tls));
        }

        Ok(ProxyStream::plain(socket))
    }

    async fn connect_hop(
        &self,
        index: usize,
        hop: &ProxyDescriptor,
        current: Option<D::Stream>,
        target: &TargetAddr,
    ) -> Result<D::Stream> {
        let destination = self.chain.destination(index, target)?;
        let leg = match current {
            Some(socket) => Leg::Tunnel(socket),
            None => Leg::Dial(hop.address()?),
        };

        let attempt = async {
            let mut socket = match leg {
                Leg::Tunnel(socket) => socket,
                Leg::Dial(addr) => self.dialer.dial(&addr).await?,
            };
            socks::negotiate(&mut socket, hop, &destination).await?;
            Ok::<_, socks::SocksError>(socket)
        };

        match timeout(self.config.connect_timeout, attempt).await {
            Ok(Ok(socket)) => {
                tracing::debug!(
                    target: "proxychain::connect",
                    hop = index,
                    %destination,
                    "hop connected"
                );
                Ok(socket)
            }
            Ok(Err(e)) => {
                tracing::debug!(target: "proxychain::connect", hop = index, "hop failed: {e}");
                Err(error::hop_connect(index, e))
            }
            Err(elapsed) => {
                tracing::debug!(target: "proxychain::connect", hop = index, "hop timed out");
                Err(error::hop_connect(index, elapsed))
            }
        }
    }

    async fn dial_direct(&self, target: &TargetAddr) -> Result<D::Stream> {
        timeout(self.config.connect_timeout, self.dialer.dial(target))
            .await
            .map_err(error::timeout)?
            .map_err(error::connect)
    }

    fn apply_nodelay(&self, socket: &D::Stream) -> Result<()> {
        if self.config.nodelay {
            socket.set_nodelay(true).map_err(error::connect)?;
        }
        Ok(())
    }
}

impl<D: Dial> fmt::Debug for ChainConnector<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainConnector")
            .field("chain", &self.chain)
            .field("config", &self.config)
            .field("tls", &self.tls)
            .finish()
    }
}
