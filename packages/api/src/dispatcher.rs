//! Proxy dispatchers
//!
//! A `Dispatcher` opens connections through its route and can drive a single
//! HTTP/1.1 exchange over them with hyper.

use std::error::Error as StdError;
use std::time::Duration;

use http::header::{HOST, HeaderValue};
use http::{Request, Response, Uri};
use http_body::Body;
use hyper::body::Incoming;
use hyper_util::rt::TokioIo;
use proxychain_client::config::ConfigurationError;
use proxychain_client::connect::{BoxedIo, ChainConnector, ConnectRequest, ForwardConnector};
use proxychain_client::error::{self, Result};
use url::Url;

/// Connector walking a SOCKS chain over TCP.
pub type SocksConnector = ChainConnector;

/// Where a dispatcher sends its connections.
#[derive(Debug, Clone)]
pub enum Route {
    Socks(SocksConnector),
    Forward(ForwardConnector),
}

#[derive(Debug, Clone)]
pub struct Dispatcher {
    route: Route,
    request_timeout: Option<Duration>,
}

impl Dispatcher {
    pub fn new(route: Route, request_timeout: Option<Duration>) -> Self {
        Self {
            route,
            request_timeout,
        }
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn is_socks(&self) -> bool {
        matches!(self.route, Route::Socks(_))
    }

    pub fn is_forward(&self) -> bool {
        matches!(self.route, Route::Forward(_))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout
    }

    /// Open a byte stream to the host of `url`, TLS-wrapped for https.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for URLs without a host or with a
    /// scheme other than http or https, otherwise the connector's error.
    pub async fn connect(&self, url: &Url) -> Result<BoxedIo> {
        let request = ConnectRequest::from_url(url)?;

        let connected = match &self.route {
            Route::Socks(connector) => connector
                .connect(request)
                .await
                .map(|stream| Box::new(stream) as BoxedIo),
            Route::Forward(connector) => connector.connect(request).await,
        };
        connected.map_err(|e| e.with_url(url.clone()))
    }

    /// Send `request` over a fresh connection and return the response head.
    ///
    /// The request URI must be absolute. It is rewritten to origin form and
    /// a `Host` header is added when missing.
    ///
    /// # Errors
    ///
    /// Connection failures as for [`Dispatcher::connect`], `Kind::Request`
    /// when the exchange fails and `Kind::Timeout` when the request timeout
    /// elapses.
    pub async fn send<B>(&self, request: Request<B>) -> Result<Response<Incoming>>
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        match self.request_timeout {
            Some(limit) => tokio::time::timeout(limit, self.exchange(request))
                .await
                .map_err(error::timeout)?,
            None => self.exchange(request).await,
        }
    }

    async fn exchange<B>(&self, mut request: Request<B>) -> Result<Response<Incoming>>
    where
        B: Body + Send + 'static,
        B::Data: Send,
        B::Error: Into<Box<dyn StdError + Send + Sync>>,
    {
        let url = Url::parse(&request.uri().to_string()).map_err(|e| {
            error::configuration(ConfigurationError::InvalidUrl(format!(
                "`{}`: {e}",
                request.uri()
            )))
        })?;

        let io = self.connect(&url).await?;
        let (mut sender, connection) = hyper::client::conn::http1::handshake(TokioIo::new(io))
            .await
            .map_err(error::request)?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::debug!(target: "proxychain::dispatcher", "connection closed with error: {e}");
            }
        });

        if !request.headers().contains_key(HOST) {
            let host = host_header(&url)?;
            request.headers_mut().insert(HOST, host);
        }

        let origin_form: Uri = request
            .uri()
            .path_and_query()
            .map_or("/", |p| p.as_str())
            .parse()
            .map_err(error::request)?;
        *request.uri_mut() = origin_form;

        tracing::debug!(
            target: "proxychain::dispatcher",
            method = %request.method(),
            %url,
            "sending request"
        );

        sender
            .send_request(request)
            .await
            .map_err(|e| error::request(e).with_url(url))
    }
}

fn host_header(url: &Url) -> Result<HeaderValue> {
    let host = url.host_str().unwrap_or_default();
    let value = match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    HeaderValue::from_str(&value).map_err(error::request)
}
