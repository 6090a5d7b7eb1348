//! In-process proxy and target servers for integration tests
#![allow(dead_code)]

use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use rustls::ServerConfig;
use rustls::crypto::ring;
use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, copy_bidirectional};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;

/// Destination a proxy server was asked to reach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requested {
    pub host: String,
    pub port: u16,
}

impl Requested {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Socks5Behavior {
    Relay,
    RequireAuth { username: String, password: String },
    Reject(u8),
}

/// A SOCKS server listening on loopback.
pub struct ProxyServer {
    pub addr: SocketAddr,
    requested: Arc<Mutex<Vec<Requested>>>,
    accepted: Arc<AtomicUsize>,
}

impl ProxyServer {
    pub fn requested(&self) -> Vec<Requested> {
        self.requested.lock().expect("Failed to lock request log").clone()
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }
}

async fn bind() -> TcpListener {
    TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind loopback listener")
}

pub async fn spawn_socks5(behavior: Socks5Behavior) -> ProxyServer {
    let listener = bind().await;
    let addr = listener.local_addr().expect("Failed to read listener address");
    let requested = Arc::new(Mutex::new(Vec::new()));
    let accepted = Arc::new(AtomicUsize::new(0));

    let log = requested.clone();
    let count = accepted.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            count.fetch_add(1, Ordering::SeqCst);
            let log = log.clone();
            let behavior = behavior.clone();
            tokio::spawn(async move {
                let _ = serve_socks5(socket, behavior, log).await;
            });
        }
    });

    ProxyServer {
        addr,
        requested,
        accepted,
    }
}

async fn serve_socks5(
    mut client: TcpStream,
    behavior: Socks5Behavior,
    log: Arc<Mutex<Vec<Requested>>>,
) -> std::io::Result<()> {
    let mut head = [0u8; 2];
    client.read_exact(&mut head).await?;
    let mut methods = vec![0u8; usize::from(head[1])];
    client.read_exact(&mut methods).await?;

    match &behavior {
        Socks5Behavior::RequireAuth { username, password } => {
            if !methods.contains(&0x02) {
                client.write_all(&[5, 0xFF]).await?;
                return Ok(());
            }
            client.write_all(&[5, 0x02]).await?;

            let mut version_ulen = [0u8; 2];
            client.read_exact(&mut version_ulen).await?;
            let mut user = vec![0u8; usize::from(version_ulen[1])];
            client.read_exact(&mut user).await?;
            let plen = client.read_u8().await?;
            let mut pass = vec![0u8; usize::from(plen)];
            client.read_exact(&mut pass).await?;

            if user != username.as_bytes() || pass != password.as_bytes() {
                client.write_all(&[1, 1]).await?;
                return Ok(());
            }
            client.write_all(&[1, 0]).await?;
        }
        _ => client.write_all(&[5, 0x00]).await?,
    }

    let mut request = [0u8; 4];
    client.read_exact(&mut request).await?;
    let host = match request[3] {
        0x01 => {
            let mut ip = [0u8; 4];
            client.read_exact(&mut ip).await?;
            Ipv4Addr::from(ip).to_string()
        }
        0x04 => {
            let mut ip = [0u8; 16];
            client.read_exact(&mut ip).await?;
            Ipv6Addr::from(ip).to_string()
        }
        _ => {
            let len = client.read_u8().await?;
            let mut name = vec![0u8; usize::from(len)];
            client.read_exact(&mut name).await?;
            String::from_utf8_lossy(&name).into_owned()
        }
    };
    let port = client.read_u16().await?;
    log.lock()
        .expect("Failed to lock request log")
        .push(Requested::new(host.clone(), port));

    if let Socks5Behavior::Reject(code) = behavior {
        client.write_all(&[5, code, 0, 1, 0, 0, 0, 0, 0, 0]).await?;
        return Ok(());
    }

    let mut upstream = match TcpStream::connect((host.as_str(), port)).await {
        Ok(upstream) => upstream,
        Err(_) => {
            client.write_all(&[5, 0x05, 0, 1, 0, 0, 0, 0, 0, 0]).await?;
            return Ok(());
        }
    };
    client.write_all(&[5, 0, 0, 1, 127, 0, 0, 1, 0, 0]).await?;
    copy_bidirectional(&mut client, &mut upstream).await?;
    Ok(())
}

pub async fn spawn_socks4() -> ProxyServer {
    let listener = bind().await;
    let addr = listener.local_addr().expect("Failed to read listener address");
    let requested = Arc::new(Mutex::new(Vec::new()));
    let accepted = Arc::new(AtomicUsize::new(0));

    let log = requested.clone();
    let count = accepted.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            count.fetch_add(1, Ordering::SeqCst);
            let log = log.clone();
            tokio::spawn(async move {
                let _ = serve_socks4(socket, log).await;
            });
        }
    });

    ProxyServer {
        addr,
        requested,
        accepted,
    }
}

async fn serve_socks4(client: TcpStream, log: Arc<Mutex<Vec<Requested>>>) -> std::io::Result<()> {
    let mut reader = BufReader::new(client);
    let mut head = [0u8; 8];
    reader.read_exact(&mut head).await?;
    let port = u16::from_be_bytes([head[2], head[3]]);
    let ip = Ipv4Addr::new(head[4], head[5], head[6], head[7]);

    let mut user_id = Vec::new();
    reader.read_until(0, &mut user_id).await?;

    let host = if head[4..7] == [0, 0, 0] && head[7] != 0 {
        let mut name = Vec::new();
        reader.read_until(0, &mut name).await?;
        name.pop();
        String::from_utf8_lossy(&name).into_owned()
    } else {
        ip.to_string()
    };
    log.lock()
        .expect("Failed to lock request log")
        .push(Requested::new(host.clone(), port));

    let mut client = reader.into_inner();
    let mut upstream = match TcpStream::connect((host.as_str(), port)).await {
        Ok(upstream) => upstream,
        Err(_) => {
            client.write_all(&[0, 0x5B, 0, 0, 0, 0, 0, 0]).await?;
            return Ok(());
        }
    };
    client.write_all(&[0, 0x5A, 0, 0, 0, 0, 0, 0]).await?;
    copy_bidirectional(&mut client, &mut upstream).await?;
    Ok(())
}

/// HTTP forward proxy answering `CONNECT`, recording each request head.
pub struct ConnectProxy {
    pub addr: SocketAddr,
    heads: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ConnectProxy {
    pub fn heads(&self) -> Vec<Vec<String>> {
        self.heads.lock().expect("Failed to lock request log").clone()
    }
}

pub async fn spawn_connect_proxy() -> ConnectProxy {
    let listener = bind().await;
    let addr = listener.local_addr().expect("Failed to read listener address");
    let heads = Arc::new(Mutex::new(Vec::new()));

    let log = heads.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let log = log.clone();
            tokio::spawn(async move {
                let _ = serve_connect(socket, log).await;
            });
        }
    });

    ConnectProxy { addr, heads }
}

async fn serve_connect<S>(client: S, log: Arc<Mutex<Vec<Vec<String>>>>) -> std::io::Result<()>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin,
{
    let mut reader = BufReader::new(client);
    let mut head = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 || line == "\r\n" {
            break;
        }
        head.push(line.trim_end().to_string());
    }

    let authority = head
        .first()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or_default()
        .to_string();
    log.lock().expect("Failed to lock request log").push(head);

    let mut client = reader.into_inner();
    let mut upstream = match TcpStream::connect(authority.as_str()).await {
        Ok(upstream) => upstream,
        Err(_) => {
            client.write_all(b"HTTP/1.1 502 Bad Gateway\r\n\r\n").await?;
            return Ok(());
        }
    };
    client
        .write_all(b"HTTP/1.1 200 Connection established\r\n\r\n")
        .await?;
    copy_bidirectional(&mut client, &mut upstream).await?;
    Ok(())
}

/// Echoes every byte back; counts accepted connections.
pub async fn spawn_echo() -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = bind().await;
    let addr = listener.local_addr().expect("Failed to read listener address");
    let accepted = Arc::new(AtomicUsize::new(0));

    let count = accepted.clone();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            count.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let (mut read, mut write) = socket.split();
                let _ = tokio::io::copy(&mut read, &mut write).await;
            });
        }
    });

    (addr, accepted)
}

/// TLS echo server with a self-signed certificate for `localhost`.
pub struct TlsServer {
    pub addr: SocketAddr,
    pub certificate_pem: String,
    handshakes: Arc<AtomicUsize>,
}

impl TlsServer {
    pub fn handshakes(&self) -> usize {
        self.handshakes.load(Ordering::SeqCst)
    }
}

fn self_signed_acceptor(alpn: &[&[u8]]) -> (TlsAcceptor, String) {
    let params = rcgen::CertificateParams::new(vec!["localhost".to_string()])
        .expect("Failed to create certificate params");
    let key_pair = rcgen::KeyPair::generate().expect("Failed to generate key pair");
    let cert = params
        .self_signed(&key_pair)
        .expect("Failed to self-sign certificate");

    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));
    let mut config = ServerConfig::builder_with_provider(Arc::new(ring::default_provider()))
        .with_safe_default_protocol_versions()
        .expect("Failed to select protocol versions")
        .with_no_client_auth()
        .with_single_cert(vec![cert.der().clone()], key)
        .expect("Failed to build server config");
    config.alpn_protocols = alpn.iter().map(|p| p.to_vec()).collect();

    (TlsAcceptor::from(Arc::new(config)), cert.pem())
}

pub async fn spawn_tls_echo(alpn: &[&[u8]]) -> TlsServer {
    let (acceptor, certificate_pem) = self_signed_acceptor(alpn);

    let listener = bind().await;
    let addr = listener.local_addr().expect("Failed to read listener address");
    let handshakes = Arc::new(AtomicUsize::new(0));

    let count = handshakes.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let count = count.clone();
            tokio::spawn(async move {
                if let Ok(stream) = acceptor.accept(socket).await {
                    count.fetch_add(1, Ordering::SeqCst);
                    let (mut read, mut write) = tokio::io::split(stream);
                    let _ = tokio::io::copy(&mut read, &mut write).await;
                }
            });
        }
    });

    TlsServer {
        addr,
        certificate_pem,
        handshakes,
    }
}

/// `CONNECT` proxy reached over TLS, recording the ALPN protocol each client
/// negotiated with it.
pub struct TlsConnectProxy {
    pub addr: SocketAddr,
    pub certificate_pem: String,
    heads: Arc<Mutex<Vec<Vec<String>>>>,
    alpn: Arc<Mutex<Vec<Option<Vec<u8>>>>>,
}

impl TlsConnectProxy {
    pub fn heads(&self) -> Vec<Vec<String>> {
        self.heads.lock().expect("Failed to lock request log").clone()
    }

    pub fn negotiated_alpn(&self) -> Vec<Option<Vec<u8>>> {
        self.alpn.lock().expect("Failed to lock ALPN log").clone()
    }
}

pub async fn spawn_tls_connect_proxy(alpn: &[&[u8]]) -> TlsConnectProxy {
    let (acceptor, certificate_pem) = self_signed_acceptor(alpn);

    let listener = bind().await;
    let addr = listener.local_addr().expect("Failed to read listener address");
    let heads = Arc::new(Mutex::new(Vec::new()));
    let negotiated = Arc::new(Mutex::new(Vec::new()));

    let (log, alpn_log) = (heads.clone(), negotiated.clone());
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            let (log, alpn_log) = (log.clone(), alpn_log.clone());
            tokio::spawn(async move {
                let Ok(stream) = acceptor.accept(socket).await else {
                    return;
                };
                let protocol = stream.get_ref().1.alpn_protocol().map(<[u8]>::to_vec);
                alpn_log.lock().expect("Failed to lock ALPN log").push(protocol);
                let _ = serve_connect(stream, log).await;
            });
        }
    });

    TlsConnectProxy {
        addr,
        certificate_pem,
        heads,
        alpn: negotiated,
    }
}

/// Write `payload` and read the same number of bytes back.
pub async fn round_trip<S>(stream: &mut S, payload: &[u8]) -> Vec<u8>
where
    S: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin + ?Sized,
{
    stream.write_all(payload).await.expect("Failed to write payload");
    stream.flush().await.expect("Failed to flush payload");
    let mut echoed = vec![0u8; payload.len()];
    stream
        .read_exact(&mut echoed)
        .await
        .expect("Failed to read echoed payload");
    echoed
}
