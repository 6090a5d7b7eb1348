//! Loopback servers for dispatcher tests
#![allow(dead_code)]

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader, copy_bidirectional};
use tokio::net::{TcpListener, TcpStream};

pub type Log = Arc<Mutex<Vec<Vec<String>>>>;

async fn bind() -> TcpListener {
    TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind loopback listener")
}

async fn read_head<R: tokio::io::AsyncBufRead + Unpin>(reader: &mut R) -> std::io::Result<Vec<String>> {
    let mut head = Vec::new();
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 || line == "\r\n" {
            return Ok(head);
        }
        head.push(line.trim_end().to_string());
    }
}

fn log_of(log: &Log) -> Vec<Vec<String>> {
    log.lock().expect("Failed to lock request log").clone()
}

/// HTTP/1.1 origin answering every request with `200 ok`.
pub struct HttpServer {
    pub addr: SocketAddr,
    log: Log,
}

impl HttpServer {
    pub fn requests(&self) -> Vec<Vec<String>> {
        log_of(&self.log)
    }
}

pub async fn spawn_http() -> HttpServer {
    let listener = bind().await;
    let addr = listener.local_addr().expect("Failed to read listener address");
    let log: Log = Arc::default();

    let requests = log.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let requests = requests.clone();
            tokio::spawn(async move {
                let mut reader = BufReader::new(socket);
                if let Ok(head) = read_head(&mut reader).await {
                    requests.lock().expect("Failed to lock request log").push(head);
                    let _ = reader
                        .get_mut()
                        .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok")
                        .await;
                }
            });
        }
    });

    HttpServer { addr, log }
}

/// Accepts connections and never answers.
pub async fn spawn_silent() -> SocketAddr {
    let listener = bind().await;
    let addr = listener.local_addr().expect("Failed to read listener address");
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// No-auth SOCKS5 relay recording `host:port` destinations.
pub struct SocksServer {
    pub addr: SocketAddr,
    log: Log,
}

impl SocksServer {
    pub fn destinations(&self) -> Vec<String> {
        log_of(&self.log).into_iter().flatten().collect()
    }
}

pub async fn spawn_socks5() -> SocksServer {
    let listener = bind().await;
    let addr = listener.local_addr().expect("Failed to read listener address");
    let log: Log = Arc::default();

    let destinations = log.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let destinations = destinations.clone();
            tokio::spawn(async move {
                let _ = relay_socks5(socket, destinations).await;
            });
        }
    });

    SocksServer { addr, log }
}

async fn relay_socks5(mut client: TcpStream, log: Log) -> std::io::Result<()> {
    let mut greeting = [0u8; 2];
    client.read_exact(&mut greeting).await?;
    let mut methods = vec![0u8; usize::from(greeting[1])];
    client.read_exact(&mut methods).await?;
    client.write_all(&[5, 0]).await?;

    let mut request = [0u8; 4];
    client.read_exact(&mut request).await?;
    let host = match request[3] {
        0x01 => {
            let mut ip = [0u8; 4];
            client.read_exact(&mut ip).await?;
            Ipv4Addr::from(ip).to_string()
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
        .push(vec![format!("{host}:{port}")]);

    let mut upstream = TcpStream::connect((host.as_str(), port)).await?;
    client.write_all(&[5, 0, 0, 1, 127, 0, 0, 1, 0, 0]).await?;
    copy_bidirectional(&mut client, &mut upstream).await?;
    Ok(())
}

/// HTTP forward proxy answering `CONNECT`.
pub struct ConnectProxy {
    pub addr: SocketAddr,
    log: Log,
}

impl ConnectProxy {
    pub fn heads(&self) -> Vec<Vec<String>> {
        log_of(&self.log)
    }
}

pub async fn spawn_connect_proxy() -> ConnectProxy {
    let listener = bind().await;
    let addr = listener.local_addr().expect("Failed to read listener address");
    let log: Log = Arc::default();

    let heads = log.clone();
    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            let heads = heads.clone();
            tokio::spawn(async move {
                let mut reader = BufReader::new(socket);
                let Ok(head) = read_head(&mut reader).await else {
                    return;
                };
                let authority = head
                    .first()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or_default()
                    .to_string();
                heads.lock().expect("Failed to lock request log").push(head);

                let mut client = reader.into_inner();
                let Ok(mut upstream) = TcpStream::connect(authority.as_str()).await else {
                    let _ = client.write_all(b"HTTP/1.1 502 Bad Gateway\r\n\r\n").await;
                    return;
                };
                if client
                    .write_all(b"HTTP/1.1 200 Connection established\r\n\r\n")
                    .await
                    .is_ok()
                {
                    let _ = copy_bidirectional(&mut client, &mut upstream).await;
                }
            });
        }
    });

    ConnectProxy { addr, log }
}
