//! HTTP CONNECT tunnel establishment
//!
//! Opens a tunnel through an HTTP forward proxy. Works over any async stream
//! so the proxy itself may sit behind TLS.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::target::TargetAddr;

/// Upper bound on the proxy's response head.
const MAX_RESPONSE_HEAD: usize = 8 * 1024;

#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("failed IO operation: {0}")]
    Io(#[from] std::io::Error),
    #[error("proxy refused CONNECT with status {code} {reason}")]
    Status { code: u16, reason: String },
    #[error("malformed CONNECT response: {0}")]
    Malformed(String),
    #[error("CONNECT response head exceeds {MAX_RESPONSE_HEAD} bytes")]
    HeadersTooLarge,
}

impl TunnelError {
    /// Status code of a refused tunnel.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            TunnelError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// `Basic` credential value for a `Proxy-Authorization` header.
#[must_use]
pub fn basic_auth(username: &str, password: &str) -> String {
    format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
}

/// Ask the proxy on `stream` to open a tunnel to `target`. `authorization`
/// is sent verbatim as the `Proxy-Authorization` value.
pub async fn establish_connect_tunnel<S>(
    stream: &mut S,
    target: &TargetAddr,
    authorization: Option<&str>,
) -> Result<(), TunnelError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let authority = target.to_string();
    let mut request = format!("CONNECT {authority} HTTP/1.1\r\nHost: {authority}\r\n");
    if let Some(value) = authorization {
        request.push_str("Proxy-Authorization: ");
        request.push_str(value);
        request.push_str("\r\n");
    }
    request.push_str("\r\n");

    stream.write_all(request.as_bytes()).await?;
    stream.flush().await?;

    // byte-at-a-time so nothing past the head is consumed from the tunnel
    let mut head = Vec::with_capacity(256);
    while !head.ends_with(b"\r\n\r\n") {
        if head.len() >= MAX_RESPONSE_HEAD {
            return Err(TunnelError::HeadersTooLarge);
        }
        head.push(stream.read_u8().await?);
    }

    let head = String::from_utf8_lossy(&head);
    let status_line = head.lines().next().unwrap_or_default();
    let (code, reason) = parse_status_line(status_line)?;

    if !(200..300).contains(&code) {
        return Err(TunnelError::Status { code, reason });
    }

    tracing::debug!(
        target: "proxychain::connect",
        %target,
        status = code,
        "CONNECT tunnel established"
    );

    Ok(())
}

fn parse_status_line(line: &str) -> Result<(u16, String), TunnelError> {
    let mut parts = line.splitn(3, ' ');
    let version = parts.next().unwrap_or_default();
    if !version.starts_with("HTTP/1.") {
        return Err(TunnelError::Malformed(line.to_string()));
    }
    let code = parts
        .next()
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or_else(|| TunnelError::Malformed(line.to_string()))?;
    let reason = parts.next().unwrap_or_default().trim().to_string();
    Ok((code, reason))
}
