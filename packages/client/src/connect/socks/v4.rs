//! SOCKS4 / SOCKS4a client handshake

use std::net::{IpAddr, Ipv4Addr};

use bytes::BufMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::errors::SocksError;
use crate::connect::TargetAddr;
use crate::proxy::SocksAuth;

const SOCKS_VERSION: u8 = 0x04;
const CMD_CONNECT: u8 = 0x01;
const REQUEST_GRANTED: u8 = 0x5A;

/// 0.0.0.x with x != 0 tells a SOCKS4a server that a domain name follows.
const SOCKS4A_MARKER: Ipv4Addr = Ipv4Addr::new(0, 0, 0, 1);

/// Ask the SOCKS4 server at the other end of `stream` to connect to
/// `destination`. Domain destinations use the SOCKS4a extension; the
/// username of `auth`, if any, is sent as the user id.
pub async fn connect<S>(
    stream: &mut S,
    destination: &TargetAddr,
    auth: &SocksAuth,
) -> Result<(), SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let user_id = match auth {
        SocksAuth::None => "",
        SocksAuth::UsernamePassword { username, .. } => username.as_str(),
    };

    // +----+----+---------+--------+--------+------+
    // | VN | CD | DSTPORT | DSTIP  | USERID | NULL |
    // +----+----+---------+--------+--------+------+
    // | 1  | 1  |    2    |   4    |  var   |  1   |
    // +----+----+---------+--------+--------+------+
    let mut request = Vec::with_capacity(9 + user_id.len());
    request.put_u8(SOCKS_VERSION);
    request.put_u8(CMD_CONNECT);
    request.put_u16(destination.port());

    match destination {
        TargetAddr::Ip(addr) => match addr.ip() {
            IpAddr::V4(ip) => {
                request.put_slice(&ip.octets());
                request.put_slice(user_id.as_bytes());
                request.put_u8(0x00);
            }
            IpAddr::V6(_) => return Err(SocksError::Ipv6Unsupported(*addr)),
        },
        TargetAddr::Domain(domain, _) => {
            request.put_slice(&SOCKS4A_MARKER.octets());
            request.put_slice(user_id.as_bytes());
            request.put_u8(0x00);
            request.put_slice(domain.as_bytes());
            request.put_u8(0x00);
        }
    }

    stream.write_all(&request).await?;
    stream.flush().await?;

    // +----+----+---------+-------+
    // | VN | CD | DSTPORT | DSTIP |
    // +----+----+---------+-------+
    let mut response = [0u8; 8];
    stream.read_exact(&mut response).await?;

    if response[0] != 0x00 {
        return Err(SocksError::UnexpectedProtocolVersion {
            expected: 0x00,
            received: response[0],
        });
    }
    if response[1] != REQUEST_GRANTED {
        return Err(SocksError::Socks4Rejected(response[1]));
    }

    tracing::trace!(
        target: "proxychain::socks",
        %destination,
        "SOCKS4 connect granted"
    );

    Ok(())
}
