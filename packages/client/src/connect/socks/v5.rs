//! SOCKS5 client handshake (RFC 1928, RFC 1929)

use bytes::BufMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::errors::{Reply, SocksError};
use crate::connect::TargetAddr;
use crate::proxy::SocksAuth;

const SOCKS_VERSION: u8 = 0x05;
const CMD_CONNECT: u8 = 0x01;

const METHOD_NO_AUTH: u8 = 0x00;
const METHOD_USER_PASS: u8 = 0x02;
const METHOD_NO_ACCEPTABLE: u8 = 0xFF;

const USER_PASS_VERSION: u8 = 0x01;

const ATYP_IPV4: u8 = 0x01;
const ATYP_DOMAIN: u8 = 0x03;
const ATYP_IPV6: u8 = 0x04;

/// Ask the SOCKS5 server at the other end of `stream` to connect to
/// `destination`. On success the stream carries the tunneled connection.
pub async fn connect<S>(
    stream: &mut S,
    destination: &TargetAddr,
    auth: &SocksAuth,
) -> Result<(), SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // encode first so an oversized domain fails before any bytes are sent
    let request = connect_request(destination)?;

    negotiate_method(stream, auth).await?;

    stream.write_all(&request).await?;
    stream.flush().await?;

    // +----+-----+-------+------+----------+----------+
    // |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
    // +----+-----+-------+------+----------+----------+
    // | 1  |  1  | X'00' |  1   | Variable |    2     |
    // +----+-----+-------+------+----------+----------+
    let mut header = [0u8; 4];
    stream.read_exact(&mut header).await?;
    expect_version(header[0])?;

    if header[1] != 0x00 {
        return Err(SocksError::Rejected(Reply::from_code(header[1])));
    }

    // bound address is of no use to a client, but must be drained
    let remaining = match header[3] {
        ATYP_IPV4 => 4 + 2,
        ATYP_IPV6 => 16 + 2,
        ATYP_DOMAIN => usize::from(stream.read_u8().await?) + 2,
        other => return Err(SocksError::UnknownAddressType(other)),
    };
    let mut bound = vec![0u8; remaining];
    stream.read_exact(&mut bound).await?;

    tracing::trace!(
        target: "proxychain::socks",
        %destination,
        "SOCKS5 connect granted"
    );

    Ok(())
}

async fn negotiate_method<S>(stream: &mut S, auth: &SocksAuth) -> Result<(), SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // +----+----------+----------+
    // |VER | NMETHODS | METHODS  |
    // +----+----------+----------+
    let greeting: &[u8] = match auth {
        SocksAuth::None => &[SOCKS_VERSION, 1, METHOD_NO_AUTH],
        SocksAuth::UsernamePassword { .. } => {
            &[SOCKS_VERSION, 2, METHOD_NO_AUTH, METHOD_USER_PASS]
        }
    };
    stream.write_all(greeting).await?;
    stream.flush().await?;

    let mut choice = [0u8; 2];
    stream.read_exact(&mut choice).await?;
    expect_version(choice[0])?;

    match (choice[1], auth) {
        (METHOD_NO_AUTH, _) => Ok(()),
        (METHOD_USER_PASS, SocksAuth::UsernamePassword { username, password }) => {
            authenticate(stream, username, password).await
        }
        (METHOD_NO_ACCEPTABLE, _) => Err(SocksError::NoAcceptableAuth),
        (other, _) => Err(SocksError::UnexpectedAuthMethod(other)),
    }
}

async fn authenticate<S>(stream: &mut S, username: &str, password: &str) -> Result<(), SocksError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    // +----+------+----------+------+----------+
    // |VER | ULEN |  UNAME   | PLEN |  PASSWD  |
    // +----+------+----------+------+----------+
    // | 1  |  1   | 1 to 255 |  1   | 1 to 255 |
    // +----+------+----------+------+----------+
    let mut packet = Vec::with_capacity(3 + username.len() + password.len());
    packet.put_u8(USER_PASS_VERSION);
    packet.put_u8(length_byte(username)?);
    packet.put_slice(username.as_bytes());
    packet.put_u8(length_byte(password)?);
    packet.put_slice(password.as_bytes());

    stream.write_all(&packet).await?;
    stream.flush().await?;

    let mut status = [0u8; 2];
    stream.read_exact(&mut status).await?;
    if status[1] != 0x00 {
        return Err(SocksError::AuthenticationFailed(status[1]));
    }
    Ok(())
}

fn connect_request(destination: &TargetAddr) -> Result<Vec<u8>, SocksError> {
    // +----+-----+-------+------+----------+----------+
    // |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
    // +----+-----+-------+------+----------+----------+
    // | 1  |  1  | X'00' |  1   | Variable |    2     |
    // +----+-----+-------+------+----------+----------+
    let mut request = Vec::with_capacity(22);
    request.put_slice(&[SOCKS_VERSION, CMD_CONNECT, 0x00]);

    match destination {
        TargetAddr::Ip(addr) => match addr.ip() {
            std::net::IpAddr::V4(ip) => {
                request.put_u8(ATYP_IPV4);
                request.put_slice(&ip.octets());
            }
            std::net::IpAddr::V6(ip) => {
                request.put_u8(ATYP_IPV6);
                request.put_slice(&ip.octets());
            }
        },
        TargetAddr::Domain(domain, _) => {
            let len = u8::try_from(domain.len())
                .map_err(|_| SocksError::DomainTooLong(domain.clone()))?;
            request.put_u8(ATYP_DOMAIN);
            request.put_u8(len);
            request.put_slice(domain.as_bytes());
        }
    }

    request.put_u16(destination.port());
    Ok(request)
}

fn length_byte(value: &str) -> Result<u8, SocksError> {
    u8::try_from(value.len()).map_err(|_| {
        SocksError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "SOCKS5 credentials are limited to 255 bytes",
        ))
    })
}

fn expect_version(received: u8) -> Result<(), SocksError> {
    if received == SOCKS_VERSION {
        Ok(())
    } else {
        Err(SocksError::UnexpectedProtocolVersion {
            expected: SOCKS_VERSION,
            received,
        })
    }
}
