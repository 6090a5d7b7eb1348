use std::fmt;
use std::io;
use std::net::SocketAddr;

use thiserror::Error;

/// Reply codes a SOCKS5 server uses to refuse a request (RFC 1928 §6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    SocksServerFail,
    ConnNotAllowed,
    NetUnreachable,
    HostUnreachable,
    ConnRefused,
    TtlExpired,
    CmdNotSupported,
    AddrTypeNotSupported,
    Unassigned(u8),
}

impl Reply {
    pub(crate) fn from_code(code: u8) -> Self {
        match code {
            0x01 => Reply::SocksServerFail,
            0x02 => Reply::ConnNotAllowed,
            0x03 => Reply::NetUnreachable,
            0x04 => Reply::HostUnreachable,
            0x05 => Reply::ConnRefused,
            0x06 => Reply::TtlExpired,
            0x07 => Reply::CmdNotSupported,
            0x08 => Reply::AddrTypeNotSupported,
            other => Reply::Unassigned(other),
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::SocksServerFail => f.write_str("general SOCKS server failure"),
            Reply::ConnNotAllowed => f.write_str("connection not allowed by ruleset"),
            Reply::NetUnreachable => f.write_str("network unreachable"),
            Reply::HostUnreachable => f.write_str("host unreachable"),
            Reply::ConnRefused => f.write_str("connection refused"),
            Reply::TtlExpired => f.write_str("TTL expired"),
            Reply::CmdNotSupported => f.write_str("command not supported"),
            Reply::AddrTypeNotSupported => f.write_str("address type not supported"),
            Reply::Unassigned(code) => write!(f, "unassigned reply code {code:#04x}"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SocksError {
    #[error("failed IO operation: {0}")]
    Io(#[from] io::Error),
    #[error("expected SOCKS version {expected} in reply, but received {received:#04x}")]
    UnexpectedProtocolVersion { expected: u8, received: u8 },
    #[error("SOCKS5 server accepted none of the offered authentication methods")]
    NoAcceptableAuth,
    #[error("SOCKS5 server selected authentication method {0:#04x} which was not offered")]
    UnexpectedAuthMethod(u8),
    #[error("SOCKS5 username/password authentication rejected (status {0:#04x})")]
    AuthenticationFailed(u8),
    #[error("SOCKS5 request rejected: {0}")]
    Rejected(Reply),
    #[error("SOCKS4 request rejected with code {0:#04x}")]
    Socks4Rejected(u8),
    #[error("unknown address type {0:#04x} in SOCKS5 reply")]
    UnknownAddressType(u8),
    #[error("domain name `{0}` is longer than 255 bytes")]
    DomainTooLong(String),
    #[error("SOCKS4 cannot reach IPv6 destination {0}")]
    Ipv6Unsupported(SocketAddr),
}

impl SocksError {
    /// Reply code carried by a SOCKS5 rejection.
    #[must_use]
    pub fn reply(&self) -> Option<Reply> {
        match self {
            SocksError::Rejected(reply) => Some(*reply),
            _ => None,
        }
    }
}
