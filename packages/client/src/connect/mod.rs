//! Connection establishment
//!
//! Direct dialing, SOCKS chain walking, HTTP CONNECT tunneling and the TLS
//! upgrade for https targets.

pub mod chain;
pub mod dial;
pub mod forward;
pub mod http_connect;
pub mod request;
pub mod socks;
pub mod stream;
pub mod target;

pub use chain::ChainConnector;
pub use dial::{Dial, TcpDialer, Transport};
pub use forward::ForwardConnector;
pub use http_connect::{TunnelError, basic_auth, establish_connect_tunnel};
pub use request::{ConnectRequest, Scheme, resolve_port};
pub use socks::{Reply, SocksError};
pub use stream::{BoxedIo, Io, ProxyStream};
pub use target::TargetAddr;
