//! One [`Connector`] implementation per endpoint kind.

#[cfg(feature = "serial")]
mod serial;
mod tcp;
mod tlog;
mod udp;

#[cfg(feature = "serial")]
pub use serial::SerialPort;
pub use tcp::{TcpClient, TcpServer};
pub use tlog::TlogFile;
pub use udp::{UdpBroadcast, UdpClient, UdpServer};

pub use super::endpoint::Connector;
