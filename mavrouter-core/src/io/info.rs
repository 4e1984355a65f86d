//! Human-readable descriptions of connections and channels, used for logging.

use std::net::SocketAddr;
use std::path::PathBuf;

use super::ids::{ChannelId, ConnectionId};

/// Static description of an endpoint as configured on the command line.
#[derive(Clone, Debug)]
pub enum ConnectionDetails {
    /// `serial:<path>:<baud>`
    Serial { path: String, baud_rate: u32 },
    /// `udps:<addr>` — UDP server, one channel per distinct peer address.
    UdpServer { bind_addr: SocketAddr },
    /// `udpc:<addr>` — UDP client connecting to a fixed remote address.
    UdpClient { remote_addr: SocketAddr },
    /// `udpb:<addr>` — UDP broadcast, a client with `SO_BROADCAST` set.
    UdpBroadcast { broadcast_addr: SocketAddr },
    /// `tcps:<addr>` — TCP server, one channel per accepted connection.
    TcpServer { bind_addr: SocketAddr },
    /// `tcpc:<addr>` — TCP client connecting to a fixed remote address.
    TcpClient { remote_addr: SocketAddr },
    /// `tlog:<path>` — append-only frame dump, write-only.
    TlogFile { path: PathBuf },
}

impl std::fmt::Display for ConnectionDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionDetails::Serial { path, baud_rate } => {
                write!(f, "serial:{path}:{baud_rate}")
            }
            ConnectionDetails::UdpServer { bind_addr } => write!(f, "udps:{bind_addr}"),
            ConnectionDetails::UdpClient { remote_addr } => write!(f, "udpc:{remote_addr}"),
            ConnectionDetails::UdpBroadcast { broadcast_addr } => {
                write!(f, "udpb:{broadcast_addr}")
            }
            ConnectionDetails::TcpServer { bind_addr } => write!(f, "tcps:{bind_addr}"),
            ConnectionDetails::TcpClient { remote_addr } => write!(f, "tcpc:{remote_addr}"),
            ConnectionDetails::TlogFile { path } => write!(f, "tlog:{}", path.display()),
        }
    }
}

/// Static description of a connection: its identity plus its configuration.
#[derive(Clone, Debug)]
pub struct ConnectionInfo {
    id: ConnectionId,
    details: ConnectionDetails,
}

impl ConnectionInfo {
    /// Creates a new connection info, minting a fresh [`ConnectionId`].
    pub fn new(details: ConnectionDetails) -> Self {
        Self {
            id: ConnectionId::new(),
            details,
        }
    }

    /// This connection's identifier.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// This connection's static configuration.
    pub fn details(&self) -> &ConnectionDetails {
        &self.details
    }
}

impl std::fmt::Display for ConnectionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.details)
    }
}

/// Runtime description of an individual channel, once a socket/stream/file is actually open.
#[derive(Clone, Debug)]
pub enum ChannelDetails {
    Serial { path: String, baud_rate: u32 },
    UdpServer {
        bind_addr: SocketAddr,
        peer_addr: SocketAddr,
    },
    UdpClient {
        remote_addr: SocketAddr,
        bind_addr: SocketAddr,
    },
    UdpBroadcast {
        broadcast_addr: SocketAddr,
        bind_addr: SocketAddr,
    },
    TcpServer {
        bind_addr: SocketAddr,
        peer_addr: SocketAddr,
    },
    TcpClient {
        remote_addr: SocketAddr,
        bind_addr: SocketAddr,
    },
    TlogFile { path: PathBuf },
}

impl std::fmt::Display for ChannelDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelDetails::Serial { path, baud_rate } => write!(f, "serial:{path}:{baud_rate}"),
            ChannelDetails::UdpServer { peer_addr, .. } => write!(f, "udps:peer={peer_addr}"),
            ChannelDetails::UdpClient { remote_addr, .. } => write!(f, "udpc:{remote_addr}"),
            ChannelDetails::UdpBroadcast { broadcast_addr, .. } => {
                write!(f, "udpb:{broadcast_addr}")
            }
            ChannelDetails::TcpServer { peer_addr, .. } => write!(f, "tcps:peer={peer_addr}"),
            ChannelDetails::TcpClient { remote_addr, .. } => write!(f, "tcpc:{remote_addr}"),
            ChannelDetails::TlogFile { path } => write!(f, "tlog:{}", path.display()),
        }
    }
}

/// Runtime description of a channel: its identity plus what it is actually connected to.
#[derive(Clone, Debug)]
pub struct ChannelInfo {
    id: ChannelId,
    details: ChannelDetails,
}

impl ChannelInfo {
    /// Creates a new channel info, minting a fresh [`ChannelId`] scoped to `connection`.
    pub fn new(connection: ConnectionId, details: ChannelDetails) -> Self {
        Self {
            id: ChannelId::new(connection),
            details,
        }
    }

    /// This channel's identifier.
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// What this channel is actually connected to.
    pub fn details(&self) -> &ChannelDetails {
        &self.details
    }
}

impl std::fmt::Display for ChannelInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.details)
    }
}
