//! Opaque identifiers for connections and channels.

use crate::utils::UniqueId;

/// Identifies a single endpoint (one `--endpoint` CLI argument) for its whole lifetime,
/// including across reconnects.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ConnectionId(UniqueId);

impl ConnectionId {
    /// Creates a new, process-unique connection identifier.
    pub fn new() -> Self {
        Self(UniqueId::new())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ConnectionId({:?})", self.0)
    }
}

/// Identifies a single socket/stream/file instance underneath a connection.
///
/// A TCP or UDP server connection may spawn many channels (one per accepted peer) over its
/// lifetime; a serial or client connection has exactly one channel at a time, recreated on
/// every reconnect.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct ChannelId {
    connection: ConnectionId,
    channel: UniqueId,
}

impl ChannelId {
    /// Creates a new channel identifier scoped to the given connection.
    pub fn new(connection: ConnectionId) -> Self {
        Self {
            connection,
            channel: UniqueId::new(),
        }
    }

    /// The connection this channel belongs to.
    pub fn connection(&self) -> ConnectionId {
        self.connection
    }
}

impl std::fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ChannelId({:?}.{:?})", self.connection.0, self.channel)
    }
}
