//! Addressing for outbound frames.

use std::sync::Arc;

use super::ids::{ChannelId, ConnectionId};
use crate::protocol::Frame;

/// Which channels an [`OutgoingFrame`] should actually be written to.
///
/// Mirrors the three forwarding primitives the router needs: broadcast to everyone, broadcast
/// to everyone except the origin, and unicast to exactly one learned destination.
#[derive(Copy, Clone, Debug)]
pub enum BroadcastScope {
    /// Write to every channel on every connection.
    All,
    /// Write to every channel except those belonging to one connection (the frame's origin).
    ExceptConnection(ConnectionId),
    /// Write to every channel except one specific channel (the frame's origin).
    ExceptChannel(ChannelId),
    /// Write only to one specific channel (a learned unicast destination).
    ExactChannel(ChannelId),
}

impl BroadcastScope {
    /// Whether a frame carrying this scope should be written to `channel`.
    pub fn should_send_to(&self, channel: ChannelId) -> bool {
        match self {
            BroadcastScope::All => true,
            BroadcastScope::ExceptConnection(origin) => channel.connection() != *origin,
            BroadcastScope::ExceptChannel(origin) => channel != *origin,
            BroadcastScope::ExactChannel(target) => channel == *target,
        }
    }
}

/// A frame paired with instructions on where it should be written.
///
/// The frame is wrapped in an [`Arc`] since one outgoing frame is typically fanned out to many
/// channel write queues at once.
#[derive(Clone, Debug)]
pub struct OutgoingFrame {
    frame: Arc<Frame>,
    scope: BroadcastScope,
}

impl OutgoingFrame {
    /// Pairs a frame with its broadcast scope.
    pub fn new(frame: Arc<Frame>, scope: BroadcastScope) -> Self {
        Self { frame, scope }
    }

    /// The frame to send.
    pub fn frame(&self) -> &Frame {
        &self.frame
    }

    /// Whether this frame should be written to `channel`.
    pub fn should_send_to(&self, channel: ChannelId) -> bool {
        self.scope.should_send_to(channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chan(conn: ConnectionId) -> ChannelId {
        ChannelId::new(conn)
    }

    #[test]
    fn all_reaches_every_channel() {
        let conn = ConnectionId::new();
        assert!(BroadcastScope::All.should_send_to(chan(conn)));
    }

    #[test]
    fn except_channel_skips_only_the_origin() {
        let conn = ConnectionId::new();
        let origin = chan(conn);
        let other = chan(conn);
        let scope = BroadcastScope::ExceptChannel(origin);
        assert!(!scope.should_send_to(origin));
        assert!(scope.should_send_to(other));
    }

    #[test]
    fn exact_channel_reaches_only_the_target() {
        let conn = ConnectionId::new();
        let target = chan(conn);
        let other = chan(conn);
        let scope = BroadcastScope::ExactChannel(target);
        assert!(scope.should_send_to(target));
        assert!(!scope.should_send_to(other));
    }

    #[test]
    fn except_connection_skips_every_channel_on_that_connection() {
        let origin_conn = ConnectionId::new();
        let other_conn = ConnectionId::new();
        let scope = BroadcastScope::ExceptConnection(origin_conn);
        assert!(!scope.should_send_to(chan(origin_conn)));
        assert!(!scope.should_send_to(chan(origin_conn)));
        assert!(scope.should_send_to(chan(other_conn)));
    }
}
