//! TCP server (`tcps:`) and client (`tcpc:`) connectors.

use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};

use crate::error::Result;
use crate::utils::Closer;

use super::super::channel::{Channel, ChannelTimeouts, OutgoingSender};
use super::super::event::EventSender;
use super::super::ids::ConnectionId;
use super::super::info::{ChannelDetails, ChannelInfo};
use super::Connector;

/// `tcps:<addr>` — accepts connections, one channel per accepted peer.
pub struct TcpServer {
    bind_addr: SocketAddr,
}

impl TcpServer {
    /// Creates a server connector bound to `bind_addr`.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self { bind_addr }
    }
}

#[async_trait]
impl Connector for TcpServer {
    async fn run(
        &self,
        connection: ConnectionId,
        outgoing: OutgoingSender,
        events: EventSender,
        closer: Closer,
        timeouts: ChannelTimeouts,
    ) -> Result<()> {
        let bind_addr = self.bind_addr;
        let listener = TcpListener::bind(bind_addr).await?;

        loop {
            let (stream, peer_addr) = tokio::select! {
                _ = closer.cancelled() => return Ok(()),
                accepted = listener.accept() => accepted?,
            };

            let (reader, writer) = stream.into_split();
            let details = ChannelDetails::TcpServer {
                bind_addr,
                peer_addr,
            };

            let channel = Channel::with_timeouts(
                ChannelInfo::new(connection, details),
                reader,
                writer,
                outgoing.subscribe(),
                events.clone(),
                closer.child_token(),
                timeouts,
            );
            channel.spawn().await;
        }
    }
}

/// `tcpc:<addr>` — connects to a fixed remote address, reconnecting per the endpoint's retry
/// policy.
pub struct TcpClient {
    remote_addr: SocketAddr,
}

impl TcpClient {
    /// Creates a client connector targeting `remote_addr`.
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self { remote_addr }
    }
}

#[async_trait]
impl Connector for TcpClient {
    async fn run(
        &self,
        connection: ConnectionId,
        outgoing: OutgoingSender,
        events: EventSender,
        closer: Closer,
        timeouts: ChannelTimeouts,
    ) -> Result<()> {
        let remote_addr = self.remote_addr;
        let stream = TcpStream::connect(remote_addr).await?;
        let bind_addr = stream.local_addr()?;
        let (reader, writer) = stream.into_split();

        let details = ChannelDetails::TcpClient {
            remote_addr,
            bind_addr,
        };
        let channel = Channel::with_timeouts(
            ChannelInfo::new(connection, details),
            reader,
            writer,
            outgoing.subscribe(),
            events,
            closer.child_token(),
            timeouts,
        );
        let channel_state = channel.spawn().await;
        channel_state.cancelled().await;

        Ok(())
    }
}
