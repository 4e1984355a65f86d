//! UDP server (`udps:`), client (`udpc:`) and broadcast (`udpb:`) connectors.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;

use crate::consts::{UDP_PEER_QUEUE_CAPACITY, UDP_RECV_BUFFER_SIZE};
use crate::error::Result;
use crate::utils::{Closer, MpscReader, MpscWriter, UdpRW};

use super::super::channel::{Channel, ChannelTimeouts, OutgoingSender};
use super::super::event::EventSender;
use super::super::ids::ConnectionId;
use super::super::info::{ChannelDetails, ChannelInfo};
use super::Connector;

/// `udps:<addr>` — listens for datagrams, demultiplexing by peer address into one channel
/// each. A UDP socket has no notion of "accept", so every new source address seen on the
/// shared socket gets its own [`mpsc`]-backed pseudo-stream.
pub struct UdpServer {
    bind_addr: SocketAddr,
}

impl UdpServer {
    /// Creates a server connector bound to `bind_addr`.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self { bind_addr }
    }
}

#[async_trait]
impl Connector for UdpServer {
    async fn run(
        &self,
        connection: ConnectionId,
        outgoing: OutgoingSender,
        events: EventSender,
        closer: Closer,
        timeouts: ChannelTimeouts,
    ) -> Result<()> {
        let bind_addr = self.bind_addr;
        let socket = Arc::new(UdpSocket::bind(bind_addr).await?);

        let mut peers: HashMap<SocketAddr, mpsc::Sender<Vec<u8>>> = HashMap::new();
        let mut buf = [0u8; UDP_RECV_BUFFER_SIZE];

        loop {
            let (len, peer_addr) = tokio::select! {
                _ = closer.cancelled() => return Ok(()),
                received = socket.recv_from(&mut buf) => received?,
            };

            if let Some(peer_tx) = peers.get(&peer_addr) {
                if peer_tx.send(buf[..len].to_vec()).await.is_ok() {
                    continue;
                }
                peers.remove(&peer_addr);
            }

            let (peer_tx, peer_rx) = mpsc::channel(UDP_PEER_QUEUE_CAPACITY);
            let (reply_tx, mut reply_rx) = mpsc::channel::<Vec<u8>>(UDP_PEER_QUEUE_CAPACITY);

            let _ = peer_tx.send(buf[..len].to_vec()).await;
            peers.insert(peer_addr, peer_tx);

            let reply_socket = socket.clone();
            let reply_closer = closer.child_token();
            tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = reply_closer.cancelled() => return,
                        data = reply_rx.recv() => match data {
                            Some(data) => {
                                if reply_socket.send_to(&data, peer_addr).await.is_err() {
                                    return;
                                }
                            }
                            None => return,
                        },
                    }
                }
            });

            let details = ChannelDetails::UdpServer {
                bind_addr,
                peer_addr,
            };
            let channel = Channel::with_timeouts(
                ChannelInfo::new(connection, details),
                MpscReader::new(peer_rx),
                MpscWriter::new(reply_tx),
                outgoing.subscribe(),
                events.clone(),
                closer.child_token(),
                timeouts,
            );
            channel.spawn().await;
        }
    }
}

/// `udpc:<addr>` — connects to a fixed remote address from an OS-assigned local port.
pub struct UdpClient {
    remote_addr: SocketAddr,
}

impl UdpClient {
    /// Creates a client connector targeting `remote_addr`.
    pub fn new(remote_addr: SocketAddr) -> Self {
        Self { remote_addr }
    }
}

#[async_trait]
impl Connector for UdpClient {
    async fn run(
        &self,
        connection: ConnectionId,
        outgoing: OutgoingSender,
        events: EventSender,
        closer: Closer,
        timeouts: ChannelTimeouts,
    ) -> Result<()> {
        let remote_addr = self.remote_addr;
        let any_addr: SocketAddr = if remote_addr.is_ipv6() {
            "[::]:0".parse().unwrap()
        } else {
            "0.0.0.0:0".parse().unwrap()
        };

        let socket = UdpSocket::bind(any_addr).await?;
        socket.connect(remote_addr).await?;
        let bind_addr = socket.local_addr()?;

        let rw = UdpRW::new(socket);
        let details = ChannelDetails::UdpClient {
            remote_addr,
            bind_addr,
        };
        let channel = Channel::with_timeouts(
            ChannelInfo::new(connection, details),
            rw.clone(),
            rw,
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

/// `udpb:<addr>` — a UDP client with `SO_BROADCAST` set, for sending to a subnet broadcast
/// address such as `255.255.255.255:14550`.
pub struct UdpBroadcast {
    broadcast_addr: SocketAddr,
}

impl UdpBroadcast {
    /// Creates a broadcast connector targeting `broadcast_addr`.
    pub fn new(broadcast_addr: SocketAddr) -> Self {
        Self { broadcast_addr }
    }
}

#[async_trait]
impl Connector for UdpBroadcast {
    async fn run(
        &self,
        connection: ConnectionId,
        outgoing: OutgoingSender,
        events: EventSender,
        closer: Closer,
        timeouts: ChannelTimeouts,
    ) -> Result<()> {
        let broadcast_addr = self.broadcast_addr;
        let any_addr: SocketAddr = if broadcast_addr.is_ipv6() {
            "[::]:0".parse().unwrap()
        } else {
            "0.0.0.0:0".parse().unwrap()
        };

        let socket = UdpSocket::bind(any_addr).await?;
        socket.set_broadcast(true)?;
        socket.connect(broadcast_addr).await?;
        let bind_addr = socket.local_addr()?;

        let rw = UdpRW::new(socket);
        let details = ChannelDetails::UdpBroadcast {
            broadcast_addr,
            bind_addr,
        };
        let channel = Channel::with_timeouts(
            ChannelInfo::new(connection, details),
            rw.clone(),
            rw,
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
