//! Adapts a connected [`UdpSocket`] into [`AsyncRead`]/[`AsyncWrite`].
//!
//! Unlike TCP, a [`UdpSocket`] has no `into_split`, so a client connector needs one handle
//! cloned into both halves of the channel's reader/writer pair.

use std::io::ErrorKind;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::UdpSocket;

/// A connected [`UdpSocket`], shared between the reading and writing halves of a channel.
#[derive(Clone)]
pub struct UdpRW {
    socket: Arc<UdpSocket>,
}

impl UdpRW {
    /// Wraps a socket that has already called [`UdpSocket::connect`].
    pub fn new(socket: UdpSocket) -> Self {
        Self {
            socket: Arc::new(socket),
        }
    }
}

impl AsyncRead for UdpRW {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.socket.try_recv_buf(buf) {
            Ok(_) => Poll::Ready(Ok(())),
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(err) => Poll::Ready(Err(err)),
        }
    }
}

impl AsyncWrite for UdpRW {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.socket.try_send(buf) {
            Ok(bytes_sent) => Poll::Ready(Ok(bytes_sent)),
            Err(err) if err.kind() == ErrorKind::WouldBlock => {
                cx.waker().wake_by_ref();
                Poll::Pending
            }
            Err(err) => Poll::Ready(Err(err)),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
