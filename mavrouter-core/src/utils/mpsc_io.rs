//! Adapts an `mpsc` channel of byte buffers into [`AsyncRead`]/[`AsyncWrite`].
//!
//! Used by the UDP server connector: a single socket is demultiplexed into one channel per
//! peer address, and each peer's channel needs something that looks like a private byte stream.

use std::cmp::min;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::sync::mpsc;

/// Wrapper around [`mpsc::Receiver`] that implements [`AsyncRead`].
///
/// Returns [`std::io::ErrorKind::ConnectionAborted`] once the channel is closed.
pub struct MpscReader {
    receiver: mpsc::Receiver<Vec<u8>>,
    buf: Vec<u8>,
}

impl MpscReader {
    /// Creates a new reader pulling from `receiver`.
    pub fn new(receiver: mpsc::Receiver<Vec<u8>>) -> Self {
        Self {
            receiver,
            buf: Vec::new(),
        }
    }
}

impl AsyncRead for MpscReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if self.buf.len() >= buf.remaining() {
            let bytes_read = buf.remaining();
            buf.initialize_unfilled_to(bytes_read)[0..bytes_read]
                .copy_from_slice(&self.buf[0..bytes_read]);
            buf.advance(bytes_read);
            self.get_mut().buf.drain(0..bytes_read);
            return Poll::Ready(Ok(()));
        }

        let mut recv_buf = {
            let mut pinned = std::pin::pin!(self.as_mut().get_mut().receiver.recv());
            match pinned.as_mut().poll(cx) {
                Poll::Ready(None) => {
                    return Poll::Ready(Err(std::io::Error::new(
                        std::io::ErrorKind::ConnectionAborted,
                        "MpscReader: channel closed",
                    )))
                }
                Poll::Ready(Some(recv_buf)) => recv_buf,
                Poll::Pending => return Poll::Pending,
            }
        };
        self.as_mut().buf.append(&mut recv_buf);

        let bytes_read = min(self.buf.len(), buf.remaining());
        buf.initialize_unfilled_to(bytes_read)[0..bytes_read]
            .copy_from_slice(&self.buf[0..bytes_read]);
        buf.advance(bytes_read);
        self.buf.drain(0..bytes_read);

        Poll::Ready(Ok(()))
    }
}

/// Wrapper around [`mpsc::Sender`] that implements [`AsyncWrite`].
///
/// Returns [`std::io::ErrorKind::ConnectionAborted`] once the channel is closed.
#[derive(Clone)]
pub struct MpscWriter {
    sender: mpsc::Sender<Vec<u8>>,
}

impl MpscWriter {
    /// Creates a new writer pushing into `sender`.
    pub fn new(sender: mpsc::Sender<Vec<u8>>) -> Self {
        Self { sender }
    }
}

impl AsyncWrite for MpscWriter {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        let mut pinned = std::pin::pin!(self.sender.send(buf.to_vec()));
        match pinned.as_mut().poll(cx) {
            Poll::Ready(Ok(())) => Poll::Ready(Ok(buf.len())),
            Poll::Ready(Err(_)) => Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionAborted,
                "MpscWriter: channel closed",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[tokio::test]
    async fn writer_forwards_every_chunk() {
        let (tx, mut rx) = mpsc::channel(8);
        let mut writer = MpscWriter::new(tx);

        writer.write_all(&[1u8; 4]).await.unwrap();
        writer.write_all(&[2u8; 4]).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), vec![1u8; 4]);
        assert_eq!(rx.recv().await.unwrap(), vec![2u8; 4]);
    }

    #[tokio::test]
    async fn reader_reassembles_across_chunk_boundaries() {
        let (tx, rx) = mpsc::channel(8);
        let mut reader = MpscReader::new(rx);

        tx.send(vec![1u8; 3]).await.unwrap();
        tx.send(vec![2u8; 3]).await.unwrap();

        let mut buf = [0u8; 6];
        reader.read_exact(&mut buf).await.unwrap();
        assert_eq!(buf, [1, 1, 1, 2, 2, 2]);
    }
}
