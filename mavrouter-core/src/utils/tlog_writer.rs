//! Prepends an 8-byte big-endian microsecond timestamp to every record written through it.
//!
//! Used by the `tlog:` connector (spec §4.1: "writes prepend the 8-byte microsecond
//! timestamp"), matching the on-disk format the dump manager also produces for its rotated
//! segments (spec §4.7).

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::io::AsyncWrite;

/// Wraps `W` so that every record written through [`mavio::AsyncSender`] is preceded by an
/// 8-byte big-endian microsecond timestamp, captured at the start of that record.
///
/// Assumes one frame is written per `write_all` call, which holds for `mavio::AsyncSender`
/// (it serializes a frame into a single buffer before issuing one write). Tracks frame
/// boundaries as "the poll_write immediately following one that completed the caller's
/// buffer in full".
pub struct TimestampedWriter<W> {
    inner: W,
    at_boundary: bool,
    stamp: Option<([u8; 8], usize)>,
}

impl<W> TimestampedWriter<W> {
    /// Wraps `inner`; the first write through this wrapper gets a fresh timestamp.
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            at_boundary: true,
            stamp: None,
        }
    }
}

fn now_micros_be() -> [u8; 8] {
    let micros = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros() as u64;
    micros.to_be_bytes()
}

impl<W: AsyncWrite + Unpin> AsyncWrite for TimestampedWriter<W> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        let this = self.get_mut();

        if this.at_boundary && this.stamp.is_none() {
            this.stamp = Some((now_micros_be(), 0));
        }

        if let Some((stamp, offset)) = &mut this.stamp {
            while *offset < stamp.len() {
                match Pin::new(&mut this.inner).poll_write(cx, &stamp[*offset..]) {
                    Poll::Ready(Ok(0)) => {
                        return Poll::Ready(Err(std::io::ErrorKind::WriteZero.into()))
                    }
                    Poll::Ready(Ok(n)) => *offset += n,
                    Poll::Ready(Err(err)) => return Poll::Ready(Err(err)),
                    Poll::Pending => return Poll::Pending,
                }
            }
            this.stamp = None;
            this.at_boundary = false;
        }

        let result = Pin::new(&mut this.inner).poll_write(cx, buf);
        if let Poll::Ready(Ok(n)) = result {
            if n == buf.len() {
                this.at_boundary = true;
            }
        }
        result
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
