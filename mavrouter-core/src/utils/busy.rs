//! A reader for write-only transports (the tlog dump sink has no inbound side).

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, ReadBuf};

use super::Closer;

/// Reader that never produces data, for pairing with a write-only transport.
///
/// Stays pending until `closer` is cancelled, at which point it resolves to
/// [`std::io::ErrorKind::TimedOut`] — the same error kind a stalled read already produces, so
/// the channel's read loop tears the channel down through its existing path instead of a
/// separate one.
pub struct CancellableBusyReader {
    closer: Closer,
}

impl CancellableBusyReader {
    /// Creates a reader that stays pending until `closer` is cancelled.
    pub fn new(closer: Closer) -> Self {
        Self { closer }
    }
}

impl AsyncRead for CancellableBusyReader {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let cancelled = std::pin::pin!(self.closer.cancelled());
        match cancelled.poll(cx) {
            Poll::Ready(()) => Poll::Ready(Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "CancellableBusyReader: channel cancelled",
            ))),
            Poll::Pending => Poll::Pending,
        }
    }
}
