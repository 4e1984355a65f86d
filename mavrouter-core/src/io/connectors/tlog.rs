//! `tlog:<path>` — write-only append sink, one channel for the life of the process.
//!
//! Unlike the dump manager (which rotates many tlog segments by wall-clock duration), this
//! connector is the plain `--endpoint tlog:<path>` CLI form: a single file, opened once, never
//! rotated.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::BufWriter;

use crate::error::Result;
use crate::utils::{CancellableBusyReader, Closer, TimestampedWriter};

use super::super::channel::{Channel, ChannelTimeouts, OutgoingSender};
use super::super::event::EventSender;
use super::super::ids::ConnectionId;
use super::super::info::{ChannelDetails, ChannelInfo};
use super::Connector;

/// `tlog:<path>` — appends every frame written to it as a raw MAVLink byte stream.
///
/// Frames flow through [`Channel`] exactly as any other endpoint's do; the writer is wrapped
/// in [`TimestampedWriter`] so each record on disk matches the dump manager's own format
/// (spec §4.1, §4.7): an 8-byte big-endian microsecond timestamp followed by the frame.
pub struct TlogFile {
    path: PathBuf,
}

impl TlogFile {
    /// Creates a connector that appends to (or creates) `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl Connector for TlogFile {
    async fn run(
        &self,
        connection: ConnectionId,
        outgoing: OutgoingSender,
        events: EventSender,
        closer: Closer,
        mut timeouts: ChannelTimeouts,
    ) -> Result<()> {
        let path = self.path.clone();
        let file = File::create(&path).await?;
        let writer = TimestampedWriter::new(BufWriter::new(file));
        let reader = CancellableBusyReader::new(closer.child_token());

        // The reader never yields a frame, so it must never be charged against the idle
        // timeout meant for real peers that go quiet; only cancellation ends this channel.
        timeouts.idle = Duration::MAX;

        let details = ChannelDetails::TlogFile { path };
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
