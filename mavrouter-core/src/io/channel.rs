//! The read/write/stop task trio that drives a single channel.

use std::sync::Arc;
use std::time::Duration;

use mavio::{AsyncReceiver, AsyncSender};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::consts::{
    CHANNEL_STOP_JOIN_ATTEMPTS, CHANNEL_STOP_JOIN_POLLING_INTERVAL, CHANNEL_STOP_POLLING_INTERVAL,
    DEFAULT_IDLE_TIMEOUT, DEFAULT_READ_TIMEOUT, DEFAULT_WRITE_TIMEOUT,
};
use crate::error::{Error, Result};
use crate::utils::Closer;

use super::event::{Event, EventSender};
use super::ids::ChannelId;
use super::info::ChannelInfo;
use super::scope::OutgoingFrame;

/// Sending half of the outgoing-frame broadcast every channel's write task subscribes to.
pub type OutgoingSender = broadcast::Sender<OutgoingFrame>;
/// Receiving half of the outgoing-frame broadcast, one subscription per channel.
pub type OutgoingReceiver = broadcast::Receiver<OutgoingFrame>;

/// Per-channel timeouts, as specified in spec §5 ("Timeouts").
#[derive(Copy, Clone, Debug)]
pub struct ChannelTimeouts {
    /// How long a single read may block before it is treated as a transient stall.
    pub read: Duration,
    /// How long a single write may block before it is treated as a transient stall.
    pub write: Duration,
    /// How long a channel may go without producing a frame before it is torn down.
    pub idle: Duration,
}

impl Default for ChannelTimeouts {
    fn default() -> Self {
        Self {
            read: DEFAULT_READ_TIMEOUT,
            write: DEFAULT_WRITE_TIMEOUT,
            idle: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

/// Everything a freshly accepted/connected/opened byte stream needs to become a live channel.
pub struct Channel<R, W> {
    info: ChannelInfo,
    reader: R,
    writer: W,
    outgoing: OutgoingReceiver,
    events: EventSender,
    closer: Closer,
    timeouts: ChannelTimeouts,
}

impl<R, W> Channel<R, W>
where
    R: AsyncRead + Send + Unpin + 'static,
    W: AsyncWrite + Send + Unpin + 'static,
{
    /// Pairs a reader/writer pair with its identity and the shared outgoing/event buses.
    pub fn new(
        info: ChannelInfo,
        reader: R,
        writer: W,
        outgoing: OutgoingReceiver,
        events: EventSender,
        closer: Closer,
    ) -> Self {
        Self::with_timeouts(
            info,
            reader,
            writer,
            outgoing,
            events,
            closer,
            ChannelTimeouts::default(),
        )
    }

    /// As [`Channel::new`], but with explicit read/write/idle timeouts.
    pub fn with_timeouts(
        info: ChannelInfo,
        reader: R,
        writer: W,
        outgoing: OutgoingReceiver,
        events: EventSender,
        closer: Closer,
        timeouts: ChannelTimeouts,
    ) -> Self {
        Self {
            info,
            reader,
            writer,
            outgoing,
            events,
            closer,
            timeouts,
        }
    }

    /// Spawns the read, write and stop-watcher tasks and returns a child [`Closer`] that is
    /// cancelled once this channel has actually stopped (either because it was told to, or
    /// because its read/write task exited on its own, e.g. on EOF).
    pub async fn spawn(self) -> Closer {
        let id = self.info.id();
        let state = self.closer.child_token();

        log::debug!("[{}] channel opened", self.info);
        let _ = self
            .events
            .send(Event::ChannelOpen(self.info.clone()))
            .await;

        let write_handler: JoinHandle<Result<()>> = {
            let mut outgoing = self.outgoing;
            let mut frame_writer = AsyncSender::new(self.writer);
            let write_timeout = self.timeouts.write;
            tokio::spawn(async move {
                loop {
                    let out_frame = match outgoing.recv().await {
                        Ok(out_frame) => out_frame,
                        Err(broadcast::error::RecvError::Closed) => return Ok(()),
                        Err(broadcast::error::RecvError::Lagged(n)) => {
                            log::warn!("[{id:?}] outgoing queue lagged, dropped {n} frames");
                            continue;
                        }
                    };

                    if !out_frame.should_send_to(id) {
                        continue;
                    }

                    let send = frame_writer.send(out_frame.frame());
                    let result = match tokio::time::timeout(write_timeout, send).await {
                        Ok(result) => result,
                        Err(_elapsed) => {
                            log::warn!("[{id:?}] write timed out after {write_timeout:?}");
                            continue;
                        }
                    };

                    if let Err(err) = result {
                        let err = Error::from(err);
                        if let Error::Io(io_err) = &err {
                            if io_err.kind() == std::io::ErrorKind::TimedOut {
                                continue;
                            }
                        }
                        return Err(err);
                    }
                }
            })
        };

        let read_handler: JoinHandle<Result<()>> = {
            let state = state.clone();
            let events = self.events.clone();
            let mut frame_reader = AsyncReceiver::new(self.reader);
            let read_timeout = self.timeouts.read;
            let idle_timeout = self.timeouts.idle;
            tokio::spawn(async move {
                let mut last_activity = tokio::time::Instant::now();

                loop {
                    if state.is_cancelled() {
                        return Ok(());
                    }

                    if last_activity.elapsed() >= idle_timeout {
                        return Err(Error::Other(format!(
                            "no frame received within idle timeout {idle_timeout:?}"
                        )));
                    }

                    let recv = frame_reader.recv();
                    let outcome = match tokio::time::timeout(read_timeout, recv).await {
                        Ok(outcome) => outcome,
                        Err(_elapsed) => continue,
                    };

                    let frame = match outcome {
                        Ok(frame) => frame,
                        Err(err) => {
                            let err = Error::from(err);
                            if let Error::Io(io_err) = &err {
                                if io_err.kind() == std::io::ErrorKind::TimedOut {
                                    continue;
                                }
                            }
                            let _ = events.send(Event::ParseError(id, Arc::new(err))).await;
                            continue;
                        }
                    };

                    last_activity = tokio::time::Instant::now();

                    if events
                        .send(Event::Frame(id, Arc::new(frame.into_versionless())))
                        .await
                        .is_err()
                    {
                        return Ok(());
                    }
                }
            })
        };

        {
            let state = state.clone();
            let events = self.events.clone();
            let info = self.info.clone();
            tokio::spawn(async move {
                stop_watcher(state, info, events, write_handler, read_handler).await;
            });
        }

        state
    }
}

async fn stop_watcher(
    state: Closer,
    info: ChannelInfo,
    events: EventSender,
    write_handler: JoinHandle<Result<()>>,
    read_handler: JoinHandle<Result<()>>,
) {
    while !(state.is_cancelled() || write_handler.is_finished() || read_handler.is_finished()) {
        tokio::time::sleep(CHANNEL_STOP_POLLING_INTERVAL).await;
    }
    state.cancel();

    for attempt in 0..CHANNEL_STOP_JOIN_ATTEMPTS {
        if write_handler.is_finished() && read_handler.is_finished() {
            break;
        }
        tokio::time::sleep(CHANNEL_STOP_JOIN_POLLING_INTERVAL).await;
        if attempt == CHANNEL_STOP_JOIN_ATTEMPTS - 1 {
            log::warn!(
                "[{info}] write/read handlers are stuck, finished: write={}, read={}",
                write_handler.is_finished(),
                read_handler.is_finished()
            );
        }
    }

    let mut cause: Option<Arc<Error>> = None;

    if let (Ok(res_write), Ok(res_read)) = (write_handler.await, read_handler.await) {
        if let Err(err) = res_write {
            log::debug!("[{info}] write handler finished with error: {err}");
            cause.get_or_insert(Arc::new(err));
        }
        if let Err(err) = res_read {
            log::debug!("[{info}] read handler finished with error: {err}");
            cause.get_or_insert(Arc::new(err));
        }
    }

    let _ = events.send(Event::ChannelClose(info.id(), cause)).await;
    log::debug!("[{info}] channel closed");
}
