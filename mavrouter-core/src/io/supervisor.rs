//! Wires endpoints, channels and the event bus together into one running I/O engine.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::consts::{CHANNEL_WRITE_QUEUE_CAPACITY, EVENT_BUS_CAPACITY};
use crate::protocol::{fix_frame, Frame};
use crate::utils::Closer;

use super::channel::OutgoingSender;
use super::endpoint::Endpoint;
use super::event::{Event, EventBus, EventReceiver, EventSender};
use super::ids::ChannelId;
use super::scope::{BroadcastScope, OutgoingFrame};

/// A cheap, cloneable capability for writing frames back out, independent of the
/// [`Supervisor`] that created it.
///
/// Spec §5 requires that "multiple tasks may call `write_to` concurrently" without any
/// additional synchronization on the caller's part. A `broadcast::Sender` is already `Clone +
/// Send + Sync` and internally synchronized, so this handle needs nothing more than one —
/// there is no reason to share the whole [`Supervisor`] (and its exclusively-owned event
/// receiver) just to let the router, heartbeat emitter and stream-request engine write frames.
#[derive(Clone)]
pub struct SupervisorHandle {
    outgoing: OutgoingSender,
}

impl SupervisorHandle {
    /// Applies whatever finalization a frame needs before it is sent back out.
    pub fn fix_frame(&self, frame: &Frame) -> Frame {
        fix_frame(frame)
    }

    /// Writes `frame` to exactly one channel.
    pub fn write_to(&self, frame: Arc<Frame>, channel: ChannelId) {
        self.send(OutgoingFrame::new(frame, BroadcastScope::ExactChannel(channel)));
    }

    /// Writes `frame` to every channel except `origin`.
    pub fn write_except(&self, frame: Arc<Frame>, origin: ChannelId) {
        self.send(OutgoingFrame::new(frame, BroadcastScope::ExceptChannel(origin)));
    }

    /// Writes `frame` to every channel on every connection.
    pub fn write_all(&self, frame: Arc<Frame>) {
        self.send(OutgoingFrame::new(frame, BroadcastScope::All));
    }

    fn send(&self, out_frame: OutgoingFrame) {
        // No receivers (every endpoint already stopped) is not an error worth reporting.
        let _ = self.outgoing.send(out_frame);
    }
}

/// Runs every configured endpoint and exposes a single stream of [`Event`]s plus a handful of
/// write primitives for forwarding frames back out.
///
/// There is exactly one event consumer (the router) and one outgoing broadcast shared by every
/// channel's write task; [`Supervisor`] just owns the plumbing that makes that true.
pub struct Supervisor {
    outgoing: OutgoingSender,
    events_tx: EventSender,
    events_rx: EventReceiver,
    closer: Closer,
    handles: Vec<JoinHandle<()>>,
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl Supervisor {
    /// Creates an idle supervisor with no endpoints running yet.
    pub fn new() -> Self {
        let (outgoing, _) = broadcast::channel(CHANNEL_WRITE_QUEUE_CAPACITY);
        let bus = EventBus::with_capacity(EVENT_BUS_CAPACITY);
        let events_tx = bus.sender();
        let (_, events_rx) = bus.split();

        Self {
            outgoing,
            events_tx,
            events_rx,
            closer: Closer::new(),
            handles: Vec::new(),
        }
    }

    /// Starts running `endpoint`, spawning its connector task in the background.
    pub fn spawn(&mut self, endpoint: Endpoint) {
        let outgoing = self.outgoing.clone();
        let events = self.events_tx.clone();
        let closer = self.closer.child_token();

        self.handles.push(tokio::spawn(async move {
            endpoint.run(outgoing, events, closer).await;
        }));
    }

    /// Waits for the next [`Event`] produced by any running channel.
    ///
    /// Returns `None` once every endpoint has stopped and every channel has closed.
    pub async fn events(&mut self) -> Option<Event> {
        self.events_rx.recv().await
    }

    /// Returns a cheap, cloneable handle for writing frames, detached from this supervisor's
    /// exclusively-owned event receiver.
    pub fn handle(&self) -> SupervisorHandle {
        SupervisorHandle {
            outgoing: self.outgoing.clone(),
        }
    }

    /// Applies whatever finalization a frame needs before it is sent back out.
    pub fn fix_frame(&self, frame: &Frame) -> Frame {
        fix_frame(frame)
    }

    /// Writes `frame` to exactly one channel.
    pub fn write_to(&self, frame: Arc<Frame>, channel: ChannelId) {
        self.handle().write_to(frame, channel);
    }

    /// Writes `frame` to every channel except `origin`.
    pub fn write_except(&self, frame: Arc<Frame>, origin: ChannelId) {
        self.handle().write_except(frame, origin);
    }

    /// Writes `frame` to every channel on every connection.
    pub fn write_all(&self, frame: Arc<Frame>) {
        self.handle().write_all(frame);
    }

    /// Cancels every running endpoint and waits for its connector task to finish.
    pub async fn shutdown(self) {
        self.closer.cancel();
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}
