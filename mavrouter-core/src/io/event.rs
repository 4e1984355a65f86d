//! The single stream of things that happen to channels.

use std::sync::Arc;

use super::ids::ChannelId;
use super::info::ChannelInfo;
use crate::error::Error;
use crate::protocol::Frame;

/// Everything the rest of the router learns about channel I/O arrives as one of these.
///
/// Every variant carries the [`ChannelId`] it happened on, so subscribers never need to
/// maintain their own channel-to-handler map just to react to events.
#[derive(Clone, Debug)]
pub enum Event {
    /// A channel was opened (a TCP/UDP peer connected or reconnected, a serial port was
    /// opened, a dump file was created).
    ChannelOpen(ChannelInfo),
    /// A channel was closed, permanently or pending a reconnect, with the read or write
    /// handler error that caused the teardown, if any (a clean shutdown carries `None`).
    ChannelClose(ChannelId, Option<Arc<Error>>),
    /// A well-formed frame was received on a channel.
    Frame(ChannelId, Arc<Frame>),
    /// A byte stream produced bytes that failed to parse as a MAVLink frame.
    ParseError(ChannelId, Arc<Error>),
}

impl Event {
    /// The channel this event pertains to.
    pub fn channel_id(&self) -> ChannelId {
        match self {
            Event::ChannelOpen(info) => info.id(),
            Event::ChannelClose(id, _) => *id,
            Event::Frame(id, _) => *id,
            Event::ParseError(id, _) => *id,
        }
    }
}

/// Sending half of the event bus, held by every channel's read task.
pub type EventSender = tokio::sync::mpsc::Sender<Event>;

/// Receiving half of the event bus, held by the router.
pub type EventReceiver = tokio::sync::mpsc::Receiver<Event>;

/// Bounded, ordered stream of [`Event`]s produced by every channel in the system.
///
/// A single [`tokio::sync::mpsc`] channel rather than a broadcast: there is exactly one
/// consumer (the router), and the bound gives the whole system natural backpressure — a slow
/// router stalls channel reads rather than silently dropping frames.
pub struct EventBus {
    sender: EventSender,
    receiver: EventReceiver,
}

impl EventBus {
    /// Creates a new event bus with the given channel capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = tokio::sync::mpsc::channel(capacity);
        Self { sender, receiver }
    }

    /// A clone of the sending half, to be handed to a new channel's read task.
    pub fn sender(&self) -> EventSender {
        self.sender.clone()
    }

    /// Splits the bus into its two halves.
    pub fn split(self) -> (EventSender, EventReceiver) {
        (self.sender, self.receiver)
    }
}
