//! Serial port connector (`serial:<path>:<baud>`), behind the `serial` feature.

use async_trait::async_trait;
use tokio_serial::SerialPortBuilderExt;

use crate::error::Result;
use crate::utils::Closer;

use super::super::channel::{Channel, ChannelTimeouts, OutgoingSender};
use super::super::event::EventSender;
use super::super::ids::ConnectionId;
use super::super::info::{ChannelDetails, ChannelInfo};
use super::Connector;

/// `serial:<path>:<baud>` — opens a serial port, reconnecting per the endpoint's retry policy
/// if it is unplugged.
pub struct SerialPort {
    path: String,
    baud_rate: u32,
}

impl SerialPort {
    /// Creates a serial connector for `path` at `baud_rate`.
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
        }
    }
}

#[async_trait]
impl Connector for SerialPort {
    async fn run(
        &self,
        connection: ConnectionId,
        outgoing: OutgoingSender,
        events: EventSender,
        closer: Closer,
        timeouts: ChannelTimeouts,
    ) -> Result<()> {
        let path = self.path.clone();
        let baud_rate = self.baud_rate;

        let port = tokio_serial::new(&path, baud_rate).open_native_async()?;
        let (reader, writer) = tokio::io::split(port);

        let details = ChannelDetails::Serial { path, baud_rate };
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
