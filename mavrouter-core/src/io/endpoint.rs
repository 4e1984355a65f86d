//! Endpoint configuration: one entry per `--endpoint` CLI argument.

use async_trait::async_trait;

use crate::error::Result;
use crate::utils::Closer;

use super::channel::{ChannelTimeouts, OutgoingSender};
use super::event::EventSender;
use super::ids::ConnectionId;
use super::info::ConnectionInfo;
use super::retry::Retry;

/// Drives one endpoint's connection lifecycle.
///
/// A connector owns the actual transport (TCP/UDP socket, serial port, file). `run` is called
/// once per connection attempt: a client connector connects, spawns one [`Channel`][ch], and
/// returns once that channel closes; a server connector binds once and loops accepting peers
/// until `closer` is cancelled, never returning before then. Either way, the caller ([`Endpoint`])
/// decides whether to call `run` again based on its [`Retry`] policy.
///
/// [ch]: super::channel::Channel
#[async_trait]
pub trait Connector: Send + Sync {
    /// Runs one connection attempt, spawning channels under `connection` as peers appear.
    async fn run(
        &self,
        connection: ConnectionId,
        outgoing: OutgoingSender,
        events: EventSender,
        closer: Closer,
        timeouts: ChannelTimeouts,
    ) -> Result<()>;
}

/// A configured endpoint: its static description, its transport, and its policies.
pub struct Endpoint {
    info: ConnectionInfo,
    connector: Box<dyn Connector>,
    retry: Retry,
    timeouts: ChannelTimeouts,
}

impl Endpoint {
    /// Builds an endpoint from its static description, transport and policies.
    pub fn new(
        info: ConnectionInfo,
        connector: Box<dyn Connector>,
        retry: Retry,
        timeouts: ChannelTimeouts,
    ) -> Self {
        Self {
            info,
            connector,
            retry,
            timeouts,
        }
    }

    /// This endpoint's static configuration.
    pub fn info(&self) -> &ConnectionInfo {
        &self.info
    }

    /// Runs this endpoint until `closer` is cancelled, reconnecting per its [`Retry`] policy.
    pub(crate) async fn run(self, outgoing: OutgoingSender, events: EventSender, closer: Closer) {
        let id = self.info.id();

        loop {
            if closer.is_cancelled() {
                return;
            }

            let attempt = self.connector.run(
                id,
                outgoing.clone(),
                events.clone(),
                closer.child_token(),
                self.timeouts,
            );
            if let Err(err) = attempt.await {
                log::warn!("[{}] connector stopped: {err}", self.info);
            }

            if closer.is_cancelled() {
                return;
            }

            match self.retry {
                Retry::Never => return,
                Retry::Always(interval) => {
                    tokio::select! {
                        _ = closer.cancelled() => return,
                        _ = tokio::time::sleep(interval) => {}
                    }
                }
            }
        }
    }
}
