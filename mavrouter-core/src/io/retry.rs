//! Reconnect policy for endpoint connectors.

use std::time::Duration;

use crate::consts::DEFAULT_RECONNECT_INTERVAL;

/// How a connector should behave after it loses (or fails to establish) its connection.
#[derive(Copy, Clone, Debug)]
pub enum Retry {
    /// Give up after the first failure. Used for acceptors, which don't reconnect — they just
    /// keep accepting — and for one-shot consumers.
    Never,
    /// Retry indefinitely, waiting `interval` between attempts.
    Always(Duration),
}

impl Default for Retry {
    fn default() -> Self {
        Retry::Always(DEFAULT_RECONNECT_INTERVAL)
    }
}
