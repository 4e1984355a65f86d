//! Default timeouts, intervals and buffer capacities.
//!
//! Mirrors the constants a MAVLink relay needs to pick sane defaults for without
//! requiring every caller to restate them.

use std::time::Duration;

/// How long a read on a channel may block before it is considered stalled.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a write on a channel may block before it is considered stalled.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// How long a channel may go without producing a frame before it is dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Delay between reconnect attempts for connectors configured with [`crate::io::Retry::Always`].
pub const DEFAULT_RECONNECT_INTERVAL: Duration = Duration::from_secs(1);

/// Capacity of the bounded event bus channel.
pub const EVENT_BUS_CAPACITY: usize = 256;

/// Capacity of the bounded per-channel outgoing frame queue.
pub const CHANNEL_WRITE_QUEUE_CAPACITY: usize = 256;

/// How often the stop-watcher task polls the read/write handlers for completion.
pub const CHANNEL_STOP_POLLING_INTERVAL: Duration = Duration::from_millis(100);

/// Number of attempts the stop-watcher makes to join handler tasks before giving up and
/// logging a warning.
pub const CHANNEL_STOP_JOIN_ATTEMPTS: usize = 50;

/// Delay between join attempts while stopping a channel.
pub const CHANNEL_STOP_JOIN_POLLING_INTERVAL: Duration = Duration::from_millis(100);

/// Size of the scratch buffer used to `recv_from` a UDP socket shared by several channels.
pub const UDP_RECV_BUFFER_SIZE: usize = 512;

/// Capacity of the `mpsc` pair standing in for a socket on a demultiplexed UDP server peer.
pub const UDP_PEER_QUEUE_CAPACITY: usize = 1024;
