//! Small, self-contained helpers shared across the I/O engine.

mod busy;
mod mpsc_io;
mod tlog_writer;
mod udp_rw;
mod unique_id;

pub use busy::CancellableBusyReader;
pub use mpsc_io::{MpscReader, MpscWriter};
pub use tlog_writer::TimestampedWriter;
pub use udp_rw::UdpRW;
pub use unique_id::UniqueId;

/// Cancellation signal shared by every long-running task.
///
/// A plain re-export rather than a bespoke wrapper: [`tokio_util::sync::CancellationToken`]
/// already gives cheap clones, child tokens and a `cancelled()` future, which is exactly the
/// shape every read/write/stop-watcher task and every periodic timer in this crate needs.
pub type Closer = tokio_util::sync::CancellationToken;
