//! MAVLink protocol types used throughout the I/O engine.

mod fix;
mod heartbeat;
mod target;

pub use fix::fix_frame;
pub use heartbeat::{build_heartbeat, decode_heartbeat, heartbeat_message_id, is_ardupilot};
pub use target::target_of;

pub use mavio::protocol::{
    ComponentId, MavLinkVersion, MessageId, Payload, SystemId, V1, V2,
};

/// A MAVLink frame whose protocol version is erased.
///
/// Every frame that crosses a channel boundary or sits on the event bus is stored in this
/// form. Readers produce it directly (a byte stream may interleave `MAVLink 1` and
/// `MAVLink 2` packets); writers that need a concretely versioned frame — the heartbeat
/// emitter building frames in `--hb-version`, for instance — go through
/// [`mavio::Frame::try_into_versioned`] to recover `Frame<V1>`/`Frame<V2>`, and back through
/// [`mavio::Frame::into_versionless`] to rejoin the bus.
pub type Frame = mavio::Frame<mavio::protocol::Versionless>;

/// A concretely versioned frame, built locally (e.g. by the heartbeat emitter).
pub type VersionedFrame<V> = mavio::Frame<V>;
