//! Async MAVLink channel/endpoint I/O engine.
//!
//! This crate owns everything that moves bytes: endpoint connectors and acceptors
//! (TCP, UDP, serial, tlog files), the per-channel read/write/stop task trio, the
//! event bus that funnels parsed frames and lifecycle notifications into a single
//! stream, and the broadcast-scope primitives used to address outbound frames.
//!
//! It does not know anything about routing policy, stream-request arbitration or
//! heartbeats — that lives in the `mavrouter` binary crate, built on top of the
//! primitives exported here.
#![warn(missing_docs)]

pub mod consts;
pub mod error;
pub mod io;
pub mod protocol;
pub mod utils;

pub mod prelude {
    //! Commonly used types, re-exported for convenience.
    pub use crate::error::{Error, Result};
    pub use crate::io::{
        BroadcastScope, Channel, ChannelId, ChannelInfo, ConnectionId, ConnectionInfo, Endpoint,
        Event, EventBus, OutgoingFrame, Supervisor,
    };
    pub use crate::protocol::Frame;
}
