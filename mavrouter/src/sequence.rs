//! Sequence-number counter for frames this router originates.
//!
//! Every frame the router builds itself — its own heartbeat, ArduPilot stream requests — is
//! sequenced from one shared counter, mirroring a single MAVLink node's identity even though
//! two different subsystems (the heartbeat emitter, the stream-request engine) produce frames
//! under it.

use std::sync::atomic::{AtomicU8, Ordering};

/// A wrapping `u8` sequence counter, safe to share across tasks.
#[derive(Debug, Default)]
pub struct Sequencer(AtomicU8);

impl Sequencer {
    /// Creates a counter starting at 0.
    pub fn new() -> Self {
        Self(AtomicU8::new(0))
    }

    /// Returns the next sequence number, wrapping at 256 per the MAVLink wire format.
    pub fn next(&self) -> u8 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_around() {
        let seq = Sequencer::new();
        for expected in 0..=255u8 {
            assert_eq!(seq.next(), expected);
        }
        assert_eq!(seq.next(), 0);
    }
}
