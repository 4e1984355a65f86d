//! Opaque, monotonically increasing identifiers.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// An opaque identifier that is unique within the process and orders by creation time.
///
/// Only identity (equality/ordering by creation order) matters; the internal representation
/// is not meant to be interpreted.
#[derive(Copy, Clone, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct UniqueId {
    timestamp: u64,
    counter: u16,
}

impl std::fmt::Debug for UniqueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UniqueId({}.{})", self.timestamp, self.counter)
    }
}

static UNIQUE_ID: Mutex<UniqueId> = Mutex::new(UniqueId {
    timestamp: 0,
    counter: 0,
});

impl UniqueId {
    /// Generates a new identifier, guaranteed to be greater than every previously generated one.
    pub fn new() -> Self {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64;

        let mut guard = UNIQUE_ID.lock().unwrap();
        if now > guard.timestamp {
            guard.timestamp = now;
            guard.counter = 0;
        } else {
            guard.counter = match guard.counter.checked_add(1) {
                Some(counter) => counter,
                None => {
                    guard.timestamp += 1;
                    0
                }
            };
        }
        *guard
    }
}

impl Default for UniqueId {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_strictly_increasing() {
        let mut prev = UniqueId::new();
        for _ in 0..10_000 {
            let next = UniqueId::new();
            assert!(next > prev, "{:?} should be greater than {:?}", next, prev);
            prev = next;
        }
    }
}
