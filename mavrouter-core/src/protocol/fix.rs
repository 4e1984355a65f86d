//! Outbound frame finalization.

use mavio::protocol::MaybeVersioned;

use crate::protocol::VersionedFrame;

/// Recomputes whatever a frame needs fixed up before it is forwarded on the router's behalf.
///
/// The Go original this router is modeled on rebuilds every outgoing frame from a decoded,
/// struct-based representation before re-serializing it (`gomavlib.Node.WriteFrameTo`
/// always re-encodes). That reconstruction can silently drop the MAVLink 2 "trim trailing
/// zero bytes" optimization some senders apply, which is why it calls `FixFrame` first:
/// to re-pad the payload to its canonical length and recompute the checksum over it.
///
/// This implementation never reconstructs a frame from a decoded message on the forwarding
/// path — [`Frame`](crate::protocol::Frame) is the frame exactly as parsed off the wire, and
/// the router forwards those bytes untouched. There is nothing for a CRC recomputation to
/// fix: the checksum the sender computed is still valid for the bytes being relayed. This
/// function is kept as a distinct step (called right where spec's routing algorithm calls
/// for a `fix_frame`) so a future change that *does* reconstruct frames — e.g. rewriting a
/// field — has an obvious place to plug a real recomputation in, without changing every
/// call site in the router.
pub fn fix_frame<V: MaybeVersioned>(frame: &VersionedFrame<V>) -> VersionedFrame<V> {
    frame.clone()
}
