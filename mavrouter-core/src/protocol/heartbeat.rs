//! Heartbeat construction and ArduPilot recognition.
//!
//! The router needs to build its own heartbeat frames (the heartbeat emitter) and to
//! recognize heartbeats from a specific autopilot family on receive (the stream-request
//! engine). Both only ever touch one message type, so unlike [`super::target`] they don't
//! need a dispatch table — a direct `TryFrom<&Payload>` decode is enough.

use mavio::dialects::common::enums::{MavAutopilot, MavModeFlag, MavState};
use mavio::dialects::common::messages::Heartbeat;
use mavio::mavspec::rust::spec::MessageSpecStatic;
use mavio::protocol::{ComponentId, MavLinkVersion, MessageId, Payload, SystemId, Versioned};

use crate::error::Result;

use super::Frame;

/// The message ID of [`Heartbeat`], for comparison against [`Frame::message_id`].
pub fn heartbeat_message_id() -> MessageId {
    Heartbeat::message_id()
}

/// Decodes a frame's payload as a [`Heartbeat`], if its message ID matches.
pub fn decode_heartbeat(message_id: MessageId, payload: &Payload) -> Option<Heartbeat> {
    if message_id != heartbeat_message_id() {
        return None;
    }
    Heartbeat::try_from(payload).ok()
}

/// Whether a decoded heartbeat was sent by an ArduPilot autopilot.
///
/// ArduPilot is the only autopilot family this router treats specially (the stream-request
/// engine, per spec, only arbitrates streams for it).
pub fn is_ardupilot(heartbeat: &Heartbeat) -> bool {
    matches!(heartbeat.autopilot, MavAutopilot::Ardupilotmega)
}

/// Builds one heartbeat frame for this router to emit, stamped with `sequence`.
pub fn build_heartbeat<V: Versioned + 'static>(
    version: V,
    system_id: SystemId,
    component_id: ComponentId,
    sequence: u8,
) -> Result<Frame> {
    let message = Heartbeat {
        type_: Default::default(),
        autopilot: MavAutopilot::Generic,
        base_mode: MavModeFlag::default(),
        custom_mode: 0,
        system_status: MavState::Active,
        mavlink_version: mavlink_version_byte(V::version()),
    };

    let frame = mavio::Frame::builder()
        .sequence(sequence)
        .system_id(system_id)
        .component_id(component_id)
        .version(version)
        .message(&message)?
        .build();

    Ok(frame.into_versionless())
}

fn mavlink_version_byte(version: MavLinkVersion) -> u8 {
    match version {
        MavLinkVersion::V1 => 1,
        MavLinkVersion::V2 => 2,
    }
}
