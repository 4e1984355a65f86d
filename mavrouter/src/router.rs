//! The routing table and the forwarding policy in spec §4.3 and §4.4.
//!
//! Grounded on `pkg/messageman/manager.go`'s `Manager`: a single mutex-guarded map from
//! `(channel, system_id, component_id)` to "last seen", plus the ArduPilot stream-request
//! arbitration that rides along the same frame-processing path (`handle_stream.go`).
//!
//! [`Router::on_frame`] and [`Router::on_channel_close`] never perform I/O: they compute a
//! decision under the lock and hand it back to the caller, which does the actual writes and
//! logging after the lock is released — the concurrency contract in spec §5 ("no outbound I/O
//! while holding a table lock").

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use mavio::dialects::common::messages::RequestDataStream;
use mavio::mavspec::rust::spec::MessageSpecStatic;
use mavio::protocol::{Versioned, V1, V2};

use mavrouter_core::io::ChannelId;
use mavrouter_core::protocol::{
    decode_heartbeat, is_ardupilot, target_of, ComponentId, Frame, MessageId, SystemId,
};

use crate::config::HbVersion;
use crate::sequence::Sequencer;

/// How long a learned peer may go unseen before it is purged (spec §3, "Routing table").
const NODE_INACTIVE_AFTER: Duration = Duration::from_secs(30);

/// How often the inactivity sweeper should be invoked by the caller (spec §4.3).
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10);

/// A learned remote peer: one system/component pair, reachable through one channel.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct RemoteNodeKey {
    pub channel: ChannelId,
    pub system_id: SystemId,
    pub component_id: ComponentId,
}

impl std::fmt::Debug for RemoteNodeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "chan={:?} sid={} cid={}",
            self.channel, self.system_id, self.component_id
        )
    }
}

/// What the caller should do with a frame after [`Router::on_frame`] returns.
#[derive(Debug)]
pub enum RouteAction {
    /// The frame was a `RequestDataStream` and stream-request arbitration is enabled: don't
    /// forward it (spec §4.3 step 2).
    Suppressed,
    /// The frame's target resolved to the channel it arrived on; dropped to avoid an echo.
    SelfLoop,
    /// The frame carried a target that no learned peer matches.
    UnknownTarget { system_id: SystemId, component_id: ComponentId },
    /// Forward to exactly these channels (usually one; more than one only when a
    /// `target_component == 0` frame fanned out to every component on that system).
    Unicast(Vec<ChannelId>),
    /// No target: forward to every channel except the source.
    Broadcast,
}

/// A batch of `RequestDataStream` frames to send back out on the channel a qualifying
/// heartbeat arrived on (spec §4.4).
#[derive(Debug)]
pub struct StreamRequestBatch {
    pub channel: ChannelId,
    pub frames: Vec<Frame>,
}

/// The outcome of processing one [`Event::Frame`](mavrouter_core::io::Event::Frame).
#[derive(Debug)]
pub struct FrameDecision {
    /// Whether this (channel, sid, cid) triple was learned for the first time.
    pub appeared: bool,
    pub key: RemoteNodeKey,
    pub action: RouteAction,
    pub stream_request: Option<StreamRequestBatch>,
}

struct RoutingState {
    last_seen: HashMap<RemoteNodeKey, Instant>,
    last_request: HashMap<RemoteNodeKey, Instant>,
}

/// Router configuration: this router's own identity (used to originate stream requests) and
/// the streamreq/targeting policy.
#[derive(Copy, Clone, Debug)]
pub struct RouterConfig {
    pub streamreq_disabled: bool,
    pub streamreq_frequency_hz: u16,
    pub version: HbVersion,
    pub system_id: SystemId,
    pub component_id: ComponentId,
}

/// Learns remote peers and decides where each frame should be forwarded.
pub struct Router {
    config: RouterConfig,
    state: Mutex<RoutingState>,
    sequencer: std::sync::Arc<Sequencer>,
}

impl Router {
    /// Creates an empty router.
    ///
    /// `sequencer` is shared with the heartbeat emitter: both subsystems originate frames
    /// under this router's own `(system_id, component_id)` identity, so they share one
    /// sequence counter rather than each keeping a private one (spec's "mirrors a single
    /// MAVLink node's identity", see [`Sequencer`]'s module docs).
    pub fn new(config: RouterConfig, sequencer: std::sync::Arc<Sequencer>) -> Self {
        Self {
            config,
            state: Mutex::new(RoutingState {
                last_seen: HashMap::new(),
                last_request: HashMap::new(),
            }),
            sequencer,
        }
    }

    /// Processes one received frame: learns its origin, arbitrates ArduPilot stream requests,
    /// and decides how it should be forwarded.
    pub fn on_frame(&self, channel: ChannelId, frame: &Frame, now: Instant) -> FrameDecision {
        let message_id = frame.message_id();
        let key = RemoteNodeKey {
            channel,
            system_id: frame.system_id(),
            component_id: frame.component_id(),
        };

        let heartbeat = decode_heartbeat(message_id, frame.payload());
        let is_request_data_stream = message_id == RequestDataStream::message_id();
        let target = target_of(message_id, frame.payload());

        let (appeared, stream_request) = {
            let mut state = self.state.lock().unwrap();

            let appeared = !state.last_seen.contains_key(&key);
            state.last_seen.insert(key, now);

            let stream_request = heartbeat.as_ref().and_then(|hb| {
                if self.config.streamreq_disabled || !is_ardupilot(hb) {
                    return None;
                }
                let due = match state.last_request.get(&key) {
                    Some(last) => now.duration_since(*last) >= NODE_INACTIVE_AFTER,
                    None => true,
                };
                if !due {
                    return None;
                }
                state.last_request.insert(key, now);
                Some(key)
            });

            (appeared, stream_request)
        };

        let stream_request = stream_request.map(|key| StreamRequestBatch {
            channel: key.channel,
            frames: self.build_stream_request_frames(key),
        });

        let action = if !self.config.streamreq_disabled && is_request_data_stream {
            RouteAction::Suppressed
        } else {
            match target {
                Some((system_id, 0)) if system_id > 0 => {
                    self.resolve_system_broadcast(channel, system_id)
                }
                Some((system_id, component_id)) if system_id > 0 => {
                    self.resolve_unicast(channel, system_id, component_id)
                }
                _ => RouteAction::Broadcast,
            }
        };

        FrameDecision {
            appeared,
            key,
            action,
            stream_request,
        }
    }

    /// Removes every routing-table entry (and stream-request memory) for a closed channel.
    pub fn on_channel_close(&self, channel: ChannelId) -> Vec<RemoteNodeKey> {
        let mut state = self.state.lock().unwrap();
        let removed: Vec<RemoteNodeKey> = state
            .last_seen
            .keys()
            .filter(|key| key.channel == channel)
            .copied()
            .collect();

        for key in &removed {
            state.last_seen.remove(key);
            state.last_request.remove(key);
        }
        removed
    }

    /// Removes every entry whose `last_seen` is older than 30s (spec §4.3, "Inactivity
    /// sweeper"). Intended to be called every [`SWEEP_INTERVAL`].
    pub fn sweep(&self, now: Instant) -> Vec<RemoteNodeKey> {
        let mut state = self.state.lock().unwrap();
        let stale: Vec<RemoteNodeKey> = state
            .last_seen
            .iter()
            .filter(|(_, last_seen)| now.duration_since(**last_seen) >= NODE_INACTIVE_AFTER)
            .map(|(key, _)| *key)
            .collect();

        for key in &stale {
            state.last_seen.remove(key);
            state.last_request.remove(key);
        }
        stale
    }

    fn resolve_unicast(
        &self,
        source: ChannelId,
        system_id: SystemId,
        component_id: ComponentId,
    ) -> RouteAction {
        let state = self.state.lock().unwrap();
        let found = state
            .last_seen
            .keys()
            .find(|key| key.system_id == system_id && key.component_id == component_id)
            .copied();
        drop(state);

        match found {
            None => RouteAction::UnknownTarget {
                system_id,
                component_id,
            },
            Some(key) if key.channel == source => RouteAction::SelfLoop,
            Some(key) => RouteAction::Unicast(vec![key.channel]),
        }
    }

    /// Resolution (b) of spec §9's open question on `target_component == 0`: fan out to every
    /// learned component on the target system, rather than picking one by iteration order.
    fn resolve_system_broadcast(&self, source: ChannelId, system_id: SystemId) -> RouteAction {
        let state = self.state.lock().unwrap();
        // A HashSet, not a Vec: a channel carrying several components of `system_id` (e.g.
        // two components behind one TCP peer) must still only be written once.
        let matching: HashSet<ChannelId> = state
            .last_seen
            .keys()
            .filter(|key| key.system_id == system_id)
            .map(|key| key.channel)
            .collect();
        drop(state);

        if matching.is_empty() {
            return RouteAction::UnknownTarget {
                system_id,
                component_id: 0,
            };
        }

        let destinations: Vec<ChannelId> =
            matching.into_iter().filter(|channel| *channel != source).collect();

        if destinations.is_empty() {
            RouteAction::SelfLoop
        } else {
            RouteAction::Unicast(destinations)
        }
    }

    /// Builds the seven standard `RequestDataStream` messages (spec §4.4), targeted at `key`.
    fn build_stream_request_frames(&self, key: RemoteNodeKey) -> Vec<Frame> {
        match self.config.version {
            HbVersion::V1 => self.build_stream_request_frames_versioned(key, V1),
            HbVersion::V2 => self.build_stream_request_frames_versioned(key, V2),
        }
    }

    fn build_stream_request_frames_versioned<V: Versioned + Copy + 'static>(
        &self,
        key: RemoteNodeKey,
        version: V,
    ) -> Vec<Frame> {
        // MAV_DATA_STREAM ids from the common dialect, in the order
        // https://github.com/mavlink/qgroundcontrol/blob/master/src/FirmwarePlugin/APM/APMFirmwarePlugin.cc
        // requests them: RAW_SENSORS, EXTENDED_STATUS, RC_CHANNELS, POSITION, EXTRA1, EXTRA2,
        // EXTRA3. `req_stream_id` is a plain `uint8_t` on the wire, not an enum-typed field, so
        // these are spelled out as the raw ids rather than a dialect enum.
        const STREAMS: [u8; 7] = [1, 2, 3, 6, 10, 11, 12];

        STREAMS
            .iter()
            .filter_map(|stream_id| {
                let message = RequestDataStream {
                    target_system: key.system_id,
                    target_component: key.component_id,
                    req_stream_id: *stream_id,
                    req_message_rate: self.config.streamreq_frequency_hz,
                    start_stop: 1,
                };
                mavio::Frame::builder()
                    .sequence(self.sequencer.next())
                    .system_id(self.config.system_id)
                    .component_id(self.config.component_id)
                    .version(version)
                    .message(&message)
                    .ok()
                    .map(|builder| builder.build().into_versionless())
            })
            .collect()
    }
}

/// The message ID of [`RequestDataStream`], exposed for the suppression check in
/// [`Router::on_frame`] and for tests elsewhere in the workspace.
pub fn request_data_stream_message_id() -> MessageId {
    RequestDataStream::message_id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use mavio::dialects::common::messages::{CommandLong, Heartbeat};
    use mavio::dialects::common::enums::{MavAutopilot, MavCmd};

    fn frame(system_id: SystemId, component_id: ComponentId, message: &dyn mavio::Message) -> Frame {
        mavio::Frame::builder()
            .sequence(0)
            .system_id(system_id)
            .component_id(component_id)
            .version(V2)
            .message(message)
            .unwrap()
            .build()
            .into_versionless()
    }

    fn config() -> RouterConfig {
        RouterConfig {
            streamreq_disabled: false,
            streamreq_frequency_hz: 4,
            version: HbVersion::V1,
            system_id: 125,
            component_id: 191,
        }
    }

    #[test]
    fn learns_new_peers() {
        let router = Router::new(config(), std::sync::Arc::new(Sequencer::new()));
        let channel = ChannelId::new(mavrouter_core::io::ConnectionId::new());
        let frame = frame(4, 5, &Heartbeat::default());

        let decision = router.on_frame(channel, &frame, Instant::now());
        assert!(decision.appeared);
        assert_eq!(decision.key.system_id, 4);
        assert_eq!(decision.key.component_id, 5);
    }

    #[test]
    fn second_frame_from_same_peer_does_not_appear_again() {
        let router = Router::new(config(), std::sync::Arc::new(Sequencer::new()));
        let channel = ChannelId::new(mavrouter_core::io::ConnectionId::new());
        let frame = frame(4, 5, &Heartbeat::default());

        router.on_frame(channel, &frame, Instant::now());
        let decision = router.on_frame(channel, &frame, Instant::now());
        assert!(!decision.appeared);
    }

    #[test]
    fn untargeted_frame_broadcasts() {
        let router = Router::new(config(), std::sync::Arc::new(Sequencer::new()));
        let channel = ChannelId::new(mavrouter_core::io::ConnectionId::new());
        let frame = frame(4, 5, &Heartbeat::default());

        let decision = router.on_frame(channel, &frame, Instant::now());
        assert!(matches!(decision.action, RouteAction::Broadcast));
    }

    #[test]
    fn targeted_frame_with_no_known_peer_is_unknown_target() {
        let router = Router::new(config(), std::sync::Arc::new(Sequencer::new()));
        let connection = mavrouter_core::io::ConnectionId::new();
        let channel = ChannelId::new(connection);
        let command = CommandLong {
            target_system: 6,
            target_component: 7,
            command: MavCmd::NavWaypoint,
            confirmation: 0,
            param1: 0.0,
            param2: 0.0,
            param3: 0.0,
            param4: 0.0,
            param5: 0.0,
            param6: 0.0,
            param7: 0.0,
        };
        let frame = frame(4, 5, &command);

        let decision = router.on_frame(channel, &frame, Instant::now());
        assert!(matches!(decision.action, RouteAction::UnknownTarget { .. }));
    }

    #[test]
    fn targeted_frame_routes_to_the_matching_peer() {
        let router = Router::new(config(), std::sync::Arc::new(Sequencer::new()));
        let connection = mavrouter_core::io::ConnectionId::new();
        let source = ChannelId::new(connection);
        let dest = ChannelId::new(connection);

        // Learn the destination peer first via a heartbeat on `dest`.
        router.on_frame(dest, &frame(6, 7, &Heartbeat::default()), Instant::now());

        let command = CommandLong {
            target_system: 6,
            target_component: 7,
            command: MavCmd::NavWaypoint,
            confirmation: 0,
            param1: 0.0,
            param2: 0.0,
            param3: 0.0,
            param4: 0.0,
            param5: 0.0,
            param6: 0.0,
            param7: 0.0,
        };
        let decision = router.on_frame(source, &frame(4, 5, &command), Instant::now());
        match decision.action {
            RouteAction::Unicast(channels) => assert_eq!(channels, vec![dest]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn system_broadcast_writes_a_multi_component_peer_only_once() {
        let router = Router::new(config(), std::sync::Arc::new(Sequencer::new()));
        let connection = mavrouter_core::io::ConnectionId::new();
        let source = ChannelId::new(connection);
        let dest = ChannelId::new(connection);

        // Two components of system 6 both learned on the same `dest` channel.
        router.on_frame(dest, &frame(6, 7, &Heartbeat::default()), Instant::now());
        router.on_frame(dest, &frame(6, 8, &Heartbeat::default()), Instant::now());

        let command = CommandLong {
            target_system: 6,
            target_component: 0,
            command: MavCmd::NavWaypoint,
            confirmation: 0,
            param1: 0.0,
            param2: 0.0,
            param3: 0.0,
            param4: 0.0,
            param5: 0.0,
            param6: 0.0,
            param7: 0.0,
        };
        let decision = router.on_frame(source, &frame(4, 5, &command), Instant::now());
        match decision.action {
            RouteAction::Unicast(channels) => assert_eq!(channels, vec![dest]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn self_loop_is_detected() {
        let router = Router::new(config(), std::sync::Arc::new(Sequencer::new()));
        let connection = mavrouter_core::io::ConnectionId::new();
        let channel = ChannelId::new(connection);

        router.on_frame(channel, &frame(6, 7, &Heartbeat::default()), Instant::now());

        let command = CommandLong {
            target_system: 6,
            target_component: 7,
            command: MavCmd::NavWaypoint,
            confirmation: 0,
            param1: 0.0,
            param2: 0.0,
            param3: 0.0,
            param4: 0.0,
            param5: 0.0,
            param6: 0.0,
            param7: 0.0,
        };
        let decision = router.on_frame(channel, &frame(6, 7, &command), Instant::now());
        assert!(matches!(decision.action, RouteAction::SelfLoop));
    }

    #[test]
    fn streamreq_suppression_drops_the_frame() {
        let router = Router::new(config(), std::sync::Arc::new(Sequencer::new()));
        let channel = ChannelId::new(mavrouter_core::io::ConnectionId::new());
        let request = RequestDataStream {
            target_system: 1,
            target_component: 1,
            req_stream_id: 0,
            req_message_rate: 4,
            start_stop: 1,
        };
        let decision = router.on_frame(channel, &frame(4, 5, &request), Instant::now());
        assert!(matches!(decision.action, RouteAction::Suppressed));
    }

    #[test]
    fn ardupilot_heartbeat_triggers_one_stream_request_batch() {
        let router = Router::new(config(), std::sync::Arc::new(Sequencer::new()));
        let channel = ChannelId::new(mavrouter_core::io::ConnectionId::new());
        let hb = Heartbeat {
            autopilot: MavAutopilot::Ardupilotmega,
            ..Default::default()
        };

        let decision = router.on_frame(channel, &frame(4, 5, &hb), Instant::now());
        let batch = decision.stream_request.expect("expected a stream-request batch");
        assert_eq!(batch.channel, channel);
        assert_eq!(batch.frames.len(), 7);

        // A second heartbeat shortly after must not trigger another batch.
        let decision = router.on_frame(channel, &frame(4, 5, &hb), Instant::now());
        assert!(decision.stream_request.is_none());
    }

    #[test]
    fn streamreq_disable_suppresses_the_engine_too() {
        let mut cfg = config();
        cfg.streamreq_disabled = true;
        let router = Router::new(cfg, std::sync::Arc::new(Sequencer::new()));
        let channel = ChannelId::new(mavrouter_core::io::ConnectionId::new());
        let hb = Heartbeat {
            autopilot: MavAutopilot::Ardupilotmega,
            ..Default::default()
        };

        let decision = router.on_frame(channel, &frame(4, 5, &hb), Instant::now());
        assert!(decision.stream_request.is_none());
    }

    #[test]
    fn channel_close_purges_its_peers() {
        let router = Router::new(config(), std::sync::Arc::new(Sequencer::new()));
        let channel = ChannelId::new(mavrouter_core::io::ConnectionId::new());
        router.on_frame(channel, &frame(4, 5, &Heartbeat::default()), Instant::now());

        let removed = router.on_channel_close(channel);
        assert_eq!(removed.len(), 1);

        let decision = router.on_frame(channel, &frame(4, 5, &Heartbeat::default()), Instant::now());
        assert!(decision.appeared);
    }

    #[test]
    fn sweep_purges_stale_peers_only() {
        let router = Router::new(config(), std::sync::Arc::new(Sequencer::new()));
        let channel = ChannelId::new(mavrouter_core::io::ConnectionId::new());
        let start = Instant::now();
        router.on_frame(channel, &frame(4, 5, &Heartbeat::default()), start);

        assert!(router.sweep(start).is_empty());

        let later = start + Duration::from_secs(31);
        let stale = router.sweep(later);
        assert_eq!(stale.len(), 1);
    }
}
