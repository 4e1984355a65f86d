//! End-to-end scenarios driving the real TCP connector/channel/supervisor stack (spec §16):
//! untargeted broadcast fan-out, targeted unicast delivery, an unknown target's silent drop,
//! and ArduPilot stream-request arbitration. Every peer in these tests is a plain `TcpStream`
//! encoding/decoding frames with `mavio`'s own sender/receiver, standing in for a real GCS or
//! flight controller talking to the router over the wire.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mavio::dialects::common::enums::{MavAutopilot, MavCmd};
use mavio::dialects::common::messages::{CommandLong, Heartbeat, RequestDataStream};
use mavio::protocol::V2;
use tokio::net::TcpStream;
use tokio::time::timeout;

use mavrouter_core::io::{
    ChannelId, ChannelTimeouts, ConnectionDetails, ConnectionInfo, Endpoint, Event, Retry,
    Supervisor, SupervisorHandle, TcpServer,
};
use mavrouter_core::protocol::Frame;
use mavrouter::router::{RouteAction, Router, RouterConfig};
use mavrouter::sequence::Sequencer;
use mavrouter::config::HbVersion;

const RECV_WAIT: Duration = Duration::from_secs(2);

fn free_addr() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn router_config() -> RouterConfig {
    RouterConfig {
        streamreq_disabled: false,
        streamreq_frequency_hz: 4,
        version: HbVersion::V1,
        system_id: 125,
        component_id: 191,
    }
}

fn build_frame(system_id: u8, component_id: u8, message: &dyn mavio::Message) -> Frame {
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

async fn send(stream: &mut TcpStream, frame: &Frame) {
    mavio::AsyncSender::new(stream).send(frame).await.unwrap();
}

async fn recv(stream: &mut TcpStream) -> Frame {
    timeout(RECV_WAIT, mavio::AsyncReceiver::new(stream).recv())
        .await
        .expect("peer never received a frame")
        .unwrap()
        .into_versionless()
}

async fn recv_none(stream: &mut TcpStream) {
    let outcome = timeout(Duration::from_millis(200), mavio::AsyncReceiver::new(stream).recv()).await;
    assert!(outcome.is_err(), "peer unexpectedly received a frame");
}

async fn spawn_tcp_server(supervisor: &mut Supervisor) -> SocketAddr {
    let addr = free_addr();
    supervisor.spawn(Endpoint::new(
        ConnectionInfo::new(ConnectionDetails::TcpServer { bind_addr: addr }),
        Box::new(TcpServer::new(addr)),
        Retry::Never,
        ChannelTimeouts::default(),
    ));
    addr
}

/// Waits for the next `ChannelOpen` event and returns its id — used right after connecting a
/// peer, so channels are attributed to peers in connection order rather than accept order.
async fn expect_channel_open(supervisor: &mut Supervisor) -> ChannelId {
    loop {
        match supervisor.events().await.expect("supervisor closed") {
            Event::ChannelOpen(info) => return info.id(),
            _ => continue,
        }
    }
}

/// Processes exactly one `Event::Frame`, replicating `app::handle_event`'s routing branch
/// (minus logging and dumping, which have their own unit tests).
async fn route_next_frame(
    supervisor: &mut Supervisor,
    router: &Router,
    write_handle: &SupervisorHandle,
) -> (ChannelId, Frame, mavrouter::router::FrameDecision) {
    loop {
        match supervisor.events().await.expect("supervisor closed") {
            Event::Frame(channel, frame) => {
                let decision = router.on_frame(channel, &frame, Instant::now());

                if let Some(batch) = &decision.stream_request {
                    for request in &batch.frames {
                        write_handle.write_to(Arc::new(request.clone()), batch.channel);
                    }
                }

                match &decision.action {
                    RouteAction::Unicast(channels) => {
                        let fixed = Arc::new(write_handle.fix_frame(&frame));
                        for destination in channels {
                            write_handle.write_to(Arc::clone(&fixed), *destination);
                        }
                    }
                    RouteAction::Broadcast => {
                        let fixed = Arc::new(write_handle.fix_frame(&frame));
                        write_handle.write_except(fixed, channel);
                    }
                    _ => {}
                }

                return (channel, (*frame).clone(), decision);
            }
            _ => continue,
        }
    }
}

#[tokio::test]
async fn untargeted_frame_is_broadcast_to_every_other_peer() {
    let mut supervisor = Supervisor::new();
    let addr = spawn_tcp_server(&mut supervisor).await;
    let write_handle = supervisor.handle();
    let router = Router::new(router_config(), Arc::new(Sequencer::new()));

    let mut peer_a = TcpStream::connect(addr).await.unwrap();
    expect_channel_open(&mut supervisor).await;
    let mut peer_b = TcpStream::connect(addr).await.unwrap();
    expect_channel_open(&mut supervisor).await;

    send(&mut peer_a, &build_frame(4, 5, &Heartbeat::default())).await;
    let (_channel, _frame, decision) = route_next_frame(&mut supervisor, &router, &write_handle).await;
    assert!(matches!(decision.action, RouteAction::Broadcast));

    let forwarded = recv(&mut peer_b).await;
    assert_eq!(forwarded.system_id(), 4);
    assert_eq!(forwarded.component_id(), 5);

    recv_none(&mut peer_a).await;
}

#[tokio::test]
async fn targeted_frame_is_unicast_to_the_learned_peer() {
    let mut supervisor = Supervisor::new();
    let addr = spawn_tcp_server(&mut supervisor).await;
    let write_handle = supervisor.handle();
    let router = Router::new(router_config(), Arc::new(Sequencer::new()));

    let mut peer_a = TcpStream::connect(addr).await.unwrap();
    expect_channel_open(&mut supervisor).await;
    let mut peer_b = TcpStream::connect(addr).await.unwrap();
    expect_channel_open(&mut supervisor).await;

    // Learn peer_b as system 6 / component 7.
    send(&mut peer_b, &build_frame(6, 7, &Heartbeat::default())).await;
    route_next_frame(&mut supervisor, &router, &write_handle).await;

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
    send(&mut peer_a, &build_frame(4, 5, &command)).await;
    let (_channel, _frame, decision) = route_next_frame(&mut supervisor, &router, &write_handle).await;
    assert!(matches!(decision.action, RouteAction::Unicast(_)));

    let forwarded = recv(&mut peer_b).await;
    assert_eq!(forwarded.system_id(), 4);
    assert_eq!(forwarded.component_id(), 5);
}

#[tokio::test]
async fn frame_targeting_an_unknown_peer_is_dropped_silently() {
    let mut supervisor = Supervisor::new();
    let addr = spawn_tcp_server(&mut supervisor).await;
    let write_handle = supervisor.handle();
    let router = Router::new(router_config(), Arc::new(Sequencer::new()));

    let mut peer_a = TcpStream::connect(addr).await.unwrap();
    expect_channel_open(&mut supervisor).await;
    let mut peer_b = TcpStream::connect(addr).await.unwrap();
    expect_channel_open(&mut supervisor).await;

    let command = CommandLong {
        target_system: 99,
        target_component: 99,
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
    send(&mut peer_a, &build_frame(4, 5, &command)).await;
    let (_channel, _frame, decision) = route_next_frame(&mut supervisor, &router, &write_handle).await;
    assert!(matches!(decision.action, RouteAction::UnknownTarget { .. }));

    recv_none(&mut peer_b).await;
}

#[tokio::test]
async fn ardupilot_heartbeat_gets_a_seven_stream_request_batch_back() {
    let mut supervisor = Supervisor::new();
    let addr = spawn_tcp_server(&mut supervisor).await;
    let write_handle = supervisor.handle();
    let router = Router::new(router_config(), Arc::new(Sequencer::new()));

    let mut peer_a = TcpStream::connect(addr).await.unwrap();
    expect_channel_open(&mut supervisor).await;

    let hb = Heartbeat {
        autopilot: MavAutopilot::Ardupilotmega,
        ..Default::default()
    };
    send(&mut peer_a, &build_frame(4, 5, &hb)).await;
    let (_channel, _frame, decision) = route_next_frame(&mut supervisor, &router, &write_handle).await;
    let batch = decision.stream_request.expect("expected a stream-request batch");
    assert_eq!(batch.frames.len(), 7);

    let expected_id = mavrouter::router::request_data_stream_message_id();
    for _ in 0..7 {
        let request = recv(&mut peer_a).await;
        assert_eq!(request.message_id(), expected_id);
    }
}

#[tokio::test]
async fn requestdatastream_frames_are_suppressed_not_forwarded() {
    let mut supervisor = Supervisor::new();
    let addr = spawn_tcp_server(&mut supervisor).await;
    let write_handle = supervisor.handle();
    let router = Router::new(router_config(), Arc::new(Sequencer::new()));

    let mut peer_a = TcpStream::connect(addr).await.unwrap();
    expect_channel_open(&mut supervisor).await;
    let mut peer_b = TcpStream::connect(addr).await.unwrap();
    expect_channel_open(&mut supervisor).await;

    let request = RequestDataStream {
        target_system: 1,
        target_component: 1,
        req_stream_id: 0,
        req_message_rate: 4,
        start_stop: 1,
    };
    send(&mut peer_a, &build_frame(4, 5, &request)).await;
    let (_channel, _frame, decision) = route_next_frame(&mut supervisor, &router, &write_handle).await;
    assert!(matches!(decision.action, RouteAction::Suppressed));

    recv_none(&mut peer_b).await;
}
