//! Wires every subsystem together and drives the main event loop (spec §4.8).
//!
//! Grounded on `main.go`'s initialization order (parse config → open node/channels → start
//! error manager → start router → optionally start the dumper → run the main loop) and
//! `node_handler.go`'s `select`-over-events-plus-ticker shape, generalized per spec §9's
//! "periodic timers vs. one-shot sleep+loop" redesign flag: every wait point races its timer
//! against the shared cancellation token instead of sleeping out a fixed interval.

use std::sync::Arc;
use std::time::{Instant, SystemTime};

use mavrouter_core::io::{Event, Supervisor};
use mavrouter_core::utils::Closer;

use crate::config::Config;
use crate::dump::DumpManager;
use crate::endpoints;
use crate::error_manager::{self, ErrorManager};
use crate::heartbeat;
use crate::router::{RouteAction, Router, RouterConfig, SWEEP_INTERVAL};
use crate::sequence::Sequencer;

/// Runs the router until every endpoint stops on its own or a shutdown signal arrives.
pub async fn run(config: Config) {
    let mut supervisor = Supervisor::new();
    for spec in &config.endpoints {
        supervisor.spawn(endpoints::build(spec, config.timeouts));
    }
    if !config.quiet {
        log::info!("router started with {} endpoint(s)", config.endpoints.len());
    }

    let write_handle = supervisor.handle();
    let sequencer = Arc::new(Sequencer::new());

    let router = Router::new(
        RouterConfig {
            streamreq_disabled: config.stream_request.disabled,
            streamreq_frequency_hz: config.stream_request.frequency_hz,
            version: config.heartbeat.version,
            system_id: config.heartbeat.system_id,
            component_id: config.heartbeat.component_id,
        },
        Arc::clone(&sequencer),
    );

    let error_manager = Arc::new(if config.print_errors {
        ErrorManager::verbose()
    } else {
        ErrorManager::aggregated(error_manager::DEFAULT_REPORT_INTERVAL)
    });

    // A single token for every ancillary task (error manager ticker, heartbeat emitter, dump
    // manager). The supervisor keeps its own, covering just the endpoint connectors, cancelled
    // separately by `supervisor.shutdown()` below — joining it only after these tasks have
    // dropped their `SupervisorHandle` clones keeps shutdown ordered without needing `Arc`
    // around the whole `Supervisor`.
    let tasks_closer = Closer::new();
    let mut tasks = Vec::new();

    tasks.push(tokio::spawn({
        let error_manager = Arc::clone(&error_manager);
        let closer = tasks_closer.child_token();
        async move { error_manager.spawn(closer).await }
    }));

    tasks.push(tokio::spawn(heartbeat::spawn(
        config.heartbeat.clone(),
        write_handle.clone(),
        sequencer,
        tasks_closer.child_token(),
    )));

    let dump_manager = config.dump.clone().map(|dump_config| {
        let (manager, handle) = DumpManager::spawn(dump_config, tasks_closer.child_token());
        tasks.push(handle);
        manager
    });

    let mut sweep_ticker = tokio::time::interval(SWEEP_INTERVAL);
    sweep_ticker.tick().await; // first tick fires immediately; sweep on the following ones.

    loop {
        tokio::select! {
            event = supervisor.events() => {
                match event {
                    Some(event) => {
                        handle_event(
                            event,
                            &config,
                            &router,
                            &write_handle,
                            dump_manager.as_ref(),
                            &error_manager,
                        );
                    }
                    None => break,
                }
            }
            _ = sweep_ticker.tick() => {
                for key in router.sweep(Instant::now()) {
                    log::info!("node disappeared: {key:?}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("shutdown requested");
                break;
            }
        }
    }

    tasks_closer.cancel();
    for task in tasks {
        let _ = task.await;
    }
    supervisor.shutdown().await;
}

fn handle_event(
    event: Event,
    config: &Config,
    router: &Router,
    write_handle: &mavrouter_core::io::SupervisorHandle,
    dump_manager: Option<&DumpManager>,
    error_manager: &ErrorManager,
) {
    match event {
        Event::ChannelOpen(info) => {
            if !config.quiet {
                log::info!("channel opened: {info}");
            }
        }
        Event::ChannelClose(channel, cause) => {
            if !config.quiet {
                match &cause {
                    Some(err) => log::info!("channel closed: {channel:?} ({err})"),
                    None => log::info!("channel closed: {channel:?}"),
                }
            }
            for key in router.on_channel_close(channel) {
                log::info!("node disappeared: {key:?}");
            }
        }
        Event::ParseError(_channel, error) => {
            error_manager.process_error(&error);
        }
        Event::Frame(channel, frame) => {
            if config.print {
                log::info!(
                    "frame: sid={} cid={} msg_id={} from {channel:?}",
                    frame.system_id(),
                    frame.component_id(),
                    frame.message_id(),
                );
            }

            if let Some(dump_manager) = dump_manager {
                dump_manager.submit(Arc::clone(&frame), SystemTime::now());
            }

            let decision = router.on_frame(channel, &frame, Instant::now());
            if decision.appeared {
                log::info!("node appeared: {:?}", decision.key);
            }

            if let Some(batch) = decision.stream_request {
                log::info!("requesting streams to {:?}", decision.key);
                for request in batch.frames {
                    write_handle.write_to(Arc::new(request), batch.channel);
                }
            }

            match decision.action {
                RouteAction::Suppressed => {}
                RouteAction::SelfLoop => {
                    log::warn!("self-loop detected for {:?}, dropping frame", decision.key);
                }
                RouteAction::UnknownTarget { system_id, component_id } => {
                    log::warn!(
                        "unknown target sid={system_id} cid={component_id}, dropping frame"
                    );
                }
                RouteAction::Unicast(channels) => {
                    let fixed = Arc::new(write_handle.fix_frame(&frame));
                    for destination in channels {
                        write_handle.write_to(Arc::clone(&fixed), destination);
                    }
                }
                RouteAction::Broadcast => {
                    let fixed = Arc::new(write_handle.fix_frame(&frame));
                    write_handle.write_except(fixed, channel);
                }
            }
        }
    }
}
