//! Periodic heartbeat emission (spec §4.5).
//!
//! Grounded on the teacher's `asnc::handler::heartbeats::HeartbeatEmitter`: a sequence
//! counter, `Frame::builder()...build()`, and a `tokio::time::sleep` loop that stops when
//! sending fails or the node is no longer active. Generalized here from the teacher's
//! single-connection emitter (one `AsyncConnSender`) to one that broadcasts across every live
//! channel via [`SupervisorHandle::write_all`], since this router's heartbeat is not addressed
//! to any one peer.

use std::sync::Arc;

use mavio::protocol::{V1, V2};

use mavrouter_core::io::SupervisorHandle;
use mavrouter_core::protocol::build_heartbeat;
use mavrouter_core::utils::Closer;

use crate::config::{HbVersion, HeartbeatConfig};
use crate::sequence::Sequencer;

/// Runs the heartbeat emitter until `closer` is cancelled.
///
/// A no-op if `config.disabled` (spec §4.5, `HbDisable`) — still awaits cancellation so
/// callers can `tokio::spawn` it unconditionally without special-casing the disabled case.
pub async fn spawn(
    config: HeartbeatConfig,
    supervisor: SupervisorHandle,
    sequencer: Arc<Sequencer>,
    closer: Closer,
) {
    if config.disabled {
        closer.cancelled().await;
        return;
    }

    let mut ticker = tokio::time::interval(config.period);
    ticker.tick().await; // first tick fires immediately; emit on the following ones.

    loop {
        tokio::select! {
            _ = closer.cancelled() => return,
            _ = ticker.tick() => emit(&config, &supervisor, &sequencer),
        }
    }
}

fn emit(config: &HeartbeatConfig, supervisor: &SupervisorHandle, sequencer: &Sequencer) {
    let sequence = sequencer.next();
    let built = match config.version {
        HbVersion::V1 => build_heartbeat(V1, config.system_id, config.component_id, sequence),
        HbVersion::V2 => build_heartbeat(V2, config.system_id, config.component_id, sequence),
    };

    match built {
        Ok(frame) => supervisor.write_all(Arc::new(frame)),
        Err(err) => log::warn!("failed to build heartbeat frame: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mavrouter_core::io::Supervisor;
    use std::time::Duration;

    fn config(disabled: bool) -> HeartbeatConfig {
        HeartbeatConfig {
            disabled,
            version: HbVersion::V1,
            system_id: 125,
            component_id: 191,
            period: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn disabled_emitter_returns_once_cancelled() {
        let closer = Closer::new();
        let supervisor = Supervisor::new().handle();
        let sequencer = Arc::new(Sequencer::new());

        let handle = tokio::spawn(spawn(config(true), supervisor, sequencer, closer.clone()));
        closer.cancel();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn enabled_emitter_ticks_until_cancelled() {
        let closer = Closer::new();
        let supervisor = Supervisor::new().handle();
        let sequencer = Arc::new(Sequencer::new());

        let handle = tokio::spawn(spawn(
            config(false),
            supervisor,
            sequencer,
            closer.clone(),
        ));

        tokio::time::sleep(Duration::from_millis(35)).await;
        closer.cancel();
        handle.await.unwrap();
    }
}
