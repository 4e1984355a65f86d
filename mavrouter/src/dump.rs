//! Segmented tlog writer with bounded, backpressure-free queueing (spec §4.7).
//!
//! Grounded on `pkg/dumper/dumper.go`: a single consumer task draining a bounded channel of
//! `(time, frame)` entries, rotating to a new file whenever the gap between the segment's
//! start and an entry's *captured* time exceeds `DumpDuration`. The producer side uses
//! `try_send` exactly as the Go original's `select { ... default: log.Printf(...) }` does,
//! so a stalled disk degrades to dropped frames rather than stalling the router.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Local};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::sync::mpsc;

use mavrouter_core::protocol::Frame;
use mavrouter_core::utils::Closer;

use crate::config::DumpConfig;

/// Capacity of the bounded entry queue (spec §4.7).
const QUEUE_CAPACITY: usize = 128;

/// One frame captured at a point in time, queued for the dump writer task.
struct Entry {
    time: SystemTime,
    frame: std::sync::Arc<Frame>,
}

/// Producer handle: hands frames to the dump writer task without blocking the router.
pub struct DumpManager {
    sender: mpsc::Sender<Entry>,
}

impl DumpManager {
    /// Creates a dump manager and spawns its writer task, consuming until `closer` cancels.
    pub fn spawn(config: DumpConfig, closer: Closer) -> (Self, tokio::task::JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        let handle = tokio::spawn(run(config, receiver, closer));
        (Self { sender }, handle)
    }

    /// Queues `frame`, captured at `time`, for writing.
    ///
    /// `time` must be captured by the caller at the moment the frame was received — the
    /// rotation decision is keyed off this captured time, not the time the writer task gets
    /// around to handling the entry (spec §4.7, "not write time").
    ///
    /// Drops and logs on a full queue (disk too slow) or a closed one (already shut down);
    /// neither is treated as an error the router needs to react to.
    pub fn submit(&self, frame: std::sync::Arc<Frame>, time: SystemTime) {
        match self.sender.try_send(Entry { time, frame }) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                log::warn!("disk is too slow, discarding frame");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}

struct Segment {
    file: BufWriter<File>,
    started: SystemTime,
}

async fn run(config: DumpConfig, mut receiver: mpsc::Receiver<Entry>, closer: Closer) {
    let mut segment: Option<Segment> = None;

    loop {
        tokio::select! {
            biased;
            _ = closer.cancelled() => break,
            entry = receiver.recv() => {
                match entry {
                    Some(entry) => {
                        if let Err(err) = handle_entry(&config, &mut segment, entry).await {
                            log::warn!("dump manager: {err}");
                        }
                    }
                    None => break,
                }
            }
        }
    }

    if let Some(mut segment) = segment {
        let _ = segment.file.flush().await;
    }
}

async fn handle_entry(
    config: &DumpConfig,
    segment: &mut Option<Segment>,
    entry: Entry,
) -> std::io::Result<()> {
    let needs_rotation = match segment {
        None => true,
        Some(segment) => {
            entry
                .time
                .duration_since(segment.started)
                .unwrap_or(Duration::ZERO)
                > config.duration
        }
    };

    if needs_rotation {
        if let Some(mut old) = segment.take() {
            old.file.flush().await?;
        }
        *segment = Some(open_segment(config, entry.time).await?);
    }

    let segment = segment.as_mut().expect("segment opened above");
    write_record(&mut segment.file, &entry).await
}

async fn open_segment(config: &DumpConfig, started: SystemTime) -> std::io::Result<Segment> {
    let path = segment_path(config, started);
    if let Some(dir) = path.parent() {
        ensure_dir(dir).await?;
    }
    let file = BufWriter::new(File::create(&path).await?);
    Ok(Segment { file, started })
}

fn segment_path(config: &DumpConfig, started: SystemTime) -> PathBuf {
    let timestamp: DateTime<Local> = started.into();
    let file_name = timestamp.format(&config.file_name_format).to_string();
    config.dir.join(file_name)
}

async fn write_record(writer: &mut BufWriter<File>, entry: &Entry) -> std::io::Result<()> {
    let micros = entry
        .time
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_micros() as u64;
    writer.write_all(&micros.to_be_bytes()).await?;

    let mut sender = mavio::AsyncSender::new(&mut *writer);
    sender
        .send(entry.frame.as_ref())
        .await
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::Other, err.to_string()))?;

    writer.flush().await
}

#[cfg(unix)]
async fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::set_permissions(dir, std::fs::Permissions::from_mode(0o755)).await
}

#[cfg(not(unix))]
async fn ensure_dir(dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use mavio::dialects::common::messages::Heartbeat;
    use mavio::protocol::V2;
    use std::sync::Arc;
    use std::time::Duration as StdDuration;

    fn frame() -> Arc<Frame> {
        let frame = mavio::Frame::builder()
            .sequence(0)
            .system_id(1)
            .component_id(1)
            .version(V2)
            .message(&Heartbeat::default())
            .unwrap()
            .build();
        Arc::new(frame.into_versionless())
    }

    fn config(dir: &Path, duration: StdDuration) -> DumpConfig {
        DumpConfig {
            dir: dir.to_path_buf(),
            file_name_format: "%Y-%m-%d_%H-%M-%S.tlog".to_string(),
            duration,
        }
    }

    #[tokio::test]
    async fn writes_one_segment_and_flushes_on_shutdown() {
        let tmp = tempdir();
        let closer = Closer::new();
        let (manager, handle) = DumpManager::spawn(config(&tmp, StdDuration::from_secs(3600)), closer.clone());

        manager.submit(frame(), SystemTime::now());
        tokio::time::sleep(StdDuration::from_millis(20)).await;

        closer.cancel();
        handle.await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(&tmp).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let file = entries.into_iter().next().unwrap().unwrap();
        let bytes = std::fs::read(file.path()).unwrap();
        assert!(bytes.len() > 8);
    }

    #[tokio::test]
    async fn rotates_into_a_second_segment_after_duration_elapses() {
        let tmp = tempdir();
        let closer = Closer::new();
        let (manager, handle) = DumpManager::spawn(config(&tmp, StdDuration::from_millis(1)), closer.clone());

        let t1 = SystemTime::now();
        manager.submit(frame(), t1);
        tokio::time::sleep(StdDuration::from_millis(5)).await;
        let t2 = t1 + StdDuration::from_secs(2);
        manager.submit(frame(), t2);
        tokio::time::sleep(StdDuration::from_millis(20)).await;

        closer.cancel();
        handle.await.unwrap();

        let entries: Vec<_> = std::fs::read_dir(&tmp).unwrap().collect();
        assert_eq!(entries.len(), 2);
    }

    fn tempdir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        dir.push(format!("mavrouter-dump-test-{:?}", std::thread::current().id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
