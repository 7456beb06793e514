//! Segment workers.
//!
//! One thread per segment. Each worker fetches its byte range (or the whole
//! body in single-stream mode) into its own part file, bumps its counter in
//! [`SegmentCounters`] after every chunk and reports exactly one
//! [`SegmentOutcome`] back to the supervisor.

mod segment;

pub use segment::run_segment;

use std::io;
use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use thiserror::Error;

use crate::config::HttpConfig;
use crate::control::{JobSignal, StopReason};
use crate::progress::SegmentCounters;
use crate::segmenter::ByteRange;

/// Work item for one segment worker.
#[derive(Debug, Clone)]
pub struct SegmentTask {
    pub index: usize,
    pub url: String,
    /// `None` downloads the whole body with a plain GET (size unknown).
    pub range: Option<ByteRange>,
    pub part_path: PathBuf,
}

/// State shared by every worker of one job.
#[derive(Debug, Clone)]
pub struct WorkerContext {
    pub http: HttpConfig,
    /// Receive buffer size; pause/cancel are observed once per chunk.
    pub chunk_size: usize,
    pub signal: Arc<JobSignal>,
    pub counters: Arc<SegmentCounters>,
    /// Job total size; a single-stream worker fills it in from `Content-Length`.
    pub total_size: Arc<AtomicU64>,
}

/// Terminal result of one worker.
#[derive(Debug)]
pub enum SegmentOutcome {
    Completed { bytes: u64 },
    Cancelled,
    Failed(SegmentError),
}

#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("create part file {}: {source}", path.display())]
    CreatePart {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{0}")]
    Curl(#[from] curl::Error),
    #[error("HTTP {0}")]
    Http(u32),
    /// A ranged request was not answered with 206 Partial Content.
    #[error("server ignored the range request (HTTP {0})")]
    RangeIgnored(u32),
    #[error("incomplete segment: expected {expected} bytes, got {received}")]
    Incomplete { expected: u64, received: u64 },
    #[error("storage: {0}")]
    Storage(#[source] io::Error),
}

/// Spawns one named worker thread per task. Each sends `(index, outcome)` on
/// `outcomes` when it finishes.
pub fn spawn_workers(
    tasks: Vec<SegmentTask>,
    ctx: &WorkerContext,
    outcomes: &mpsc::Sender<(usize, SegmentOutcome)>,
) -> io::Result<Vec<JoinHandle<()>>> {
    let mut handles = Vec::with_capacity(tasks.len());
    for task in tasks {
        let worker_ctx = ctx.clone();
        let tx = outcomes.clone();
        let handle = thread::Builder::new()
            .name(format!("segdl-seg-{}", task.index))
            .spawn(move || {
                let outcome = run_segment(&task, &worker_ctx);
                let _ = tx.send((task.index, outcome));
            });
        match handle {
            Ok(h) => handles.push(h),
            Err(e) => {
                // Already-running workers must not outlive the failed start.
                ctx.signal.stop(StopReason::Aborted);
                for h in handles {
                    let _ = h.join();
                }
                return Err(e);
            }
        }
    }
    Ok(handles)
}
