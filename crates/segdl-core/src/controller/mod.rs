//! Job lifecycle: validate, probe, plan, spawn workers, pause/resume/cancel,
//! and report the terminal status.
//!
//! `start` runs the probe on the calling thread, then spawns one worker thread
//! per segment plus a supervisor thread that ticks progress and finishes the
//! job. All other methods return promptly except `cancel` and `wait`, which
//! block until every worker has exited.

mod job;
mod supervisor;

pub use job::{DownloadJob, JobRequest, JobState, JobStatus, Segment};

use std::fs;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicU64;
use std::sync::{mpsc, Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use thiserror::Error;
use tokio::sync::watch;

use crate::assembler::remove_parts;
use crate::config::{ConfigError, SegdlConfig, UnknownSizePolicy};
use crate::control::{JobSignal, StopReason};
use crate::downloader::{spawn_workers, SegmentTask, WorkerContext};
use crate::fetch_head::{self, HeadResult};
use crate::progress::{ProgressAggregator, ProgressSnapshot, SegmentCounters};
use crate::segmenter::{plan_segments, PlanError};
use crate::url_model::{derive_filename, part_path, sanitize_filename};

use self::supervisor::Supervisor;

/// Errors returned synchronously by [`DownloadController::start`].
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("URL is empty")]
    EmptyUrl,
    #[error("destination {} is not a writable directory", .0.display())]
    InvalidDestination(PathBuf),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("a job is already {0}")]
    InvalidState(JobState),
    #[error("server did not report a size and unknown_size is \"fail\"")]
    SizeUnknown,
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error("failed to spawn thread: {0}")]
    Spawn(#[source] io::Error),
}

#[derive(Debug)]
struct Inner {
    state: JobState,
    status: Option<JobStatus>,
}

/// State shared with the supervisor thread.
#[derive(Debug)]
struct Shared {
    inner: Mutex<Inner>,
    finished: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn finish(&self, status: JobStatus) {
        let mut inner = self.lock();
        inner.state = status.state();
        inner.status = Some(status);
        self.finished.notify_all();
    }
}

/// Handles of the current (or last) job.
struct Active {
    job: DownloadJob,
    signal: Arc<JobSignal>,
    progress: watch::Receiver<ProgressSnapshot>,
    supervisor: Option<JoinHandle<()>>,
}

/// Runs one download job at a time.
pub struct DownloadController {
    config: SegdlConfig,
    shared: Arc<Shared>,
    active: Mutex<Option<Active>>,
}

impl DownloadController {
    pub fn new(config: SegdlConfig) -> Self {
        Self {
            config,
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    state: JobState::Idle,
                    status: None,
                }),
                finished: Condvar::new(),
            }),
            active: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SegdlConfig {
        &self.config
    }

    fn active(&self) -> MutexGuard<'_, Option<Active>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Validates the request, probes the URL, plans segments and starts the
    /// workers. Allowed from `Idle` or a terminal state.
    pub fn start(&self, request: JobRequest) -> Result<DownloadJob, ControllerError> {
        let state = self.state();
        if state.is_active() {
            return Err(ControllerError::InvalidState(state));
        }

        self.config.validate()?;
        let policy = request.policy.unwrap_or(self.config.segment_policy);
        policy.validate()?;
        let url = request.url.trim().to_string();
        if url.is_empty() {
            return Err(ControllerError::EmptyUrl);
        }
        check_destination(&request.destination_dir)?;

        // No lock held here: HEAD can block for the whole connect timeout.
        let head = match fetch_head::probe(&url, &self.config.http) {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(url = %url, error = %format!("{:#}", e), "probe failed; size unknown");
                HeadResult::default()
            }
        };
        if head.is_html() {
            tracing::info!(url = %url, "URL serves an HTML page, downloading it as-is");
        }

        let mut active = self.active();
        // Another start may have won the race during HEAD.
        let state = self.state();
        if state.is_active() {
            return Err(ControllerError::InvalidState(state));
        }
        if let Some(old) = active.as_mut() {
            join_supervisor(old);
        }

        let file_name = request
            .file_name
            .as_deref()
            .map(sanitize_filename)
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| derive_filename(&url));
        let dir = request.destination_dir.clone();
        let final_path = dir.join(&file_name);
        let total_size = head.content_length.unwrap_or(0);
        let count = policy.segment_count(head.content_length);

        let segments: Vec<Segment> = if total_size == 0 {
            match self.config.unknown_size {
                UnknownSizePolicy::Fail => {
                    *active = None;
                    self.shared.finish(JobStatus::Failed("size unknown".to_string()));
                    return Err(ControllerError::SizeUnknown);
                }
                UnknownSizePolicy::SingleStream => {
                    tracing::info!(url = %url, nominal_segments = count, "size unknown, using one stream");
                    vec![Segment {
                        index: 0,
                        range: None,
                        part_path: part_path(&dir, &file_name, 0),
                    }]
                }
            }
        } else {
            plan_segments(total_size, count)?
                .into_iter()
                .enumerate()
                .map(|(index, range)| Segment {
                    index,
                    range: Some(range),
                    part_path: part_path(&dir, &file_name, index),
                })
                .collect()
        };

        let job = DownloadJob {
            url,
            destination_dir: dir,
            file_name,
            final_path,
            total_size,
            content_type: head.content_type,
            segments,
        };

        let signal = Arc::new(JobSignal::new());
        let counters = Arc::new(SegmentCounters::new(job.segment_count()));
        let total = Arc::new(AtomicU64::new(total_size));
        let aggregator = ProgressAggregator::new(
            Arc::clone(&counters),
            job.segments
                .iter()
                .map(|s| s.range.map(|r| r.len()))
                .collect(),
            Arc::clone(&total),
        );
        let (progress_tx, progress_rx) = watch::channel(aggregator.sample());
        let ctx = WorkerContext {
            http: self.config.http.clone(),
            chunk_size: self.config.chunk_size,
            signal: Arc::clone(&signal),
            counters: Arc::clone(&counters),
            total_size: Arc::clone(&total),
        };
        let tasks: Vec<SegmentTask> = job
            .segments
            .iter()
            .map(|s| SegmentTask {
                index: s.index,
                url: job.url.clone(),
                range: s.range,
                part_path: s.part_path.clone(),
            })
            .collect();

        {
            let mut inner = self.shared.lock();
            inner.state = JobState::Running;
            inner.status = None;
        }
        tracing::info!(
            url = %job.url,
            path = %job.final_path.display(),
            size = job.total_size,
            segments = job.segment_count(),
            "job started"
        );

        let (outcome_tx, outcome_rx) = mpsc::channel();
        let workers = match spawn_workers(tasks, &ctx, &outcome_tx) {
            Ok(w) => w,
            Err(e) => return Err(self.abort_start(&job, e)),
        };
        drop(outcome_tx);

        let supervisor = Supervisor {
            job: job.clone(),
            signal: Arc::clone(&signal),
            counters,
            total_size: total,
            aggregator,
            progress_tx,
            outcomes: outcome_rx,
            workers,
            tick: self.config.tick_interval(),
            expected_sha256: request.expected_sha256,
        };
        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("segdl-supervisor".to_string())
            .spawn(move || {
                let status = panic::catch_unwind(AssertUnwindSafe(|| supervisor.run()))
                    .unwrap_or_else(|_| JobStatus::Failed("supervisor panicked".to_string()));
                shared.finish(status);
            });
        let handle = match handle {
            Ok(h) => h,
            Err(e) => {
                // The closure (and with it the worker handles) is gone; stop
                // the workers so they exit on their next chunk.
                signal.stop(StopReason::Aborted);
                return Err(self.abort_start(&job, e));
            }
        };

        *active = Some(Active {
            job: job.clone(),
            signal,
            progress: progress_rx,
            supervisor: Some(handle),
        });
        Ok(job)
    }

    fn abort_start(&self, job: &DownloadJob, e: io::Error) -> ControllerError {
        remove_parts(&job.part_paths());
        self.shared
            .finish(JobStatus::Failed(format!("failed to spawn thread: {}", e)));
        ControllerError::Spawn(e)
    }

    /// Pauses every worker. Only effective while `Running`.
    pub fn pause(&self) -> bool {
        let active = self.active();
        let Some(a) = active.as_ref() else {
            return false;
        };
        let mut inner = self.shared.lock();
        if inner.state != JobState::Running || !a.signal.pause() {
            return false;
        }
        inner.state = JobState::Paused;
        tracing::info!(url = %a.job.url, "job paused");
        true
    }

    /// Resumes a paused job. Only effective while `Paused`.
    pub fn resume(&self) -> bool {
        let active = self.active();
        let Some(a) = active.as_ref() else {
            return false;
        };
        let mut inner = self.shared.lock();
        if inner.state != JobState::Paused || !a.signal.resume() {
            return false;
        }
        inner.state = JobState::Running;
        tracing::info!(url = %a.job.url, "job resumed");
        true
    }

    /// Cancels a running or paused job, waits for every worker to exit and
    /// returns the terminal status. `None` when no job is active.
    ///
    /// A cancel that arrives while the supervisor is already assembling the
    /// file does not undo the assembly; the returned status says `Completed`.
    pub fn cancel(&self) -> Option<JobStatus> {
        {
            let active = self.active();
            let a = active.as_ref()?;
            let inner = self.shared.lock();
            if !inner.state.is_active() {
                return None;
            }
            a.signal.stop(StopReason::Cancelled);
            tracing::info!(url = %a.job.url, "cancel requested");
        }
        self.wait()
    }

    /// Blocks until the current job reaches a terminal state. `None` when no
    /// job was ever started.
    pub fn wait(&self) -> Option<JobStatus> {
        {
            let mut inner = self.shared.lock();
            if inner.state == JobState::Idle {
                return None;
            }
            while inner.status.is_none() {
                inner = self
                    .shared
                    .finished
                    .wait(inner)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        }
        if let Some(a) = self.active().as_mut() {
            join_supervisor(a);
        }
        self.status()
    }

    pub fn state(&self) -> JobState {
        self.shared.lock().state
    }

    pub fn status(&self) -> Option<JobStatus> {
        self.shared.lock().status.clone()
    }

    pub fn job(&self) -> Option<DownloadJob> {
        self.active().as_ref().map(|a| a.job.clone())
    }

    /// Progress of the current job; `borrow()` for the latest snapshot,
    /// `changed()` to follow ticks.
    pub fn progress(&self) -> Option<watch::Receiver<ProgressSnapshot>> {
        self.active().as_ref().map(|a| a.progress.clone())
    }

    /// Forgets a finished job and returns to `Idle`. No-op while active.
    pub fn reset(&self) -> bool {
        let mut active = self.active();
        let mut inner = self.shared.lock();
        if inner.state.is_active() {
            return false;
        }
        if let Some(a) = active.as_mut() {
            join_supervisor(a);
        }
        *active = None;
        inner.state = JobState::Idle;
        inner.status = None;
        true
    }
}

impl Drop for DownloadController {
    fn drop(&mut self) {
        if self.state().is_active() {
            let _ = self.cancel();
        }
    }
}

fn join_supervisor(active: &mut Active) {
    if let Some(handle) = active.supervisor.take() {
        if handle.join().is_err() {
            tracing::error!("supervisor thread panicked");
        }
    }
}

/// The destination must be a directory this process can create files in.
fn check_destination(dir: &Path) -> Result<(), ControllerError> {
    let invalid = || ControllerError::InvalidDestination(dir.to_path_buf());
    if !fs::metadata(dir).map(|m| m.is_dir()).unwrap_or(false) {
        return Err(invalid());
    }
    // Permission bits alone miss ownership and ACLs; try a real file.
    match tempfile::Builder::new()
        .prefix(".segdl-write-check-")
        .tempfile_in(dir)
    {
        Ok(_removed_on_drop) => Ok(()),
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "destination not writable");
            Err(invalid())
        }
    }
}
