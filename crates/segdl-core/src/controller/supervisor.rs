//! Supervisor thread: samples progress on every tick, collects worker
//! outcomes, and decides how the job ends.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use tokio::sync::watch;

use crate::assembler::{assemble, remove_parts};
use crate::checksum::verify_sha256;
use crate::control::{JobSignal, StopReason};
use crate::downloader::{SegmentError, SegmentOutcome};
use crate::progress::{ProgressAggregator, ProgressSnapshot, SegmentCounters};

use super::job::{DownloadJob, JobStatus};

pub(super) struct Supervisor {
    pub(super) job: DownloadJob,
    pub(super) signal: Arc<JobSignal>,
    pub(super) counters: Arc<SegmentCounters>,
    pub(super) total_size: Arc<AtomicU64>,
    pub(super) aggregator: ProgressAggregator,
    pub(super) progress_tx: watch::Sender<ProgressSnapshot>,
    pub(super) outcomes: Receiver<(usize, SegmentOutcome)>,
    pub(super) workers: Vec<JoinHandle<()>>,
    pub(super) tick: Duration,
    pub(super) expected_sha256: Option<String>,
}

impl Supervisor {
    pub(super) fn run(mut self) -> JobStatus {
        let mut pending = self.workers.len();
        let mut first_failure: Option<(usize, SegmentError)> = None;

        while pending > 0 {
            match self.outcomes.recv_timeout(self.tick) {
                Ok((index, outcome)) => {
                    pending -= 1;
                    if let SegmentOutcome::Failed(e) = outcome {
                        if first_failure.is_none() {
                            // Remaining workers are pointless now.
                            self.signal.stop(StopReason::Aborted);
                            first_failure = Some((index, e));
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                // Every sender is gone: some worker died without reporting.
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.progress_tx.send_replace(self.aggregator.sample());
        }

        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                tracing::error!("segment worker panicked");
            }
        }
        self.progress_tx.send_replace(self.aggregator.sample());

        let status = self.finish(pending, first_failure);
        match &status {
            JobStatus::Completed(path) => tracing::info!(path = %path.display(), "job completed"),
            JobStatus::Cancelled => tracing::info!(url = %self.job.url, "job cancelled"),
            JobStatus::Failed(reason) => tracing::warn!(url = %self.job.url, %reason, "job failed"),
        }
        status
    }

    fn finish(&self, unreported: usize, failure: Option<(usize, SegmentError)>) -> JobStatus {
        let parts = self.job.part_paths();

        if self.signal.stop_reason() == Some(StopReason::Cancelled) {
            remove_parts(&parts);
            return JobStatus::Cancelled;
        }
        if let Some((index, e)) = failure {
            remove_parts(&parts);
            return JobStatus::Failed(format!("segment {}: {}", index, e));
        }
        if unreported > 0 {
            remove_parts(&parts);
            return JobStatus::Failed(format!(
                "{} segment worker(s) exited without reporting",
                unreported
            ));
        }

        for seg in &self.job.segments {
            let Some(range) = seg.range else { continue };
            let got = self.counters.get(seg.index);
            if got != range.len() {
                remove_parts(&parts);
                return JobStatus::Failed(format!(
                    "segment {}: expected {} bytes, got {}",
                    seg.index,
                    range.len(),
                    got
                ));
            }
        }

        let total = self.total_size.load(Ordering::Relaxed);
        let expected = (total > 0).then_some(total);
        if let Err(e) = assemble(&parts, &self.job.final_path, expected) {
            return JobStatus::Failed(format!("assembly failed: {:#}", e));
        }

        if let Some(hex) = &self.expected_sha256 {
            if let Err(reason) = self.check_digest(hex) {
                let _ = std::fs::remove_file(&self.job.final_path);
                return JobStatus::Failed(reason);
            }
        }

        JobStatus::Completed(self.job.final_path.clone())
    }

    fn check_digest(&self, expected: &str) -> Result<(), String> {
        match verify_sha256(&self.job.final_path, expected) {
            Ok(true) => Ok(()),
            Ok(false) => Err(format!(
                "sha256 mismatch for {}",
                self.job.final_path.display()
            )),
            Err(e) => Err(format!("sha256: {:#}", e)),
        }
    }
}

