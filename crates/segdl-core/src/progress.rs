//! Progress reporting for a job (bytes done, speed, ETA, per-segment fractions).
//!
//! Workers bump their own counter in [`SegmentCounters`]; the
//! [`ProgressAggregator`] reads all counters on every tick and produces a
//! [`ProgressSnapshot`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Per-segment downloaded-byte counters. Each segment has exactly one writer.
#[derive(Debug)]
pub struct SegmentCounters {
    counts: Vec<AtomicU64>,
}

impl SegmentCounters {
    pub fn new(segment_count: usize) -> Self {
        Self {
            counts: (0..segment_count).map(|_| AtomicU64::new(0)).collect(),
        }
    }

    pub fn add(&self, index: usize, bytes: u64) {
        if let Some(c) = self.counts.get(index) {
            c.fetch_add(bytes, Ordering::Relaxed);
        }
    }

    pub fn get(&self, index: usize) -> u64 {
        self.counts
            .get(index)
            .map(|c| c.load(Ordering::Relaxed))
            .unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|c| c.load(Ordering::Relaxed)).sum()
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SegmentProgress {
    pub index: usize,
    pub downloaded: u64,
    /// Range length; 0 while unknown (single-stream download without a size).
    pub length: u64,
}

impl SegmentProgress {
    pub fn fraction(&self) -> f64 {
        if self.length == 0 {
            return 0.0;
        }
        self.downloaded as f64 / self.length as f64
    }
}

/// Snapshot of job progress at one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressSnapshot {
    /// Sum of all segment counters.
    pub downloaded: u64,
    /// Total size in bytes (0 = unknown).
    pub total_size: u64,
    pub elapsed: Duration,
    /// Average rate since start: downloaded / elapsed.
    pub bytes_per_sec: f64,
    /// `None` while the rate is zero or the size is unknown.
    pub eta: Option<Duration>,
    pub segments: Vec<SegmentProgress>,
}

impl ProgressSnapshot {
    /// Overall fraction in [0.0, 1.0]; 0 when the size is unknown.
    pub fn fraction(&self) -> f64 {
        if self.total_size == 0 {
            return 0.0;
        }
        (self.downloaded as f64 / self.total_size as f64).min(1.0)
    }
}

/// Samples the counters of one job.
#[derive(Debug, Clone)]
pub struct ProgressAggregator {
    counters: Arc<SegmentCounters>,
    /// Range length per segment; `None` for an unranged segment, which
    /// takes the job's total size once that is known.
    lengths: Vec<Option<u64>>,
    total_size: Arc<AtomicU64>,
    started: Instant,
}

impl ProgressAggregator {
    pub fn new(
        counters: Arc<SegmentCounters>,
        lengths: Vec<Option<u64>>,
        total_size: Arc<AtomicU64>,
    ) -> Self {
        Self {
            counters,
            lengths,
            total_size,
            started: Instant::now(),
        }
    }

    pub fn sample(&self) -> ProgressSnapshot {
        self.sample_at(self.started.elapsed())
    }

    /// Snapshot as if `elapsed` had passed since the job started.
    pub fn sample_at(&self, elapsed: Duration) -> ProgressSnapshot {
        let total_size = self.total_size.load(Ordering::Relaxed);
        let segments: Vec<SegmentProgress> = self
            .lengths
            .iter()
            .enumerate()
            .map(|(index, len)| SegmentProgress {
                index,
                downloaded: self.counters.get(index),
                length: len.unwrap_or(total_size),
            })
            .collect();
        let downloaded: u64 = segments.iter().map(|s| s.downloaded).sum();

        let secs = elapsed.as_secs_f64();
        let bytes_per_sec = if secs > 0.0 {
            downloaded as f64 / secs
        } else {
            0.0
        };
        let eta = if bytes_per_sec > 0.0 && total_size > 0 {
            let remaining = total_size.saturating_sub(downloaded);
            Some(Duration::from_secs_f64(remaining as f64 / bytes_per_sec))
        } else {
            None
        };

        ProgressSnapshot {
            downloaded,
            total_size,
            elapsed,
            bytes_per_sec,
            eta,
            segments,
        }
    }
}
