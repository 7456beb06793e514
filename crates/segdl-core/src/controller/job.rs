//! Job description, lifecycle states and terminal status.

use std::fmt;
use std::path::PathBuf;

use crate::segmenter::{ByteRange, SegmentPolicy};

/// What the caller asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub url: String,
    pub destination_dir: PathBuf,
    /// `None` uses the configured `segment_policy`.
    pub policy: Option<SegmentPolicy>,
    /// Overrides the name derived from the URL.
    pub file_name: Option<String>,
    /// Lowercase or uppercase hex; checked after assembly.
    pub expected_sha256: Option<String>,
}

impl JobRequest {
    pub fn new(url: impl Into<String>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            destination_dir: destination_dir.into(),
            policy: None,
            file_name: None,
            expected_sha256: None,
        }
    }

    pub fn with_policy(mut self, policy: SegmentPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    pub fn with_expected_sha256(mut self, hex: impl Into<String>) -> Self {
        self.expected_sha256 = Some(hex.into());
        self
    }
}

/// Lifecycle: `Idle → Running ⇄ Paused → {Completed | Cancelled | Failed}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Idle,
    Running,
    Paused,
    Completed,
    Cancelled,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Cancelled | JobState::Failed)
    }

    /// Running or paused: workers exist.
    pub fn is_active(self) -> bool {
        matches!(self, JobState::Running | JobState::Paused)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Idle => "idle",
            JobState::Running => "running",
            JobState::Paused => "paused",
            JobState::Completed => "completed",
            JobState::Cancelled => "cancelled",
            JobState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// How a job ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// Path of the assembled file.
    Completed(PathBuf),
    Cancelled,
    Failed(String),
}

impl JobStatus {
    pub fn state(&self) -> JobState {
        match self {
            JobStatus::Completed(_) => JobState::Completed,
            JobStatus::Cancelled => JobState::Cancelled,
            JobStatus::Failed(_) => JobState::Failed,
        }
    }
}

/// One segment of a job and where its bytes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub index: usize,
    /// `None` in single-stream mode (size unknown).
    pub range: Option<ByteRange>,
    pub part_path: PathBuf,
}

/// A started job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadJob {
    pub url: String,
    pub destination_dir: PathBuf,
    pub file_name: String,
    pub final_path: PathBuf,
    /// Size reported by the probe; 0 = unknown.
    pub total_size: u64,
    pub content_type: Option<String>,
    /// Ordered by index.
    pub segments: Vec<Segment>,
}

impl DownloadJob {
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn part_paths(&self) -> Vec<PathBuf> {
        self.segments.iter().map(|s| s.part_path.clone()).collect()
    }
}
