pub mod config;
pub mod logging;

pub mod assembler;
pub mod checksum;
pub mod control;
pub mod controller;
pub mod downloader;
pub mod fetch_head;
mod http;
pub mod progress;
pub mod segmenter;
pub mod url_model;

pub use config::SegdlConfig;
pub use controller::{ControllerError, DownloadController, DownloadJob, JobRequest, JobState, JobStatus};
pub use progress::ProgressSnapshot;
pub use segmenter::SegmentPolicy;
