//! `segdl get` – download one file with live progress and stdin control.

use anyhow::{Context, Result};
use segdl_core::config::SegdlConfig;
use segdl_core::{DownloadController, JobRequest, JobStatus, SegmentPolicy};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::format::{format_progress, mib};

const PROGRESS_INTERVAL_MS: u64 = 500;

/// Exit code for a cancelled job (as for SIGINT).
const EXIT_CANCELLED: i32 = 130;

#[derive(Debug)]
pub struct GetArgs {
    pub url: String,
    pub dir: Option<PathBuf>,
    pub segments: Option<SegmentPolicy>,
    pub output: Option<String>,
    pub sha256: Option<String>,
}

impl GetArgs {
    fn into_request(self) -> Result<JobRequest> {
        let dir = match self.dir {
            Some(d) => d,
            None => std::env::current_dir().context("current directory")?,
        };
        let mut request = JobRequest::new(self.url, dir);
        if let Some(policy) = self.segments {
            request = request.with_policy(policy);
        }
        if let Some(name) = self.output {
            request = request.with_file_name(name);
        }
        if let Some(hex) = self.sha256 {
            request = request.with_expected_sha256(hex);
        }
        Ok(request)
    }
}

pub async fn run_get(cfg: SegdlConfig, args: GetArgs) -> Result<i32> {
    let request = args.into_request()?;
    let controller = Arc::new(DownloadController::new(cfg));

    let starter = Arc::clone(&controller);
    let job = tokio::task::spawn_blocking(move || starter.start(request))
        .await
        .context("start task")??;

    let size = if job.total_size > 0 {
        format!("{:.1} MiB", mib(job.total_size))
    } else {
        "size unknown".to_string()
    };
    println!(
        "{} -> {} ({}, {} segment(s))",
        job.url,
        job.final_path.display(),
        size,
        job.segment_count()
    );
    println!("type p + Enter to pause, r to resume, c to cancel");

    let mut rx = controller.progress().context("job has no progress channel")?;
    let printer = tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(PROGRESS_INTERVAL_MS));
        loop {
            interval.tick().await;
            // Err once the supervisor has dropped the sender.
            let finished = rx.has_changed().is_err();
            println!("  {}", format_progress(&rx.borrow_and_update()));
            if finished {
                break;
            }
        }
    });

    spawn_stdin_control(Arc::clone(&controller));

    let waiter = Arc::clone(&controller);
    let mut wait = tokio::task::spawn_blocking(move || waiter.wait());
    let status = tokio::select! {
        res = &mut wait => res.context("wait task")?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("cancelling...");
            let canceller = Arc::clone(&controller);
            tokio::task::spawn_blocking(move || canceller.cancel())
                .await
                .context("cancel task")?;
            wait.await.context("wait task")?
        }
    };
    let _ = printer.await;

    match status {
        Some(JobStatus::Completed(path)) => {
            println!("saved {}", path.display());
            Ok(0)
        }
        Some(JobStatus::Cancelled) => {
            println!("cancelled");
            Ok(EXIT_CANCELLED)
        }
        Some(JobStatus::Failed(reason)) => {
            eprintln!("download failed: {}", reason);
            Ok(1)
        }
        None => anyhow::bail!("job ended without a status"),
    }
}

/// Reads `p`/`r`/`c` lines from stdin and applies them to the job. The
/// thread ends at EOF or once the job is no longer active.
fn spawn_stdin_control(controller: Arc<DownloadController>) {
    let spawned = std::thread::Builder::new()
        .name("segdl-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                match line.trim() {
                    "p" | "pause" => {
                        if controller.pause() {
                            println!("paused");
                        }
                    }
                    "r" | "resume" => {
                        if controller.resume() {
                            println!("resumed");
                        }
                    }
                    "c" | "cancel" => {
                        controller.cancel();
                        break;
                    }
                    "" => {}
                    other => println!("unknown command {:?} (p, r or c)", other),
                }
                if !controller.state().is_active() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        tracing::warn!(error = %e, "stdin control unavailable");
    }
}
