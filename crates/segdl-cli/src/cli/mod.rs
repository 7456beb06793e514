//! CLI for the segdl downloader.

mod commands;
mod format;

use anyhow::Result;
use clap::{Parser, Subcommand};
use segdl_core::config;
use segdl_core::SegmentPolicy;
use std::path::PathBuf;

use commands::{run_checksum, run_get, run_probe, GetArgs};

/// Top-level CLI for segdl.
#[derive(Debug, Parser)]
#[command(name = "segdl")]
#[command(about = "segdl: segmented, pausable single-file HTTP downloader", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/segdl/config.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Download a file. While running, type p (pause), r (resume) or c (cancel) + Enter.
    Get {
        /// Direct HTTP/HTTPS URL to download.
        url: String,
        /// Directory to save into (default: current directory).
        #[arg(short = 'd', long, value_name = "DIR")]
        dir: Option<PathBuf>,
        /// "auto" or a fixed number of segments (default: from config).
        #[arg(short = 's', long, value_name = "auto|N")]
        segments: Option<SegmentPolicy>,
        /// File name to save as (default: derived from the URL).
        #[arg(short = 'o', long, value_name = "NAME")]
        output: Option<String>,
        /// Expected SHA-256 (hex) of the finished file.
        #[arg(long, value_name = "HEX")]
        sha256: Option<String>,
    },

    /// Show size, content type and range support, and the planned segments.
    Probe {
        /// Direct HTTP/HTTPS URL to probe.
        url: String,
        /// "auto" or a fixed number of segments (default: from config).
        #[arg(short = 's', long, value_name = "auto|N")]
        segments: Option<SegmentPolicy>,
    },

    /// Compute SHA-256 of a file (e.g. after download).
    Checksum {
        /// Path to the file.
        path: PathBuf,
    },
}

impl CliCommand {
    /// Parses arguments, runs the command and returns the process exit code.
    pub async fn run_from_args() -> Result<i32> {
        let cli = Cli::parse();
        let cfg = match &cli.config {
            Some(path) => config::load_from_path(path)?,
            None => config::load()?,
        };
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Get {
                url,
                dir,
                segments,
                output,
                sha256,
            } => {
                let args = GetArgs {
                    url,
                    dir,
                    segments,
                    output,
                    sha256,
                };
                run_get(cfg, args).await
            }
            CliCommand::Probe { url, segments } => {
                run_probe(cfg, url, segments).await?;
                Ok(0)
            }
            CliCommand::Checksum { path } => {
                run_checksum(&path).await?;
                Ok(0)
            }
        }
    }
}

#[cfg(test)]
mod tests;
