//! `segdl checksum` – SHA-256 of a file.

use anyhow::Result;
use segdl_core::checksum;
use std::path::{Path, PathBuf};

pub async fn run_checksum(path: &Path) -> Result<()> {
    let owned: PathBuf = path.to_path_buf();
    let digest = tokio::task::spawn_blocking(move || checksum::sha256_path(&owned)).await??;
    println!("{}  {}", digest, path.display());
    Ok(())
}
