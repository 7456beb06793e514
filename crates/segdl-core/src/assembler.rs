//! Reassembly of part files into the final file.
//!
//! Parts are concatenated into `<final>.part`, synced, checked against the
//! expected size and renamed into place. Part files are deleted only after the
//! rename succeeded; on any error the temp file stays for inspection.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use crate::url_model::temp_path;

/// Concatenates `parts` (already in ascending segment order) into `final_path`.
/// Returns the number of bytes written.
pub fn assemble(parts: &[PathBuf], final_path: &Path, expected_size: Option<u64>) -> Result<u64> {
    let tmp = temp_path(final_path);
    let out = File::create(&tmp).with_context(|| format!("create {}", tmp.display()))?;
    let mut writer = BufWriter::new(out);

    let mut written = 0u64;
    for part in parts {
        let mut input = File::open(part).with_context(|| format!("open {}", part.display()))?;
        written += io::copy(&mut input, &mut writer)
            .with_context(|| format!("copy {} into {}", part.display(), tmp.display()))?;
    }

    let out = writer
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("flush {}", tmp.display()))?;
    out.sync_all()
        .with_context(|| format!("sync {}", tmp.display()))?;
    drop(out);

    if let Some(expected) = expected_size {
        if written != expected {
            anyhow::bail!(
                "assembled {} bytes, expected {} ({} kept)",
                written,
                expected,
                tmp.display()
            );
        }
    }

    fs::rename(&tmp, final_path).with_context(|| {
        format!("failed to rename {} to {}", tmp.display(), final_path.display())
    })?;
    tracing::debug!(path = %final_path.display(), bytes = written, "assembled");

    remove_parts(parts);
    Ok(written)
}

/// Deletes part files, ignoring ones that do not exist.
pub fn remove_parts(parts: &[PathBuf]) {
    for part in parts {
        match fs::remove_file(part) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(part = %part.display(), error = %e, "could not remove part file"),
        }
    }
}
