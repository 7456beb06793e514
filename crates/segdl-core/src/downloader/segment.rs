//! One segment: HTTP Range GET into a part file.

use std::cell::RefCell;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::sync::atomic::Ordering;

use crate::http::{new_easy, HeaderLines};

use super::{SegmentError, SegmentOutcome, SegmentTask, WorkerContext};

/// Downloads `task` and reports how it ended. Never panics on network or
/// disk errors; those become `Failed`.
///
/// An error observed after the job was stopped is reported as `Cancelled`:
/// the worker was told to quit, so the error is a consequence, not a cause.
pub fn run_segment(task: &SegmentTask, ctx: &WorkerContext) -> SegmentOutcome {
    tracing::debug!(
        segment = task.index,
        range = ?task.range,
        part = %task.part_path.display(),
        "segment start"
    );
    match fetch(task, ctx) {
        Ok(bytes) => {
            tracing::debug!(segment = task.index, bytes, "segment done");
            SegmentOutcome::Completed { bytes }
        }
        Err(_) if ctx.signal.is_stopped() => {
            tracing::debug!(segment = task.index, "segment stopped");
            SegmentOutcome::Cancelled
        }
        Err(e) => {
            tracing::warn!(segment = task.index, error = %e, "segment failed");
            SegmentOutcome::Failed(e)
        }
    }
}

fn fetch(task: &SegmentTask, ctx: &WorkerContext) -> Result<u64, SegmentError> {
    let file = File::create(&task.part_path).map_err(|source| SegmentError::CreatePart {
        path: task.part_path.clone(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let mut easy = new_easy(&task.url, &ctx.http)?;
    easy.buffer_size(ctx.chunk_size)?;
    easy.fail_on_error(true)?;
    easy.progress(true)?;
    if let Some(range) = task.range {
        easy.range(&range.curl_range())?;
    }

    let headers = RefCell::new(HeaderLines::default());
    let mut first_write = true;
    let mut rejected: Option<u32> = None;
    let mut storage_error: Option<io::Error> = None;
    let mut received = 0u64;

    let result = {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            headers.borrow_mut().push_raw(data);
            true
        })?;
        // Lets a stalled connection notice cancel without waiting for data.
        transfer.progress_function(|_, _, _, _| !ctx.signal.is_stopped())?;
        transfer.write_function(|data| {
            if first_write {
                first_write = false;
                let h = headers.borrow();
                let status = h.status().unwrap_or(0);
                if task.range.is_some() && status != 206 {
                    rejected = Some(status);
                    return Ok(0);
                }
                if task.range.is_none() {
                    if let Some(len) = h.content_length().filter(|n| *n > 0) {
                        let _ = ctx.total_size.compare_exchange(
                            0,
                            len,
                            Ordering::Relaxed,
                            Ordering::Relaxed,
                        );
                    }
                }
            }
            if ctx.signal.checkpoint().is_err() {
                return Ok(0);
            }
            if let Err(e) = writer.write_all(data) {
                storage_error = Some(e);
                return Ok(0);
            }
            received += data.len() as u64;
            ctx.counters.add(task.index, data.len() as u64);
            Ok(data.len())
        })?;
        transfer.perform()
    };

    if let Err(e) = result {
        if let Some(code) = rejected {
            return Err(SegmentError::RangeIgnored(code));
        }
        if let Some(io_err) = storage_error {
            return Err(SegmentError::Storage(io_err));
        }
        if e.is_http_returned_error() {
            return Err(SegmentError::Http(easy.response_code().unwrap_or(0)));
        }
        return Err(SegmentError::Curl(e));
    }

    // An empty body never reaches the write callback.
    if task.range.is_some() {
        let code = easy.response_code()?;
        if code != 206 {
            return Err(SegmentError::RangeIgnored(code));
        }
    }

    writer.flush().map_err(SegmentError::Storage)?;

    if let Some(range) = task.range {
        if received != range.len() {
            return Err(SegmentError::Incomplete {
                expected: range.len(),
                received,
            });
        }
    }
    Ok(received)
}
