//! Byte range type and range planning.

use thiserror::Error;

/// A single segment's byte range `[start, end]` (both inclusive, as in HTTP).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset.
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by this range.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// HTTP Range header value: `bytes=start-end`.
    pub fn range_header_value(&self) -> String {
        format!("bytes={}-{}", self.start, self.end)
    }

    /// Range in curl's `CURLOPT_RANGE` syntax (no `bytes=` prefix).
    pub(crate) fn curl_range(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlanError {
    /// Total size is 0 (not reported by the server); ranges would be `[0,-1]`.
    #[error("total size unknown; cannot split into byte ranges")]
    SizeUnknown,
    #[error("segment count must be at least 1")]
    ZeroSegments,
}

/// Splits `total_size` bytes into `segment_count` contiguous ranges.
///
/// Every range but the last is `total_size / segment_count` bytes long; the
/// last one ends at `total_size - 1` and absorbs the remainder. When the
/// count exceeds the size it is clamped so that no range is empty.
pub fn plan_segments(total_size: u64, segment_count: usize) -> Result<Vec<ByteRange>, PlanError> {
    if total_size == 0 {
        return Err(PlanError::SizeUnknown);
    }
    if segment_count == 0 {
        return Err(PlanError::ZeroSegments);
    }

    let count = (segment_count as u64).min(total_size);
    let segment_size = total_size / count;

    let ranges = (0..count)
        .map(|i| {
            let start = i * segment_size;
            let end = if i == count - 1 {
                total_size - 1
            } else {
                start + segment_size - 1
            };
            ByteRange { start, end }
        })
        .collect();
    Ok(ranges)
}
