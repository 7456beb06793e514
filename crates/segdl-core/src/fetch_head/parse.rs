//! Turn collected HEAD response headers into a `HeadResult`.

use crate::http::HeaderLines;

use super::HeadResult;

pub(super) fn head_result(headers: &HeaderLines) -> HeadResult {
    HeadResult {
        // A zero length carries no information for planning.
        content_length: headers.content_length().filter(|n| *n > 0),
        content_type: headers.get("content-type").map(|v| v.to_ascii_lowercase()),
        accept_ranges: headers
            .get("accept-ranges")
            .map(|v| v.eq_ignore_ascii_case("bytes"))
            .unwrap_or(false),
    }
}
