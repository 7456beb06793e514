//! HTTP HEAD / metadata probing.
//!
//! A metadata-only request that reports the total size (`Content-Length`),
//! the content type, and whether the server advertises byte ranges.

mod parse;

use anyhow::{Context, Result};

use crate::config::HttpConfig;
use crate::http::{new_easy, HeaderLines};

/// Result of a HEAD request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeadResult {
    /// Total size in bytes, if `Content-Length` is present.
    pub content_length: Option<u64>,
    /// `Content-Type`, lowercased (e.g. to tell a direct file from an HTML page).
    pub content_type: Option<String>,
    /// True if the server sent `Accept-Ranges: bytes`.
    pub accept_ranges: bool,
}

impl HeadResult {
    /// True when the content type says this is an HTML page rather than a file.
    pub fn is_html(&self) -> bool {
        self.content_type
            .as_deref()
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false)
    }
}

/// Performs a HEAD request (following redirects) and returns parsed metadata.
///
/// Blocks the current thread.
pub fn probe(url: &str, http: &HttpConfig) -> Result<HeadResult> {
    let mut headers = HeaderLines::default();

    let mut easy = new_easy(url, http).context("invalid URL")?;
    easy.nobody(true)?;

    {
        let mut transfer = easy.transfer();
        transfer.header_function(|data| {
            headers.push_raw(data);
            true
        })?;
        transfer.perform().context("HEAD request failed")?;
    }

    let code = easy.response_code().context("no response code")?;
    if !(200..300).contains(&code) {
        anyhow::bail!("HEAD {} returned HTTP {}", url, code);
    }

    let head = parse::head_result(&headers);
    tracing::debug!(
        url,
        size = ?head.content_length,
        content_type = ?head.content_type,
        accept_ranges = head.accept_ranges,
        "probe"
    );
    Ok(head)
}
