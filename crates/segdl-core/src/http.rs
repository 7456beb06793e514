//! Shared libcurl handle setup and response-header helpers.

use std::time::Duration;

use crate::config::HttpConfig;

/// New `Easy` handle for `url` with redirects, user agent and timeouts from `http`.
pub(crate) fn new_easy(url: &str, http: &HttpConfig) -> Result<curl::easy::Easy, curl::Error> {
    let mut easy = curl::easy::Easy::new();
    easy.url(url)?;
    easy.follow_location(true)?;
    easy.max_redirections(10)?;
    easy.useragent(&http.user_agent)?;
    easy.connect_timeout(Duration::from_secs(http.connect_timeout_secs))?;
    // A stalled connection fails instead of hanging the whole job.
    easy.low_speed_limit(http.low_speed_limit)?;
    easy.low_speed_time(Duration::from_secs(http.low_speed_time_secs))?;
    if let Some(secs) = http.request_timeout_secs {
        easy.timeout(Duration::from_secs(secs))?;
    }
    Ok(easy)
}

/// Collects response header lines. Each status line (`HTTP/...`) starts a
/// new response, so only the headers of the last hop survive redirects.
#[derive(Debug, Default)]
pub(crate) struct HeaderLines {
    lines: Vec<String>,
}

impl HeaderLines {
    pub(crate) fn push_raw(&mut self, data: &[u8]) {
        let Ok(s) = std::str::from_utf8(data) else {
            return;
        };
        let line = s.trim_end();
        if line.starts_with("HTTP/") {
            self.lines.clear();
        }
        if !line.is_empty() {
            self.lines.push(line.to_string());
        }
    }

    /// Status code from the current status line.
    pub(crate) fn status(&self) -> Option<u32> {
        let first = self.lines.first()?;
        if !first.starts_with("HTTP/") {
            return None;
        }
        first.split_whitespace().nth(1)?.parse().ok()
    }

    /// Value of the first header named `name` (case-insensitive).
    pub(crate) fn get(&self, name: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim().eq_ignore_ascii_case(name).then(|| v.trim())
        })
    }

    pub(crate) fn content_length(&self) -> Option<u64> {
        self.get("content-length")?.parse().ok()
    }
}
