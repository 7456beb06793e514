//! Minimal HTTP/1.1 server that supports HEAD and Range GET for integration tests.
//!
//! Serves a single static body at `/data.bin`. Responds to HEAD with
//! Content-Length and Accept-Ranges: bytes; responds to GET with Range with
//! 206 Partial Content. One request per connection.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

#[derive(Debug, Clone, Copy)]
pub struct RangeServerOptions {
    /// If false, HEAD returns 405 (simulates servers that block HEAD).
    pub head_allowed: bool,
    /// If false, GET ignores Range and always returns 200 with the full body.
    pub support_ranges: bool,
    /// If false, neither HEAD nor GET carries Content-Length; the body ends
    /// when the connection closes.
    pub send_length: bool,
    /// Body is written in pieces of this many bytes with `throttle_delay`
    /// between them. `None` writes it in one go.
    pub throttle_chunk: Option<usize>,
    pub throttle_delay: Duration,
    /// A ranged GET starting at this offset is answered with 500.
    pub fail_range_start: Option<u64>,
    /// A 206 carries only the first half of the requested range, with a
    /// Content-Length that matches what is sent.
    pub truncate_ranges: bool,
    /// HEAD answers only after this delay.
    pub head_delay: Duration,
}

impl Default for RangeServerOptions {
    fn default() -> Self {
        Self {
            head_allowed: true,
            support_ranges: true,
            send_length: true,
            throttle_chunk: None,
            throttle_delay: Duration::ZERO,
            fail_range_start: None,
            truncate_ranges: false,
            head_delay: Duration::ZERO,
        }
    }
}

impl RangeServerOptions {
    /// Slow body: `chunk` bytes every `delay_ms` milliseconds.
    pub fn throttled(chunk: usize, delay_ms: u64) -> Self {
        Self {
            throttle_chunk: Some(chunk),
            throttle_delay: Duration::from_millis(delay_ms),
            ..Self::default()
        }
    }
}

/// Starts a server in a background thread serving `body`. Returns the file URL
/// (e.g. "http://127.0.0.1:12345/data.bin"). The server runs until the process exits.
pub fn start(body: Vec<u8>) -> String {
    start_with_options(body, RangeServerOptions::default())
}

/// Like `start` but allows customizing server behavior (HEAD blocked, ranges missing, etc.).
pub fn start_with_options(body: Vec<u8>, opts: RangeServerOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            thread::spawn(move || handle(stream, &body, opts));
        }
    });
    format!("http://127.0.0.1:{}/data.bin", port)
}

fn handle(mut stream: TcpStream, body: &[u8], opts: RangeServerOptions) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    // Long enough for a paused client to come back.
    let _ = stream.set_write_timeout(Some(Duration::from_secs(10)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) | Err(_) => return,
        Ok(n) => n,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let (method, range) = parse_request(request);
    let total = body.len() as u64;
    let accept_ranges = if opts.support_ranges {
        "Accept-Ranges: bytes\r\n"
    } else {
        ""
    };

    if method.eq_ignore_ascii_case("HEAD") {
        thread::sleep(opts.head_delay);
        if !opts.head_allowed {
            let _ = stream.write_all(
                b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
            return;
        }
        let length = if opts.send_length {
            format!("Content-Length: {}\r\n", total)
        } else {
            String::new()
        };
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\n{}{}Connection: close\r\n\r\n",
            length, accept_ranges
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }

    if !method.eq_ignore_ascii_case("GET") {
        let _ = stream.write_all(
            b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        return;
    }

    if let (Some((start, _)), Some(fail_at)) = (range, opts.fail_range_start) {
        if start == fail_at {
            let _ = stream.write_all(
                b"HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
            return;
        }
    }

    let (status, content_range, slice) = match range.filter(|_| opts.support_ranges) {
        Some((start, end_incl)) => {
            let end_incl = end_incl.min(total.saturating_sub(1));
            if start > end_incl {
                (
                    "416 Range Not Satisfiable",
                    Some(format!("bytes */{}", total)),
                    &body[0..0],
                )
            } else {
                let mut slice = &body[start as usize..=end_incl as usize];
                if opts.truncate_ranges {
                    slice = &slice[..slice.len() / 2];
                }
                (
                    "206 Partial Content",
                    Some(format!("bytes {}-{}/{}", start, end_incl, total)),
                    slice,
                )
            }
        }
        None => ("200 OK", None, body),
    };

    let mut head = format!("HTTP/1.1 {}\r\nContent-Type: application/octet-stream\r\n", status);
    if opts.send_length {
        head.push_str(&format!("Content-Length: {}\r\n", slice.len()));
    }
    if let Some(cr) = content_range {
        head.push_str(&format!("Content-Range: {}\r\n", cr));
    }
    head.push_str(accept_ranges);
    head.push_str("Connection: close\r\n\r\n");
    if stream.write_all(head.as_bytes()).is_err() {
        return;
    }

    match opts.throttle_chunk {
        Some(chunk) => {
            for piece in slice.chunks(chunk.max(1)) {
                if stream.write_all(piece).is_err() {
                    return;
                }
                thread::sleep(opts.throttle_delay);
            }
        }
        None => {
            let _ = stream.write_all(slice);
        }
    }
    let _ = stream.flush();
}

/// Returns (method, optional (start, end_inclusive) for Range: bytes=X-Y).
fn parse_request(request: &str) -> (&str, Option<(u64, u64)>) {
    let mut method = "";
    let mut range = None;
    for line in request.lines() {
        let line = line.trim();
        if line.is_empty() {
            break;
        }
        if method.is_empty() {
            method = line.split_whitespace().next().unwrap_or("");
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("range") {
                let value = value.trim();
                if let Some(part) = value.strip_prefix("bytes=") {
                    if let Some((a, b)) = part.split_once('-') {
                        let start = a.trim().parse::<u64>().unwrap_or(0);
                        let end_incl = b.trim().parse::<u64>().unwrap_or(u64::MAX);
                        range = Some((start, end_incl));
                    }
                }
            }
        }
    }
    (method, range)
}
