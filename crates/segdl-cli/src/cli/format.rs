//! Text rendering of progress numbers for the terminal.

use segdl_core::ProgressSnapshot;
use std::time::Duration;

const MIB: f64 = 1_048_576.0;

pub fn mib(bytes: u64) -> f64 {
    bytes as f64 / MIB
}

/// `1h02m03s`, `4m05s`, `7s`; `?` when unknown.
pub fn format_eta(eta: Option<Duration>) -> String {
    let Some(eta) = eta else {
        return "?".to_string();
    };
    let secs = eta.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{}h{:02}m{:02}s", h, m, s)
    } else if m > 0 {
        format!("{}m{:02}s", m, s)
    } else {
        format!("{}s", s)
    }
}

/// One status line: percent, MiB done / total, MiB/s, ETA, per-segment percents.
pub fn format_progress(snap: &ProgressSnapshot) -> String {
    let rate = snap.bytes_per_sec / MIB;
    let mut line = if snap.total_size > 0 {
        format!(
            "{:5.1}%  {:.1} / {:.1} MiB  {:.2} MiB/s  ETA {}",
            snap.fraction() * 100.0,
            mib(snap.downloaded),
            mib(snap.total_size),
            rate,
            format_eta(snap.eta)
        )
    } else {
        format!(
            "{:.1} MiB  {:.2} MiB/s  ETA {}",
            mib(snap.downloaded),
            rate,
            format_eta(snap.eta)
        )
    };
    if snap.segments.len() > 1 {
        let per: Vec<String> = snap
            .segments
            .iter()
            .map(|s| format!("{:.0}%", s.fraction() * 100.0))
            .collect();
        line.push_str(&format!("  [{}]", per.join(" ")));
    }
    line
}
