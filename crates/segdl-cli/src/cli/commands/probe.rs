//! `segdl probe` – show what a download of the URL would look like.

use anyhow::{Context, Result};
use segdl_core::config::SegdlConfig;
use segdl_core::fetch_head;
use segdl_core::segmenter::plan_segments;
use segdl_core::url_model::derive_filename;
use segdl_core::SegmentPolicy;

use crate::cli::format::mib;

pub async fn run_probe(cfg: SegdlConfig, url: String, segments: Option<SegmentPolicy>) -> Result<()> {
    let policy = segments.unwrap_or(cfg.segment_policy);
    let http = cfg.http.clone();
    let probe_url = url.clone();
    let head = tokio::task::spawn_blocking(move || fetch_head::probe(&probe_url, &http))
        .await
        .context("probe task")??;

    println!("url:          {}", url);
    println!("file name:    {}", derive_filename(&url));
    match head.content_length {
        Some(n) => println!("size:         {} bytes ({:.1} MiB)", n, mib(n)),
        None => println!("size:         unknown"),
    }
    println!(
        "content type: {}",
        head.content_type.as_deref().unwrap_or("-")
    );
    if head.is_html() {
        println!("              (an HTML page, not a direct file link)");
    }
    println!("ranges:       {}", if head.accept_ranges { "yes" } else { "not advertised" });

    let count = policy.segment_count(head.content_length);
    match head.content_length.map(|n| plan_segments(n, count)) {
        Some(Ok(ranges)) => {
            println!("segments:     {} (policy {})", ranges.len(), policy);
            for (i, r) in ranges.iter().enumerate() {
                println!("  #{:<3} {}  ({} bytes)", i, r.range_header_value(), r.len());
            }
        }
        _ => println!(
            "segments:     1 stream (size unknown, unknown_size = {:?})",
            cfg.unknown_size
        ),
    }
    Ok(())
}
