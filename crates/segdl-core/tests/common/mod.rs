#![allow(dead_code)]

pub mod range_server;

use std::path::Path;

use segdl_core::SegdlConfig;

/// Deterministic test body of `len` bytes.
pub fn body(len: usize) -> Vec<u8> {
    (0u8..251).cycle().take(len).collect()
}

/// Names of the entries in `dir`, sorted.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Config with short HTTP timeouts so a broken test fails quickly.
pub fn test_config() -> SegdlConfig {
    let mut cfg = SegdlConfig::default();
    cfg.http.connect_timeout_secs = 5;
    cfg.http.low_speed_time_secs = 10;
    cfg.http.low_speed_limit = 1;
    cfg
}
