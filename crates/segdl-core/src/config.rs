use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::segmenter::SegmentPolicy;

/// Invalid configuration or caller-supplied option.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid segment count {0:?}: expected \"auto\" or a positive integer")]
    InvalidSegmentCount(String),
    #[error("chunk_size must be at least 1 byte")]
    ZeroChunkSize,
    #[error("tick_interval_ms must be at least 1")]
    ZeroTickInterval,
}

/// What to do when the server does not report a size (no `Content-Length`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnknownSizePolicy {
    /// Download the whole file with one unranged GET.
    #[default]
    SingleStream,
    /// Refuse to start the job.
    Fail,
}

/// HTTP client settings shared by the probe and the segment workers.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub connect_timeout_secs: u64,
    /// Abort a transfer slower than this many bytes/s for `low_speed_time_secs`.
    pub low_speed_limit: u32,
    pub low_speed_time_secs: u64,
    /// Hard wall-clock limit per request. Off by default: a paused job would hit it.
    pub request_timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 30,
            low_speed_limit: 1024,
            low_speed_time_secs: 60,
            request_timeout_secs: None,
            user_agent: format!("segdl/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Engine configuration loaded from `~/.config/segdl/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegdlConfig {
    /// `"auto"` or a fixed segment count.
    pub segment_policy: SegmentPolicy,
    /// Receive chunk size in bytes; pause/cancel are checked once per chunk.
    pub chunk_size: usize,
    /// Progress sampling interval.
    pub tick_interval_ms: u64,
    pub unknown_size: UnknownSizePolicy,
    pub http: HttpConfig,
}

impl Default for SegdlConfig {
    fn default() -> Self {
        Self {
            segment_policy: SegmentPolicy::Auto,
            chunk_size: 1024,
            tick_interval_ms: 100,
            unknown_size: UnknownSizePolicy::default(),
            http: HttpConfig::default(),
        }
    }
}

impl SegdlConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.segment_policy.validate()?;
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::ZeroTickInterval);
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("segdl")?;
    Ok(xdg_dirs.get_config_home().join("config.toml"))
}

/// Load configuration from the XDG config dir. A missing file means defaults;
/// nothing is written back.
pub fn load() -> Result<SegdlConfig> {
    let path = config_path()?;
    if !path.exists() {
        tracing::debug!("no config at {}, using defaults", path.display());
        return Ok(SegdlConfig::default());
    }
    load_from_path(&path)
}

pub fn load_from_path(path: &Path) -> Result<SegdlConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg: SegdlConfig =
        toml::from_str(&data).with_context(|| format!("invalid config {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = SegdlConfig::default();
        assert_eq!(cfg.segment_policy, SegmentPolicy::Auto);
        assert_eq!(cfg.chunk_size, 1024);
        assert_eq!(cfg.tick_interval(), Duration::from_millis(100));
        assert_eq!(cfg.unknown_size, UnknownSizePolicy::SingleStream);
        assert!(cfg.http.request_timeout_secs.is_none());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_toml_roundtrip() {
        let mut cfg = SegdlConfig::default();
        cfg.segment_policy = SegmentPolicy::Fixed(6);
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: SegdlConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed.segment_policy, SegmentPolicy::Fixed(6));
        assert_eq!(parsed.chunk_size, cfg.chunk_size);
        assert_eq!(parsed.http.user_agent, cfg.http.user_agent);
    }

    #[test]
    fn config_toml_custom_values() {
        let toml = r#"
            segment_policy = 12
            chunk_size = 4096
            unknown_size = "fail"

            [http]
            connect_timeout_secs = 5
            request_timeout_secs = 600
        "#;
        let cfg: SegdlConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.segment_policy, SegmentPolicy::Fixed(12));
        assert_eq!(cfg.chunk_size, 4096);
        assert_eq!(cfg.tick_interval_ms, 100);
        assert_eq!(cfg.unknown_size, UnknownSizePolicy::Fail);
        assert_eq!(cfg.http.connect_timeout_secs, 5);
        assert_eq!(cfg.http.low_speed_time_secs, 60);
        assert_eq!(cfg.http.request_timeout_secs, Some(600));
    }

    #[test]
    fn config_toml_auto_policy_string() {
        let cfg: SegdlConfig = toml::from_str(r#"segment_policy = "auto""#).unwrap();
        assert_eq!(cfg.segment_policy, SegmentPolicy::Auto);
    }

    #[test]
    fn config_toml_rejects_zero_segments() {
        assert!(toml::from_str::<SegdlConfig>("segment_policy = 0").is_err());
        assert!(toml::from_str::<SegdlConfig>(r#"segment_policy = "many""#).is_err());
    }

    #[test]
    fn load_from_path_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "chunk_size = 0\n").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(err.downcast_ref::<ConfigError>().is_some());

        fs::write(&path, "tick_interval_ms = 250\n").unwrap();
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.tick_interval(), Duration::from_millis(250));
    }
}
