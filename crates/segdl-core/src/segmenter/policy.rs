//! Segment count policy: auto (size-based) or a fixed caller-chosen count.

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::ConfigError;

/// Segment count used by the auto policy when the size could not be probed.
pub const AUTO_FALLBACK_SEGMENTS: usize = 8;

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentPolicy {
    /// Pick the count from the probed size.
    #[default]
    Auto,
    /// Use exactly this many segments (always >= 1 once constructed via `fixed`/`from_str`).
    Fixed(usize),
}

impl SegmentPolicy {
    /// Fixed policy; `0` is a configuration error rather than being coerced.
    pub fn fixed(count: usize) -> Result<Self, ConfigError> {
        if count == 0 {
            return Err(ConfigError::InvalidSegmentCount(count.to_string()));
        }
        Ok(SegmentPolicy::Fixed(count))
    }

    /// Rejects `Fixed(0)` built directly through the enum variant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match *self {
            SegmentPolicy::Fixed(0) => Err(ConfigError::InvalidSegmentCount("0".to_string())),
            _ => Ok(()),
        }
    }

    /// Number of segments for a job whose probed size is `probed_size`
    /// (`None` when the probe failed or reported no length).
    ///
    /// Auto: > 100 MiB → 16, > 50 MiB → 8, otherwise 4; unknown → 8.
    pub fn segment_count(&self, probed_size: Option<u64>) -> usize {
        match *self {
            SegmentPolicy::Fixed(n) => n,
            SegmentPolicy::Auto => match probed_size {
                None | Some(0) => AUTO_FALLBACK_SEGMENTS,
                Some(size) if size > 100 * MIB => 16,
                Some(size) if size > 50 * MIB => 8,
                Some(_) => 4,
            },
        }
    }
}

impl FromStr for SegmentPolicy {
    type Err = ConfigError;

    /// Accepts `auto` (any case) or a positive integer.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(SegmentPolicy::Auto);
        }
        match s.parse::<usize>() {
            Ok(n) if n > 0 => Ok(SegmentPolicy::Fixed(n)),
            _ => Err(ConfigError::InvalidSegmentCount(s.to_string())),
        }
    }
}

impl fmt::Display for SegmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegmentPolicy::Auto => write!(f, "auto"),
            SegmentPolicy::Fixed(n) => write!(f, "{}", n),
        }
    }
}

// In config.toml the policy is either `"auto"` or a bare integer.
impl Serialize for SegmentPolicy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match *self {
            SegmentPolicy::Auto => serializer.serialize_str("auto"),
            SegmentPolicy::Fixed(n) => serializer.serialize_u64(n as u64),
        }
    }
}

impl<'de> Deserialize<'de> for SegmentPolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Count(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => s.parse().map_err(de::Error::custom),
            Raw::Count(n) => usize::try_from(n)
                .map_err(|_| ConfigError::InvalidSegmentCount(n.to_string()))
                .and_then(SegmentPolicy::fixed)
                .map_err(de::Error::custom),
        }
    }
}
