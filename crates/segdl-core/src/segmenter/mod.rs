//! Segment planning.
//!
//! Decides how many segments a job uses ([`SegmentPolicy`]) and splits the
//! total size into inclusive byte ranges ([`plan_segments`]).

mod policy;
mod range;

pub use policy::{SegmentPolicy, AUTO_FALLBACK_SEGMENTS};
pub use range::{plan_segments, ByteRange, PlanError};
