//! Common types and utilities shared across the radar workspace crates.

pub mod bbox;
pub mod error;
pub mod layer;
pub mod time;

pub use bbox::{compute_bbox, BoundingBox};
pub use error::{RadarError, RadarResult};
pub use layer::{Language, Layer};
pub use time::{frame_ticks, minute_key, parse_iso8601, TimeDimension, IMAGE_INTERVAL_MINUTES};
