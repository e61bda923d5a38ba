//! Radar map engine for the GeoMet WMS service.
//!
//! A [`RadarMap`] is bound to one location and frame size. It resolves the
//! time range a layer offers, fetches basemap, legend and radar tiles
//! through a [`ResourceFetcher`], caches every response in a shared
//! [`storage::TtlCache`], and composites frames and animated loops.
//!
//! [`Radar`] wraps a map with a precipitation type that can follow the
//! season.

pub mod config;
pub mod fetcher;
pub mod keys;
pub mod map;
pub mod radar;
pub mod sequence;

pub use config::{RadarConfig, ServiceEndpoints};
pub use fetcher::{HttpFetcher, ResourceFetcher, USER_AGENT};
pub use keys::CacheKeys;
pub use map::{MapMetadata, RadarMap};
pub use radar::{PrecipType, Radar};
