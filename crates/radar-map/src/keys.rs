//! Cache key layout.
//!
//! Every key a map writes starts with its location prefix
//! `map-{lat}_{lon}_{radius}km_{width}x{height}` so one prefix scan drops
//! them all. Capabilities documents are shared by every location and are
//! keyed per layer only.

use chrono::{DateTime, Utc};
use radar_common::{minute_key, Language, Layer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKeys {
    prefix: String,
}

impl CacheKeys {
    pub fn new(latitude: f64, longitude: f64, radius_km: u32, width: u32, height: u32) -> Self {
        Self {
            prefix: format!(
                "map-{:.5}_{:.5}_{}km_{}x{}",
                latitude, longitude, radius_km, width, height
            ),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Prefix matching every per-location key of this map, and only those.
    pub fn scope(&self) -> String {
        format!("{}-", self.prefix)
    }

    pub fn basemap(&self) -> String {
        format!("{}-basemap", self.prefix)
    }

    pub fn legend(&self, layer: Layer, language: Language) -> String {
        format!("{}-legend-{}-{}", self.prefix, layer.key(), language.code())
    }

    pub fn layer_tile(&self, layer: Layer, time: &DateTime<Utc>) -> String {
        format!("{}-layer-{}-{}", self.prefix, layer.key(), minute_key(time))
    }

    /// Key for a finished frame; covers every setting that changes its pixels.
    pub fn composite(
        &self,
        layers: &[Layer],
        opacity: u8,
        legend: bool,
        timestamp: bool,
        language: Language,
        time: &DateTime<Utc>,
    ) -> String {
        let layer_set: Vec<&str> = layers.iter().map(Layer::key).collect();
        format!(
            "{}-composite-{}-{}-{}{}{}-{}",
            self.prefix,
            layer_set.join("+"),
            opacity,
            if legend { "L" } else { "l" },
            if timestamp { "T" } else { "t" },
            language.code(),
            minute_key(time)
        )
    }

    pub fn capabilities(layer: Layer) -> String {
        format!("capabilities-{}", layer.key())
    }
}
