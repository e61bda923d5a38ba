//! Precipitation radar with a seasonal layer choice.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use chrono::{DateTime, Datelike, Local, Utc};
use radar_common::{Layer, RadarError, RadarResult};
use serde::{Deserialize, Serialize};
use storage::TtlCache;
use tracing::debug;

use crate::config::RadarConfig;
use crate::fetcher::ResourceFetcher;
use crate::map::{MapMetadata, RadarMap};

/// Which precipitation the radar shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrecipType {
    Rain,
    Snow,
    /// Rain from April through October, snow otherwise
    #[default]
    Auto,
}

impl PrecipType {
    /// The layer to show in `month` (1 = January).
    pub fn layer_for_month(self, month: u32) -> Layer {
        match self {
            PrecipType::Rain => Layer::Rain,
            PrecipType::Snow => Layer::Snow,
            PrecipType::Auto if (4..=10).contains(&month) => Layer::Rain,
            PrecipType::Auto => Layer::Snow,
        }
    }

    /// The layer to show right now, by local calendar month.
    pub fn current_layer(self) -> Layer {
        self.layer_for_month(Local::now().month())
    }
}

impl fmt::Display for PrecipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrecipType::Rain => "rain",
            PrecipType::Snow => "snow",
            PrecipType::Auto => "auto",
        })
    }
}

impl FromStr for PrecipType {
    type Err = RadarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rain" => Ok(PrecipType::Rain),
            "snow" => Ok(PrecipType::Snow),
            "auto" => Ok(PrecipType::Auto),
            other => Err(RadarError::invalid_parameter(
                "precip_type",
                format!("expected rain, snow or auto, got '{}'", other),
            )),
        }
    }
}

/// A single-layer radar map whose layer follows a [`PrecipType`].
#[derive(Debug)]
pub struct Radar {
    map: RadarMap,
    precip_type: PrecipType,
}

impl Radar {
    pub fn new(config: RadarConfig, precip_type: PrecipType) -> RadarResult<Self> {
        let config = RadarConfig {
            layers: vec![precip_type.current_layer()],
            ..config
        };
        Ok(Self {
            map: RadarMap::new(config)?,
            precip_type,
        })
    }

    pub fn with_cache_and_fetcher(
        config: RadarConfig,
        precip_type: PrecipType,
        cache: Arc<TtlCache<Bytes>>,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> RadarResult<Self> {
        let config = RadarConfig {
            layers: vec![precip_type.current_layer()],
            ..config
        };
        Ok(Self {
            map: RadarMap::with_cache_and_fetcher(config, cache, fetcher)?,
            precip_type,
        })
    }

    pub fn precip_type(&self) -> PrecipType {
        self.precip_type
    }

    /// Switch precipitation type. Cached imagery for the previous layer
    /// stays valid and is reused if the type is switched back.
    pub fn set_precip_type(&mut self, precip_type: PrecipType) -> RadarResult<()> {
        let layer = precip_type.current_layer();
        self.map.set_layers(vec![layer])?;
        self.precip_type = precip_type;
        debug!(%precip_type, %layer, "Precipitation type changed");
        Ok(())
    }

    /// The layer currently shown.
    pub fn layer(&self) -> Layer {
        self.map.primary_layer()
    }

    pub fn opacity(&self) -> u8 {
        self.map.config().opacity
    }

    pub fn set_opacity(&mut self, opacity: u8) -> RadarResult<()> {
        self.map.set_opacity(opacity)
    }

    pub fn map(&self) -> &RadarMap {
        &self.map
    }

    pub async fn get_latest_frame(&self) -> RadarResult<Option<Bytes>> {
        self.map.get_latest_frame().await
    }

    pub async fn get_loop(&self, fps: u32) -> RadarResult<Bytes> {
        self.map.get_loop(fps).await
    }

    pub async fn update(&self) -> RadarResult<Bytes> {
        self.map.update().await
    }

    pub async fn image(&self) -> Option<Bytes> {
        self.map.image().await
    }

    pub async fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.map.timestamp().await
    }

    pub async fn metadata(&self) -> MapMetadata {
        self.map.metadata().await
    }

    pub async fn clear_cache(&self, prefix: Option<&str>) -> usize {
        self.map.clear_cache(prefix).await
    }
}
