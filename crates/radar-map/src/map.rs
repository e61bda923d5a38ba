//! The cached map engine.
//!
//! Every remote resource goes through the same fetch-and-cache path: look
//! the key up, fetch on a miss, store with the resource's TTL. Radar tiles
//! and basemaps degrade to `None` when they cannot be fetched; a failed
//! capabilities lookup fails the caller.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Local, Utc};
use futures::future::join_all;
use radar_common::{compute_bbox, BoundingBox, Language, Layer, RadarError, RadarResult, TimeDimension};
use renderer::{composite, format_label, CompositeInput, LabelFont};
use serde::Serialize;
use storage::TtlCache;
use tokio::sync::RwLock;
use tracing::{debug, error, instrument, warn};
use wms_protocol::{capabilities_request, find_layer, legend_request, time_dimension, MapRequest};

use crate::config::RadarConfig;
use crate::fetcher::{HttpFetcher, ResourceFetcher};
use crate::keys::CacheKeys;

pub const CAPABILITIES_TTL: Duration = Duration::from_secs(5 * 60);
pub const LAYER_TTL: Duration = Duration::from_secs(200 * 60);
pub const COMPOSITE_TTL: Duration = Duration::from_secs(200 * 60);
pub const BASEMAP_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const LEGEND_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Descriptive information about a map, for display alongside its images.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMetadata {
    pub attribution: String,
    pub layers: Vec<Layer>,
    pub language: Language,
    pub bbox: BoundingBox,
    pub width: u32,
    pub height: u32,
    /// Most recent frame time seen in the capabilities document
    pub timestamp: Option<DateTime<Utc>>,
}

/// Radar imagery for one location, frame size and layer set.
pub struct RadarMap {
    pub(crate) config: RadarConfig,
    pub(crate) bbox: BoundingBox,
    pub(crate) keys: CacheKeys,
    pub(crate) cache: Arc<TtlCache<Bytes>>,
    pub(crate) fetcher: Arc<dyn ResourceFetcher>,
    pub(crate) font: Option<LabelFont>,
    pub(crate) timestamp: RwLock<Option<DateTime<Utc>>>,
    pub(crate) image: RwLock<Option<Bytes>>,
}

impl std::fmt::Debug for RadarMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RadarMap")
            .field("prefix", &self.keys.prefix())
            .field("layers", &self.config.layers)
            .field("bbox", &self.bbox)
            .finish()
    }
}

impl RadarMap {
    /// Build a map that talks to the configured endpoints over HTTP and
    /// shares the process-wide cache.
    pub fn new(config: RadarConfig) -> RadarResult<Self> {
        let fetcher = Arc::new(HttpFetcher::new(&config.endpoints)?);
        Self::with_cache_and_fetcher(config, TtlCache::shared(), fetcher)
    }

    /// Build a map with an explicit cache and transport.
    pub fn with_cache_and_fetcher(
        config: RadarConfig,
        cache: Arc<TtlCache<Bytes>>,
        fetcher: Arc<dyn ResourceFetcher>,
    ) -> RadarResult<Self> {
        config.validate()?;
        let bbox = compute_bbox(config.radius as f64, config.latitude, config.longitude)?;
        let keys = CacheKeys::new(
            config.latitude,
            config.longitude,
            config.radius,
            config.width,
            config.height,
        );
        let font = if config.timestamp {
            LabelFont::discover(config.label_font.as_deref())
        } else {
            None
        };

        debug!(prefix = keys.prefix(), bbox = %bbox.to_wms_string(), "Created radar map");

        Ok(Self {
            config,
            bbox,
            keys,
            cache,
            fetcher,
            font,
            timestamp: RwLock::new(None),
            image: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &RadarConfig {
        &self.config
    }

    pub fn bbox(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn keys(&self) -> &CacheKeys {
        &self.keys
    }

    pub fn cache(&self) -> &Arc<TtlCache<Bytes>> {
        &self.cache
    }

    /// The layer whose time dimension drives frames and loops.
    pub fn primary_layer(&self) -> Layer {
        self.config.layers[0]
    }

    /// Replace the layer set, keeping location, cache and transport.
    pub fn set_layers(&mut self, layers: Vec<Layer>) -> RadarResult<()> {
        if layers.is_empty() {
            return Err(RadarError::invalid_parameter("layers", "at least one layer is required"));
        }
        self.config.layers = layers;
        Ok(())
    }

    pub fn set_opacity(&mut self, opacity: u8) -> RadarResult<()> {
        if opacity > 100 {
            return Err(RadarError::invalid_parameter(
                "opacity",
                format!("must be between 0 and 100, got {}", opacity),
            ));
        }
        self.config.opacity = opacity;
        Ok(())
    }

    /// Latest frame time recorded by [`Self::get_time_dimension`].
    pub async fn timestamp(&self) -> Option<DateTime<Utc>> {
        *self.timestamp.read().await
    }

    /// The loop stored by the last `update()`.
    pub async fn image(&self) -> Option<Bytes> {
        self.image.read().await.clone()
    }

    pub async fn metadata(&self) -> MapMetadata {
        MapMetadata {
            attribution: self.config.language.attribution().to_string(),
            layers: self.config.layers.clone(),
            language: self.config.language,
            bbox: self.bbox,
            width: self.config.width,
            height: self.config.height,
            timestamp: self.timestamp().await,
        }
    }

    fn map_request(&self) -> MapRequest {
        MapRequest {
            bbox: self.bbox,
            width: self.config.width,
            height: self.config.height,
        }
    }

    /// The capabilities document for `layer`, from cache or the service.
    async fn capabilities(&self, layer: Layer) -> RadarResult<Bytes> {
        let key = CacheKeys::capabilities(layer);
        if let Some(doc) = self.cache.get(&key).await {
            return Ok(doc);
        }

        let request = capabilities_request(&self.config.endpoints.geomet_url, layer, self.config.language);
        match self.fetcher.fetch_text(&request).await {
            Ok(doc) => Ok(self.cache.add(&key, Bytes::from(doc), CAPABILITIES_TTL).await),
            Err(e) => {
                error!(layer = %layer, error = %e, "Capabilities request failed");
                Err(e)
            }
        }
    }

    /// The time range `layer` currently offers.
    ///
    /// `Ok(None)` means the service has no imagery for the layer right now.
    /// The end of the range is remembered as [`Self::timestamp`].
    #[instrument(skip(self), fields(prefix = self.keys.prefix()))]
    pub async fn get_time_dimension(&self, layer: Layer) -> RadarResult<Option<TimeDimension>> {
        let doc = self.capabilities(layer).await?;
        let dimension = time_dimension(&doc, layer.wms_name())?;

        match &dimension {
            Some(dim) => {
                *self.timestamp.write().await = Some(dim.end);
                debug!(start = %dim.start, end = %dim.end, "Resolved time dimension");
            }
            None => warn!(layer = %layer, "No time dimension advertised"),
        }
        Ok(dimension)
    }

    /// Radar tile for `layer` at `time`, or `None` if it cannot be fetched.
    #[instrument(skip(self), fields(prefix = self.keys.prefix()))]
    pub async fn get_layer_tile(&self, layer: Layer, time: DateTime<Utc>) -> Option<Bytes> {
        let key = self.keys.layer_tile(layer, &time);
        if let Some(tile) = self.cache.get(&key).await {
            return Some(tile);
        }

        let request = self
            .map_request()
            .layer_tile(&self.config.endpoints.geomet_url, layer, &time);
        match self.fetcher.fetch_bytes(&request).await {
            Ok(tile) => Some(self.cache.add(&key, tile, LAYER_TTL).await),
            Err(e) => {
                warn!(layer = %layer, time = %time, error = %e, "Radar tile unavailable");
                None
            }
        }
    }

    /// Basemap from the primary provider, falling back to the backup.
    #[instrument(skip(self), fields(prefix = self.keys.prefix()))]
    pub async fn get_basemap(&self) -> Option<Bytes> {
        let key = self.keys.basemap();
        if let Some(basemap) = self.cache.get(&key).await {
            return Some(basemap);
        }

        let endpoints = &self.config.endpoints;
        let request = self
            .map_request()
            .basemap(&endpoints.basemap_url, &endpoints.basemap_layer);

        let basemap = match self.fetcher.fetch_bytes(&request).await {
            Ok(basemap) => basemap,
            Err(primary) => {
                warn!(error = %primary, "Primary basemap failed, trying backup");
                let backup = request.with_url(endpoints.basemap_backup_url.clone());
                match self.fetcher.fetch_bytes(&backup).await {
                    Ok(basemap) => basemap,
                    Err(e) => {
                        warn!(error = %e, "Backup basemap failed, frames will have no basemap");
                        return None;
                    }
                }
            }
        };
        Some(self.cache.add(&key, basemap, BASEMAP_TTL).await)
    }

    /// Legend image for `layer` in the map's language.
    ///
    /// The style comes from the layer's capabilities; a layer without any
    /// style is an error. A failed legend download yields `Ok(None)`.
    #[instrument(skip(self), fields(prefix = self.keys.prefix()))]
    pub async fn get_legend(&self, layer: Layer) -> RadarResult<Option<Bytes>> {
        let language = self.config.language;
        let key = self.keys.legend(layer, language);
        if let Some(legend) = self.cache.get(&key).await {
            return Ok(Some(legend));
        }

        let doc = self.capabilities(layer).await?;
        let capabilities = find_layer(&doc, layer.wms_name())?
            .ok_or_else(|| RadarError::LayerNotFound(layer.wms_name().to_string()))?;
        let style = capabilities
            .legend_style(layer.default_legend_style(), language.code())
            .ok_or_else(|| RadarError::StyleNotFound(layer.wms_name().to_string()))?;

        let request = legend_request(&self.config.endpoints.geomet_url, layer, style, language);
        match self.fetcher.fetch_bytes(&request).await {
            Ok(legend) => Ok(Some(self.cache.add(&key, legend, LEGEND_TTL).await)),
            Err(e) => {
                warn!(layer = %layer, style, error = %e, "Legend unavailable");
                Ok(None)
            }
        }
    }

    /// Composited PNG frame for `time`.
    ///
    /// Frames built from incomplete inputs are returned but not cached, so
    /// the next request retries the missing pieces.
    #[instrument(skip(self), fields(prefix = self.keys.prefix()))]
    pub async fn composite_frame(&self, time: DateTime<Utc>) -> RadarResult<Bytes> {
        let config = &self.config;
        let key = self.keys.composite(
            &config.layers,
            config.opacity,
            config.legend,
            config.timestamp,
            config.language,
            &time,
        );
        if let Some(frame) = self.cache.get(&key).await {
            return Ok(frame);
        }

        let basemap = self.get_basemap().await;
        let tiles = join_all(config.layers.iter().map(|&layer| self.get_layer_tile(layer, time))).await;

        let mut legends = Vec::new();
        if config.legend {
            for &layer in &config.layers {
                legends.push(self.get_legend(layer).await?);
            }
        }

        let complete = basemap.is_some()
            && tiles.iter().all(Option::is_some)
            && legends.iter().all(Option::is_some);

        let label = config.timestamp.then(|| {
            let labels: Vec<&str> = config.layers.iter().map(|l| l.label(config.language)).collect();
            format_label(&labels, &time.with_timezone(&Local))
        });

        let input = CompositeInput {
            width: config.width,
            height: config.height,
            basemap,
            layers: tiles.into_iter().flatten().collect(),
            legends: legends.into_iter().flatten().collect(),
            opacity: config.opacity,
            label,
            font: self.font.clone(),
        };

        let png = tokio::task::spawn_blocking(move || composite(&input))
            .await
            .map_err(|e| RadarError::InternalError(format!("compositing task failed: {}", e)))??;
        let frame = Bytes::from(png);

        if complete {
            Ok(self.cache.add(&key, frame, COMPOSITE_TTL).await)
        } else {
            debug!(time = %time, "Frame is missing inputs, not caching it");
            Ok(frame)
        }
    }

    /// Drop cached entries belonging to this map.
    ///
    /// With `None`, everything under the map's location prefix goes, plus the
    /// capabilities of its layers. With `Some(sub)`, only keys starting with
    /// `{prefix}-{sub}` are removed, e.g. `Some("composite-")`.
    /// Returns the number of entries removed.
    pub async fn clear_cache(&self, prefix: Option<&str>) -> usize {
        let scope = self.keys.scope();
        let removed = match prefix {
            Some(sub) => self.cache.clear(Some(&format!("{}{}", scope, sub))).await,
            None => {
                let mut removed = self.cache.clear(Some(&scope)).await;
                for &layer in &self.config.layers {
                    removed += self.cache.clear(Some(&CacheKeys::capabilities(layer))).await;
                }
                removed
            }
        };
        debug!(prefix = self.keys.prefix(), sub = prefix.unwrap_or("*"), removed, "Cleared map cache");
        removed
    }
}
