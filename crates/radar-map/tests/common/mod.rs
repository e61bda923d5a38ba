//! Shared test double for radar-map integration tests.
//!
//! `MockFetcher` answers like GeoMet and the basemap providers, records
//! every request, and can be told to fail specific resources.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use radar_common::{parse_iso8601, RadarError, RadarResult, IMAGE_INTERVAL_MINUTES};
use radar_map::{RadarConfig, RadarMap, ResourceFetcher, ServiceEndpoints};
use storage::TtlCache;
use test_utils::{colors, frame_color, layers, solid_png, CapabilitiesBuilder};
use wms_protocol::ResourceRequest;

pub const GEOMET: &str = "http://geomet.test/geomet";
pub const BASEMAP: &str = "http://basemap.test/wms/CBMT";
pub const BACKUP: &str = "http://backup.test/mapbox-proxy";

pub const BACKUP_COLOR: [u8; 4] = [90, 90, 90, 255];
pub const LEGEND_SIZE: (u32, u32) = (8, 12);

pub const WIDTH: u32 = 40;
pub const HEIGHT: u32 = 30;

/// Small frames, no overlays, full opacity: frame pixels equal tile pixels.
pub fn test_config() -> RadarConfig {
    RadarConfig {
        width: WIDTH,
        height: HEIGHT,
        legend: false,
        timestamp: false,
        opacity: 100,
        endpoints: ServiceEndpoints {
            geomet_url: GEOMET.to_string(),
            basemap_url: BASEMAP.to_string(),
            basemap_backup_url: BACKUP.to_string(),
            ..ServiceEndpoints::default()
        },
        ..RadarConfig::new(50.0, -100.0)
    }
}

/// Capabilities listing all three radar layers, rain and snow with styles.
pub fn capabilities(dimension: Option<&str>) -> String {
    CapabilitiesBuilder::new()
        .layer(
            layers::RAIN,
            dimension,
            &[layers::RAIN_STYLE, "RADARURPPRECIPR_Fr"],
        )
        .layer(layers::SNOW, dimension, &[layers::SNOW_STYLE])
        .layer(layers::PRECIP_TYPE, dimension, &[])
        .build()
}

pub struct MockFetcher {
    capabilities: Mutex<Bytes>,
    start: Mutex<Option<DateTime<Utc>>>,
    failing_times: Mutex<HashSet<String>>,
    requests: Mutex<Vec<ResourceRequest>>,
    pub fail_capabilities: AtomicBool,
    pub fail_basemap: AtomicBool,
    pub fail_backup: AtomicBool,
    pub fail_legend: AtomicBool,
}

impl MockFetcher {
    /// A service whose layers all advertise `dimension` (or none).
    pub fn new(dimension: Option<&str>) -> Arc<Self> {
        Arc::new(Self {
            capabilities: Mutex::new(Bytes::from(capabilities(dimension))),
            start: Mutex::new(dimension.and_then(dimension_start)),
            failing_times: Mutex::new(HashSet::new()),
            requests: Mutex::new(Vec::new()),
            fail_capabilities: AtomicBool::new(false),
            fail_basemap: AtomicBool::new(false),
            fail_backup: AtomicBool::new(false),
            fail_legend: AtomicBool::new(false),
        })
    }

    pub fn set_capabilities(&self, xml: String) {
        *self.capabilities.lock().unwrap() = Bytes::from(xml);
    }

    /// Serve an arbitrary capabilities body, e.g. one that is not UTF-8.
    pub fn set_capabilities_bytes(&self, body: &'static [u8]) {
        *self.capabilities.lock().unwrap() = Bytes::from_static(body);
    }

    /// Make radar tiles at `time` (e.g. `2025-02-13T16:54:00Z`) fail.
    pub fn fail_tile_at(&self, time: &str) {
        self.failing_times.lock().unwrap().insert(time.to_string());
    }

    pub fn heal_tiles(&self) {
        self.failing_times.lock().unwrap().clear();
    }

    pub fn requests(&self) -> Vec<ResourceRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests sent to `url` with the given WMS operation.
    pub fn count(&self, url: &str, operation: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url && r.operation() == Some(operation))
            .count()
    }

    pub fn tile_requests(&self) -> usize {
        self.count(GEOMET, "GetMap")
    }

    pub fn capabilities_requests(&self) -> usize {
        self.count(GEOMET, "GetCapabilities")
    }

    pub fn legend_requests(&self) -> usize {
        self.count(GEOMET, "GetLegendGraphic")
    }

    pub fn basemap_requests(&self) -> usize {
        self.count(BASEMAP, "GetMap")
    }

    pub fn backup_requests(&self) -> usize {
        self.count(BACKUP, "GetMap")
    }

    fn failure(request: &ResourceRequest) -> RadarError {
        RadarError::FetchFailed {
            url: request.url.clone(),
            message: "503 Service Unavailable".to_string(),
        }
    }

    fn tile(&self, request: &ResourceRequest) -> RadarResult<Bytes> {
        let time = request.get_param("time").unwrap_or_default();
        if self.failing_times.lock().unwrap().contains(time) {
            return Err(Self::failure(request));
        }
        let index = match (*self.start.lock().unwrap(), parse_iso8601(time)) {
            (Some(start), Ok(time)) => ((time - start).num_minutes() / IMAGE_INTERVAL_MINUTES) as usize,
            _ => 0,
        };
        Ok(Bytes::from(solid_png(WIDTH, HEIGHT, frame_color(index))))
    }
}

fn dimension_start(dimension: &str) -> Option<DateTime<Utc>> {
    parse_iso8601(dimension.split('/').next()?).ok()
}

#[async_trait]
impl ResourceFetcher for MockFetcher {
    async fn fetch_bytes(&self, request: &ResourceRequest) -> RadarResult<Bytes> {
        self.requests.lock().unwrap().push(request.clone());

        match (request.url.as_str(), request.operation()) {
            (BASEMAP, _) if self.fail_basemap.load(Ordering::SeqCst) => Err(Self::failure(request)),
            (BASEMAP, _) => Ok(Bytes::from(solid_png(WIDTH, HEIGHT, colors::BASEMAP))),
            (BACKUP, _) if self.fail_backup.load(Ordering::SeqCst) => Err(Self::failure(request)),
            (BACKUP, _) => Ok(Bytes::from(solid_png(WIDTH, HEIGHT, BACKUP_COLOR))),
            (GEOMET, Some("GetCapabilities")) if self.fail_capabilities.load(Ordering::SeqCst) => {
                Err(Self::failure(request))
            }
            (GEOMET, Some("GetCapabilities")) => Ok(self.capabilities.lock().unwrap().clone()),
            (GEOMET, Some("GetMap")) => self.tile(request),
            (GEOMET, Some("GetLegendGraphic")) if self.fail_legend.load(Ordering::SeqCst) => {
                Err(Self::failure(request))
            }
            (GEOMET, Some("GetLegendGraphic")) => Ok(Bytes::from(solid_png(
                LEGEND_SIZE.0,
                LEGEND_SIZE.1,
                colors::LEGEND,
            ))),
            _ => Err(Self::failure(request)),
        }
    }
}

/// A map over a fresh cache, talking to `fetcher`.
pub fn map_with(config: RadarConfig, fetcher: &Arc<MockFetcher>) -> (RadarMap, Arc<TtlCache<Bytes>>) {
    let cache = Arc::new(TtlCache::new());
    let map = RadarMap::with_cache_and_fetcher(config, cache.clone(), fetcher.clone())
        .expect("valid test config");
    (map, cache)
}
