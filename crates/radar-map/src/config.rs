//! Radar map configuration.
//!
//! Settings come from, in increasing priority: built-in defaults, a YAML
//! file, and `RADAR_*` environment variables. Everything is checked by
//! [`RadarConfig::validate`] before a map is built.

use std::path::{Path, PathBuf};
use std::time::Duration;

use radar_common::{Language, Layer, RadarError, RadarResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

pub const MIN_RADIUS_KM: u32 = 10;
pub const MIN_IMAGE_SIZE: u32 = 10;

/// Options for one radar map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarConfig {
    pub latitude: f64,
    pub longitude: f64,
    /// Distance from the center to the map edge, in km
    #[serde(default = "default_radius")]
    pub radius: u32,
    #[serde(default = "default_image_size")]
    pub width: u32,
    #[serde(default = "default_image_size")]
    pub height: u32,
    #[serde(default = "default_true")]
    pub legend: bool,
    #[serde(default = "default_true")]
    pub timestamp: bool,
    /// Radar layer opacity in percent
    #[serde(default = "default_opacity")]
    pub opacity: u8,
    #[serde(default = "default_layers")]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub language: Language,
    /// TrueType font for timestamp labels; system fonts are tried otherwise
    #[serde(default)]
    pub label_font: Option<PathBuf>,
    #[serde(default)]
    pub endpoints: ServiceEndpoints,
}

fn default_radius() -> u32 {
    200
}

fn default_image_size() -> u32 {
    800
}

fn default_true() -> bool {
    true
}

fn default_opacity() -> u8 {
    65
}

fn default_layers() -> Vec<Layer> {
    vec![Layer::Rain]
}

impl RadarConfig {
    /// Defaults for a map centred on (`latitude`, `longitude`).
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            radius: default_radius(),
            width: default_image_size(),
            height: default_image_size(),
            legend: true,
            timestamp: true,
            opacity: default_opacity(),
            layers: default_layers(),
            language: Language::default(),
            label_font: None,
            endpoints: ServiceEndpoints::default(),
        }
    }

    /// Build from the environment. `RADAR_LATITUDE` and `RADAR_LONGITUDE`
    /// are required; every other setting is optional.
    pub fn from_env() -> RadarResult<Self> {
        let latitude = required_env("RADAR_LATITUDE")?;
        let longitude = required_env("RADAR_LONGITUDE")?;
        Self::new(latitude, longitude).with_env_overrides()
    }

    /// Load from a YAML file, then apply environment overrides.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> RadarResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| {
            RadarError::invalid_parameter(
                "config",
                format!("failed to parse {}: {}", path.display(), e),
            )
        })?;
        debug!(path = %path.display(), "Loaded radar config");
        config.with_env_overrides()
    }

    /// Apply `RADAR_*` environment variables on top of this config.
    ///
    /// Unparsable numeric values are ignored with a warning; an unknown
    /// layer or language is an error.
    pub fn with_env_overrides(mut self) -> RadarResult<Self> {
        if let Some(val) = env_parse("RADAR_LATITUDE") {
            self.latitude = val;
        }
        if let Some(val) = env_parse("RADAR_LONGITUDE") {
            self.longitude = val;
        }
        if let Some(val) = env_parse("RADAR_RADIUS") {
            self.radius = val;
        }
        if let Some(val) = env_parse("RADAR_WIDTH") {
            self.width = val;
        }
        if let Some(val) = env_parse("RADAR_HEIGHT") {
            self.height = val;
        }
        if let Some(val) = env_parse("RADAR_OPACITY") {
            self.opacity = val;
        }
        if let Ok(val) = std::env::var("RADAR_LEGEND") {
            self.legend = parse_flag(&val);
        }
        if let Ok(val) = std::env::var("RADAR_TIMESTAMP") {
            self.timestamp = parse_flag(&val);
        }
        if let Ok(val) = std::env::var("RADAR_LAYERS") {
            self.layers = val
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.parse::<Layer>())
                .collect::<RadarResult<_>>()?;
        }
        if let Ok(val) = std::env::var("RADAR_LANGUAGE") {
            self.language = val.parse()?;
        }
        if let Ok(val) = std::env::var("RADAR_LABEL_FONT") {
            self.label_font = Some(PathBuf::from(val));
        }
        self.endpoints = self.endpoints.with_env_overrides();
        Ok(self)
    }

    /// Check every setting, reporting the first one that is out of range.
    pub fn validate(&self) -> RadarResult<()> {
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(RadarError::invalid_parameter(
                "latitude",
                format!("{} is outside -90..=90", self.latitude),
            ));
        }
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(RadarError::invalid_parameter(
                "longitude",
                format!("{} is outside -180..=180", self.longitude),
            ));
        }
        if self.radius < MIN_RADIUS_KM {
            return Err(RadarError::invalid_parameter(
                "radius",
                format!("must be at least {} km, got {}", MIN_RADIUS_KM, self.radius),
            ));
        }
        for (param, value) in [("width", self.width), ("height", self.height)] {
            if value < MIN_IMAGE_SIZE {
                return Err(RadarError::invalid_parameter(
                    param,
                    format!("must be at least {} px, got {}", MIN_IMAGE_SIZE, value),
                ));
            }
        }
        if self.opacity > 100 {
            return Err(RadarError::invalid_parameter(
                "opacity",
                format!("must be between 0 and 100, got {}", self.opacity),
            ));
        }
        if self.layers.is_empty() {
            return Err(RadarError::invalid_parameter("layers", "at least one layer is required"));
        }
        self.endpoints.validate()
    }
}

/// Where imagery comes from, and how requests are made.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceEndpoints {
    /// GeoMet WMS endpoint for capabilities, radar tiles and legends
    #[serde(default = "default_geomet_url")]
    pub geomet_url: String,
    /// Primary basemap WMS (NRCan Canada Base Map)
    #[serde(default = "default_basemap_url")]
    pub basemap_url: String,
    /// Fallback basemap provider, queried with the same parameters
    #[serde(default = "default_basemap_backup_url")]
    pub basemap_backup_url: String,
    #[serde(default = "default_basemap_layer")]
    pub basemap_layer: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_geomet_url() -> String {
    "https://geo.weather.gc.ca/geomet".to_string()
}

fn default_basemap_url() -> String {
    "https://maps.geogratis.gc.ca/wms/CBMT".to_string()
}

fn default_basemap_backup_url() -> String {
    "https://0wmiyoko9f.execute-api.ca-central-1.amazonaws.com/mapbox-proxy".to_string()
}

fn default_basemap_layer() -> String {
    "CBMT".to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_user_agent() -> String {
    crate::fetcher::USER_AGENT.to_string()
}

impl Default for ServiceEndpoints {
    fn default() -> Self {
        Self {
            geomet_url: default_geomet_url(),
            basemap_url: default_basemap_url(),
            basemap_backup_url: default_basemap_backup_url(),
            basemap_layer: default_basemap_layer(),
            request_timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ServiceEndpoints {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("RADAR_GEOMET_URL") {
            self.geomet_url = val;
        }
        if let Ok(val) = std::env::var("RADAR_BASEMAP_URL") {
            self.basemap_url = val;
        }
        if let Ok(val) = std::env::var("RADAR_BASEMAP_BACKUP_URL") {
            self.basemap_backup_url = val;
        }
        if let Some(val) = env_parse("RADAR_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = val;
        }
        if let Ok(val) = std::env::var("RADAR_USER_AGENT") {
            self.user_agent = val;
        }
        self
    }

    pub fn validate(&self) -> RadarResult<()> {
        for (param, url) in [
            ("geomet_url", &self.geomet_url),
            ("basemap_url", &self.basemap_url),
            ("basemap_backup_url", &self.basemap_backup_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(RadarError::invalid_parameter(
                    param,
                    format!("'{}' is not an http(s) URL", url),
                ));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(RadarError::invalid_parameter(
                "request_timeout_secs",
                "must be at least 1 second",
            ));
        }
        Ok(())
    }
}

fn required_env(name: &str) -> RadarResult<f64> {
    let val = std::env::var(name)
        .map_err(|_| RadarError::invalid_parameter(name, "environment variable is not set"))?;
    val.trim()
        .parse()
        .map_err(|_| RadarError::invalid_parameter(name, format!("'{}' is not a number", val)))
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    let val = std::env::var(name).ok()?;
    match val.trim().parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            warn!(var = name, value = %val, "Ignoring unparsable environment variable");
            None
        }
    }
}

fn parse_flag(val: &str) -> bool {
    val.eq_ignore_ascii_case("true") || val == "1"
}
