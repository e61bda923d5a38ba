//! WMS request construction.
//!
//! Requests are described as a base URL plus ordered query parameters so the
//! transport layer stays a thin GET and test doubles can route on parameters.

use chrono::{DateTime, Utc};
use radar_common::{minute_key, BoundingBox, Language, Layer};

pub const WMS_VERSION: &str = "1.3.0";

/// A GET request against a map or image service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRequest {
    pub url: String,
    pub params: Vec<(String, String)>,
}

impl ResourceRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: Vec::new(),
        }
    }

    /// Append a query parameter.
    pub fn param(mut self, name: &str, value: impl Into<String>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }

    /// Look up a parameter by case-insensitive name.
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The WMS `request` parameter (GetMap, GetCapabilities, ...).
    pub fn operation(&self) -> Option<&str> {
        self.get_param("request")
    }

    /// Rebuild the same query against another endpoint.
    pub fn with_url(&self, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            params: self.params.clone(),
        }
    }
}

/// The geographic frame shared by every GetMap request of one map.
#[derive(Debug, Clone, Copy)]
pub struct MapRequest {
    pub bbox: BoundingBox,
    pub width: u32,
    pub height: u32,
}

impl MapRequest {
    fn apply(&self, request: ResourceRequest) -> ResourceRequest {
        request
            .param("bbox", self.bbox.to_wms_string())
            .param("width", self.width.to_string())
            .param("height", self.height.to_string())
    }

    /// GetMap for one radar layer at one instant.
    pub fn layer_tile(&self, url: &str, layer: Layer, time: &DateTime<Utc>) -> ResourceRequest {
        let request = ResourceRequest::new(url)
            .param("service", "WMS")
            .param("version", WMS_VERSION)
            .param("request", "GetMap")
            .param("crs", "EPSG:4326")
            .param("format", "image/png");
        self.apply(request)
            .param("layers", layer.wms_name())
            .param("time", minute_key(time))
    }

    /// GetMap for the background map from the base-map provider.
    pub fn basemap(&self, url: &str, basemap_layer: &str) -> ResourceRequest {
        let request = ResourceRequest::new(url)
            .param("service", "wms")
            .param("version", WMS_VERSION)
            .param("request", "GetMap")
            .param("layers", basemap_layer)
            .param("styles", "")
            .param("CRS", "epsg:4326")
            .param("format", "image/png");
        self.apply(request)
    }
}

/// GetCapabilities restricted to one layer.
pub fn capabilities_request(url: &str, layer: Layer, language: Language) -> ResourceRequest {
    ResourceRequest::new(url)
        .param("lang", language.code())
        .param("service", "WMS")
        .param("version", WMS_VERSION)
        .param("request", "GetCapabilities")
        .param("layer", layer.wms_name())
}

/// GetLegendGraphic for a layer rendered with `style`.
pub fn legend_request(url: &str, layer: Layer, style: &str, language: Language) -> ResourceRequest {
    ResourceRequest::new(url)
        .param("service", "WMS")
        .param("version", WMS_VERSION)
        .param("request", "GetLegendGraphic")
        .param("sld_version", "1.1.0")
        .param("format", "image/png")
        .param("lang", language.code())
        .param("layer", layer.wms_name())
        .param("style", style)
}

#[cfg(test)]
mod tests {
    use super::*;
    use radar_common::parse_iso8601;

    fn frame() -> MapRequest {
        MapRequest {
            bbox: BoundingBox::new(48.20136, -102.79884, 51.79864, -97.20116),
            width: 800,
            height: 600,
        }
    }

    #[test]
    fn test_layer_tile_params() {
        let time = parse_iso8601("2025-02-13T16:54:31Z").unwrap();
        let req = frame().layer_tile("https://geo.example/geomet", Layer::Rain, &time);
        assert_eq!(req.operation(), Some("GetMap"));
        assert_eq!(req.get_param("layers"), Some("RADAR_1KM_RRAI"));
        assert_eq!(req.get_param("time"), Some("2025-02-13T16:54:00Z"));
        assert_eq!(
            req.get_param("bbox"),
            Some("48.20136,-102.79884,51.79864,-97.20116")
        );
        assert_eq!(req.get_param("WIDTH"), Some("800"));
        assert_eq!(req.get_param("height"), Some("600"));
    }

    #[test]
    fn test_basemap_params() {
        let req = frame().basemap("https://maps.example/wms/CBMT", "CBMT");
        assert_eq!(req.get_param("layers"), Some("CBMT"));
        assert_eq!(req.get_param("styles"), Some(""));
        assert_eq!(req.get_param("crs"), Some("epsg:4326"));
        let backup = req.with_url("https://proxy.example/mapbox");
        assert_eq!(backup.url, "https://proxy.example/mapbox");
        assert_eq!(backup.params, req.params);
    }

    #[test]
    fn test_capabilities_and_legend_params() {
        let caps = capabilities_request("https://geo.example", Layer::Snow, Language::French);
        assert_eq!(caps.operation(), Some("GetCapabilities"));
        assert_eq!(caps.get_param("layer"), Some("RADAR_1KM_RSNO"));
        assert_eq!(caps.get_param("lang"), Some("fr"));

        let legend = legend_request("https://geo.example", Layer::Rain, "RADARURPPRECIPR", Language::English);
        assert_eq!(legend.operation(), Some("GetLegendGraphic"));
        assert_eq!(legend.get_param("style"), Some("RADARURPPRECIPR"));
        assert_eq!(legend.get_param("sld_version"), Some("1.1.0"));
    }
}
