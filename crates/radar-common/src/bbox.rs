//! Bounding box types and the radius-around-a-point computation.

use serde::{Deserialize, Serialize};

use crate::error::{RadarError, RadarResult};

/// Mean earth radius used by the great-circle approximation.
pub const EARTH_RADIUS_KM: f64 = 6371.01;

/// Decimal places kept in computed boxes so query strings stay stable.
const BBOX_PRECISION: i32 = 5;

/// A geographic bounding box in degrees (EPSG:4326).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub lat_min: f64,
    pub lon_min: f64,
    pub lat_max: f64,
    pub lon_max: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(lat_min: f64, lon_min: f64, lat_max: f64, lon_max: f64) -> Self {
        Self {
            lat_min,
            lon_min,
            lat_max,
            lon_max,
        }
    }

    /// WMS 1.3.0 BBOX parameter for EPSG:4326, which uses lat/lon axis order:
    /// "lat_min,lon_min,lat_max,lon_max"
    pub fn to_wms_string(&self) -> String {
        format!(
            "{},{},{},{}",
            self.lat_min, self.lon_min, self.lat_max, self.lon_max
        )
    }

    /// Latitude span in degrees.
    pub fn lat_span(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Longitude span in degrees.
    pub fn lon_span(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    /// Check if a point is contained within this bbox.
    pub fn contains_point(&self, lat: f64, lon: f64) -> bool {
        lat >= self.lat_min && lat <= self.lat_max && lon >= self.lon_min && lon <= self.lon_max
    }
}

fn round_to_precision(value: f64) -> f64 {
    let factor = 10f64.powi(BBOX_PRECISION);
    (value * factor).round() / factor
}

/// Compute the box covering `radius_km` around a center point.
///
/// Uses a spherical-earth angular distance: the latitude extent is the
/// angular radius itself, the longitude extent is
/// `asin(sin(angular) / cos(lat))`. The longitude term is undefined at the
/// poles (and for radii that wrap past them), which is reported as
/// [`RadarError::InvalidGeometry`] rather than producing NaN.
pub fn compute_bbox(radius_km: f64, lat: f64, lon: f64) -> RadarResult<BoundingBox> {
    if !radius_km.is_finite() || radius_km <= 0.0 {
        return Err(RadarError::InvalidGeometry(format!(
            "radius must be a positive number of kilometres, got {}",
            radius_km
        )));
    }
    if !lat.is_finite() || !lon.is_finite() {
        return Err(RadarError::InvalidGeometry(format!(
            "coordinates must be finite, got ({}, {})",
            lat, lon
        )));
    }

    let lat_rad = lat.to_radians();
    let lon_rad = lon.to_radians();
    let angular = radius_km / EARTH_RADIUS_KM;

    let cos_lat = lat_rad.cos();
    let ratio = angular.sin() / cos_lat;
    if cos_lat.abs() < f64::EPSILON || !ratio.is_finite() || ratio.abs() > 1.0 {
        return Err(RadarError::InvalidGeometry(format!(
            "a {} km radius around latitude {} reaches a pole",
            radius_km, lat
        )));
    }
    let delta_lon = ratio.asin();

    Ok(BoundingBox {
        lat_min: round_to_precision((lat_rad - angular).to_degrees()),
        lon_min: round_to_precision((lon_rad - delta_lon).to_degrees()),
        lat_max: round_to_precision((lat_rad + angular).to_degrees()),
        lon_max: round_to_precision((lon_rad + delta_lon).to_degrees()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_bbox_known_values() {
        let bbox = compute_bbox(200.0, 50.0, -100.0).unwrap();
        assert!((bbox.lat_min - 48.20136).abs() < 1e-9);
        assert!((bbox.lat_max - 51.79864).abs() < 1e-9);
        assert!((bbox.lon_min - (-102.79884)).abs() < 1e-9);
        assert!((bbox.lon_max - (-97.20116)).abs() < 1e-9);
    }

    #[test]
    fn test_compute_bbox_rounds_to_five_places() {
        let bbox = compute_bbox(123.456, 45.123, -75.987).unwrap();
        for v in [bbox.lat_min, bbox.lon_min, bbox.lat_max, bbox.lon_max] {
            let scaled = v * 100_000.0;
            assert!((scaled - scaled.round()).abs() < 1e-6, "{} not rounded", v);
        }
    }

    #[test]
    fn test_compute_bbox_pole_is_error() {
        let err = compute_bbox(200.0, 90.0, 0.0).unwrap_err();
        assert!(matches!(err, RadarError::InvalidGeometry(_)));

        let err = compute_bbox(200.0, -90.0, 0.0).unwrap_err();
        assert!(matches!(err, RadarError::InvalidGeometry(_)));
    }

    #[test]
    fn test_compute_bbox_rejects_bad_radius() {
        assert!(compute_bbox(0.0, 45.0, -75.0).is_err());
        assert!(compute_bbox(f64::NAN, 45.0, -75.0).is_err());
    }

    #[test]
    fn test_wms_string_order() {
        let bbox = BoundingBox::new(1.5, -2.25, 3.0, -1.0);
        assert_eq!(bbox.to_wms_string(), "1.5,-2.25,3,-1");
    }
}
