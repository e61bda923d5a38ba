//! Property-style tests for the radius bounding box computation.

use radar_common::bbox::{compute_bbox, BoundingBox};
use radar_common::RadarError;

// ============================================================================
// Monotonicity
// ============================================================================

#[test]
fn test_larger_radius_widens_every_side() {
    let centers = [(50.0, -100.0), (45.4, -75.7), (-33.9, 151.2), (0.0, 0.0)];
    for (lat, lon) in centers {
        let mut previous: Option<BoundingBox> = None;
        for radius in [10.0, 50.0, 100.0, 200.0, 400.0, 800.0] {
            let bbox = compute_bbox(radius, lat, lon).unwrap();
            if let Some(prev) = previous {
                assert!(bbox.lat_min < prev.lat_min, "lat_min at r={}", radius);
                assert!(bbox.lat_max > prev.lat_max, "lat_max at r={}", radius);
                assert!(bbox.lon_min < prev.lon_min, "lon_min at r={}", radius);
                assert!(bbox.lon_max > prev.lon_max, "lon_max at r={}", radius);
                assert!(bbox.lon_span() > prev.lon_span());
            }
            previous = Some(bbox);
        }
    }
}

#[test]
fn test_box_contains_center() {
    let bbox = compute_bbox(200.0, 50.0, -100.0).unwrap();
    assert!(bbox.contains_point(50.0, -100.0));
    assert!(bbox.lat_min < bbox.lat_max);
    assert!(bbox.lon_min < bbox.lon_max);
}

#[test]
fn test_box_is_symmetric_about_center() {
    let bbox = compute_bbox(150.0, 45.0, -75.0).unwrap();
    assert!(((bbox.lat_min + bbox.lat_max) / 2.0 - 45.0).abs() < 1e-4);
    assert!(((bbox.lon_min + bbox.lon_max) / 2.0 - (-75.0)).abs() < 1e-4);
}

#[test]
fn test_longitude_spread_grows_with_latitude() {
    let equator = compute_bbox(200.0, 0.0, 0.0).unwrap();
    let north = compute_bbox(200.0, 60.0, 0.0).unwrap();
    assert!(north.lon_span() > equator.lon_span());
    assert!((north.lat_span() - equator.lat_span()).abs() < 1e-4);
}

// ============================================================================
// Domain errors
// ============================================================================

#[test]
fn test_radius_reaching_pole_is_invalid() {
    // 89.9 degrees north with a 200 km radius wraps past the pole
    let err = compute_bbox(200.0, 89.9, 10.0).unwrap_err();
    assert!(matches!(err, RadarError::InvalidGeometry(_)));
    assert!(err.is_user_input());
}

#[test]
fn test_deterministic_output() {
    let a = compute_bbox(200.0, 50.0, -100.0).unwrap();
    let b = compute_bbox(200.0, 50.0, -100.0).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.to_wms_string(), b.to_wms_string());
}
