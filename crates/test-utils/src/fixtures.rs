//! Common test fixtures for radar tests.
//!
//! Pre-defined values that show up across the test suite.

/// Map centers used in tests, as (lat, lon).
pub mod coords {
    /// Southern Manitoba, the default location in most tests
    pub const MANITOBA: (f64, f64) = (50.0, -100.0);

    /// Ottawa
    pub const OTTAWA: (f64, f64) = (45.0, -75.0);

    /// North pole, where the bounding box is undefined
    pub const NORTH_POLE: (f64, f64) = (90.0, 0.0);
}

/// Time dimension strings as published in capabilities documents.
pub mod dimensions {
    /// Three hours of imagery at the six minute cadence (31 frames)
    pub const THREE_HOURS: &str = "2025-02-13T13:54:00Z/2025-02-13T16:54:00Z/PT6M";
    pub const THREE_HOURS_FRAMES: usize = 31;
    pub const THREE_HOURS_START: &str = "2025-02-13T13:54:00Z";
    pub const THREE_HOURS_END: &str = "2025-02-13T16:54:00Z";

    /// Thirty minutes (6 frames), handy for quick loops
    pub const HALF_HOUR: &str = "2025-02-13T16:24:00Z/2025-02-13T16:54:00Z/PT6M";
    pub const HALF_HOUR_FRAMES: usize = 6;
}

/// WMS layer and style names published by GeoMet.
pub mod layers {
    pub const RAIN: &str = "RADAR_1KM_RRAI";
    pub const SNOW: &str = "RADAR_1KM_RSNO";
    pub const PRECIP_TYPE: &str = "Radar_1km_SfcPrecipType";

    pub const RAIN_STYLE: &str = "RADARURPPRECIPR";
    pub const SNOW_STYLE: &str = "RADARURPPRECIPS14";
}

/// Colors used by generated images.
pub mod colors {
    pub const BASEMAP: [u8; 4] = [40, 90, 160, 255];
    pub const RADAR: [u8; 4] = [0, 200, 0, 255];
    pub const LEGEND: [u8; 4] = [250, 250, 0, 255];
    pub const WHITE: [u8; 4] = [255, 255, 255, 255];
}
