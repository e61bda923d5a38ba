//! Time handling for layer time dimensions and animation ticks.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Publication cadence of the radar imagery.
pub const IMAGE_INTERVAL_MINUTES: i64 = 6;

/// The inclusive range of image timestamps a layer currently offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeDimension {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeDimension {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (end >= start).then_some(Self { start, end })
    }

    /// Parse a WMS time dimension declaration of the form `start/end/step`.
    ///
    /// Only the first two fields are used; the step is implied by the
    /// publication cadence. Returns `None` for anything that is not a
    /// well-formed, ordered range.
    pub fn from_wms_dimension(s: &str) -> Option<Self> {
        let mut parts = s.trim().split('/');
        let start = parse_iso8601(parts.next()?).ok()?;
        let end = parse_iso8601(parts.next()?).ok()?;
        Self::new(start, end)
    }

    /// The most recent frame the layer has published.
    pub fn latest(&self) -> DateTime<Utc> {
        self.end
    }

    /// Number of ticks between start and end inclusive.
    pub fn tick_count(&self) -> usize {
        let span = (self.end - self.start).num_minutes();
        (span / IMAGE_INTERVAL_MINUTES) as usize + 1
    }
}

/// All frame timestamps from `start` to `end` inclusive, six minutes apart.
pub fn frame_ticks(dimension: &TimeDimension) -> Vec<DateTime<Utc>> {
    let step = Duration::minutes(IMAGE_INTERVAL_MINUTES);
    let mut ticks = Vec::with_capacity(dimension.tick_count());
    let mut current = dimension.start;
    while current <= dimension.end {
        ticks.push(current);
        current += step;
    }
    ticks
}

/// Minute-resolution timestamp used both as the WMS TIME value and in cache keys.
pub fn minute_key(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:00Z").to_string()
}

/// Parse an ISO 8601 instant, assuming UTC when no offset is present.
pub fn parse_iso8601(s: &str) -> Result<DateTime<Utc>, TimeParseError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(Utc.from_utc_datetime(&ndt));
        }
    }

    Err(TimeParseError::InvalidFormat(s.to_string()))
}

#[derive(Debug, thiserror::Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_parse_dimension() {
        let dim =
            TimeDimension::from_wms_dimension("2025-02-13T13:54:00Z/2025-02-13T16:54:00Z/PT6M")
                .unwrap();
        assert_eq!(dim.start.hour(), 13);
        assert_eq!(dim.end.hour(), 16);
        assert_eq!(dim.latest(), dim.end);
        assert_eq!(dim.tick_count(), 31);
    }

    #[test]
    fn test_parse_dimension_rejects_garbage() {
        assert!(TimeDimension::from_wms_dimension("").is_none());
        assert!(TimeDimension::from_wms_dimension("2025-02-13T13:54:00Z").is_none());
        assert!(TimeDimension::from_wms_dimension("yesterday/today/PT6M").is_none());
    }

    #[test]
    fn test_parse_dimension_rejects_reversed_range() {
        assert!(TimeDimension::from_wms_dimension(
            "2025-02-13T16:54:00Z/2025-02-13T13:54:00Z/PT6M"
        )
        .is_none());
    }

    #[test]
    fn test_frame_ticks_inclusive() {
        let dim =
            TimeDimension::from_wms_dimension("2025-02-13T13:54:00Z/2025-02-13T16:54:00Z/PT6M")
                .unwrap();
        let ticks = frame_ticks(&dim);
        assert_eq!(ticks.len(), 31);
        assert_eq!(ticks[0], dim.start);
        assert_eq!(*ticks.last().unwrap(), dim.end);
        assert!(ticks.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_single_instant_dimension_has_one_tick() {
        let t = parse_iso8601("2025-02-13T13:54:00Z").unwrap();
        let dim = TimeDimension::new(t, t).unwrap();
        assert_eq!(frame_ticks(&dim), vec![t]);
    }

    #[test]
    fn test_minute_key() {
        let t = parse_iso8601("2025-02-13T13:54:27Z").unwrap();
        assert_eq!(minute_key(&t), "2025-02-13T13:54:00Z");
    }

    #[test]
    fn test_parse_without_offset_assumes_utc() {
        let a = parse_iso8601("2025-02-13T13:54:00").unwrap();
        let b = parse_iso8601("2025-02-13T13:54:00Z").unwrap();
        assert_eq!(a, b);
    }
}
