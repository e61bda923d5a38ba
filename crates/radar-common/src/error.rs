//! Error types for the radar map engine.

use thiserror::Error;

/// Result type alias using RadarError.
pub type RadarResult<T> = Result<T, RadarError>;

/// Primary error type for radar map operations.
#[derive(Debug, Error)]
pub enum RadarError {
    // === Input Errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Unknown layer: {0}")]
    UnknownLayer(String),

    // === Network Errors ===
    #[error("Fetch failed for {url}: {message}")]
    FetchFailed { url: String, message: String },

    #[error("Request timeout: {0}")]
    Timeout(String),

    // === Service Data Errors ===
    #[error("Layer not found in capabilities: {0}")]
    LayerNotFound(String),

    #[error("No legend style available for layer: {0}")]
    StyleNotFound(String),

    #[error("Data not available: {0}")]
    DataNotAvailable(String),

    #[error("Invalid capabilities document: {0}")]
    CapabilitiesError(String),

    // === Image Errors ===
    #[error("Rendering failed: {0}")]
    RenderError(String),

    #[error("Encoding failed: {0}")]
    EncodeError(String),

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl RadarError {
    /// Network failures that a caller may retry or route around.
    pub fn is_transient(&self) -> bool {
        matches!(self, RadarError::FetchFailed { .. } | RadarError::Timeout(_))
    }

    /// Errors caused by caller-supplied configuration rather than the service.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            RadarError::InvalidParameter { .. }
                | RadarError::InvalidGeometry(_)
                | RadarError::UnknownLayer(_)
        )
    }

    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        RadarError::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for RadarError {
    fn from(err: std::io::Error) -> Self {
        RadarError::InternalError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let fetch = RadarError::FetchFailed {
            url: "https://example.test".to_string(),
            message: "connection refused".to_string(),
        };
        assert!(fetch.is_transient());
        assert!(RadarError::Timeout("10s".to_string()).is_transient());
        assert!(!RadarError::StyleNotFound("rain".to_string()).is_transient());
    }

    #[test]
    fn test_user_input_classification() {
        assert!(RadarError::InvalidGeometry("pole".to_string()).is_user_input());
        assert!(RadarError::invalid_parameter("radius", "too small").is_user_input());
        assert!(!RadarError::RenderError("bad png".to_string()).is_user_input());
    }

    #[test]
    fn test_error_display() {
        let err = RadarError::invalid_parameter("opacity", "must be between 0 and 100");
        assert_eq!(
            err.to_string(),
            "Invalid parameter value for 'opacity': must be between 0 and 100"
        );
    }
}
