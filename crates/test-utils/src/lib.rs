//! Shared test utilities for the radar workspace.
//!
//! This crate provides common testing infrastructure including:
//! - Synthetic PNG tiles, basemaps and legends
//! - Capabilities document builders
//! - Common fixtures (coordinates, dimensions)
//!
//! # Usage
//!
//! Add to your crate's `Cargo.toml`:
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { path = "../test-utils" }
//! ```

pub mod fixtures;
pub mod generators;
pub mod paths;

// Re-export commonly used items at the crate root
pub use fixtures::*;
pub use generators::*;
pub use paths::*;

/// Macro for approximate floating-point equality assertions.
///
/// # Usage
///
/// ```ignore
/// use test_utils::assert_approx_eq;
///
/// assert_approx_eq!(1.0001_f64, 1.0_f64, 0.001_f64); // passes
/// assert_approx_eq!(1.1_f32, 1.0_f32, 0.001_f32);    // fails
/// ```
#[macro_export]
macro_rules! assert_approx_eq {
    ($left:expr, $right:expr, $epsilon:expr) => {{
        let left: f64 = $left as f64;
        let right: f64 = $right as f64;
        let epsilon: f64 = $epsilon as f64;
        let diff = (left - right).abs();
        if diff > epsilon {
            panic!(
                "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}` > epsilon `{:?}`",
                left, right, diff, epsilon
            );
        }
    }};
}

/// Macro asserting two RGBA pixels differ by at most `tolerance` per channel.
#[macro_export]
macro_rules! assert_pixel_near {
    ($left:expr, $right:expr, $tolerance:expr) => {{
        let left: [u8; 4] = $left;
        let right: [u8; 4] = $right;
        for channel in 0..4 {
            let diff = (left[channel] as i16 - right[channel] as i16).abs();
            if diff > $tolerance as i16 {
                panic!(
                    "assertion failed: pixels differ in channel {}\n  left: `{:?}`,\n right: `{:?}`",
                    channel, left, right
                );
            }
        }
    }};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_assert_approx_eq_passes() {
        assert_approx_eq!(1.0001, 1.0, 0.001);
        assert_approx_eq!(0.0, 0.0, 0.0001);
        assert_approx_eq!(-5.5, -5.500001, 0.0001);
    }

    #[test]
    #[should_panic(expected = "assertion failed")]
    fn test_assert_approx_eq_fails() {
        assert_approx_eq!(1.1, 1.0, 0.001);
    }

    #[test]
    fn test_assert_pixel_near_passes() {
        assert_pixel_near!([10, 20, 30, 255], [12, 19, 30, 255], 2);
    }

    #[test]
    #[should_panic(expected = "channel 0")]
    fn test_assert_pixel_near_fails() {
        assert_pixel_near!([10, 20, 30, 255], [40, 20, 30, 255], 2);
    }
}
