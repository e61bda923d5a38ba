//! Image compositing for radar frames and loops.
//!
//! Implements:
//! - Frame compositing (basemap, radar layers, legends, timestamp label)
//! - Palette quantization
//! - PNG encoding (indexed and RGBA)
//! - Animated GIF assembly

pub mod animation;
pub mod composite;
pub mod label;
pub mod png;
pub mod quantize;

pub use animation::{encode_gif, hold_last_frame, DEFAULT_FPS, HOLD_LAST_FRAME};
pub use composite::{composite, CompositeInput};
pub use label::{format_label, render_label, LabelFont};
