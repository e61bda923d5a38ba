//! Frame compositing.
//!
//! A frame is built bottom-up: basemap (or a blank white canvas), radar
//! layers at the configured opacity, legends stacked down the top-right
//! corner, and finally the timestamp label in the top-left corner. Missing
//! inputs are skipped; bytes that are present but cannot be decoded fail
//! the frame.

use bytes::Bytes;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use radar_common::{RadarError, RadarResult};
use tracing::{debug, warn};

use crate::label::{render_label, LabelFont};
use crate::png::{encode_auto, encode_indexed, MAX_PALETTE_SIZE};
use crate::quantize::quantize;

const BLANK_CANVAS: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Everything one frame is built from.
#[derive(Debug, Clone)]
pub struct CompositeInput {
    pub width: u32,
    pub height: u32,
    pub basemap: Option<Bytes>,
    /// Layer tiles in drawing order; missing tiles are already filtered out
    pub layers: Vec<Bytes>,
    /// Legends, top to bottom
    pub legends: Vec<Bytes>,
    /// Layer opacity in percent, 0..=100
    pub opacity: u8,
    /// Timestamp label text; also enables palette quantization
    pub label: Option<String>,
    pub font: Option<LabelFont>,
}

impl CompositeInput {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            basemap: None,
            layers: Vec::new(),
            legends: Vec::new(),
            opacity: 100,
            label: None,
            font: None,
        }
    }
}

/// Composite one frame and encode it as PNG.
pub fn composite(input: &CompositeInput) -> RadarResult<Vec<u8>> {
    if input.width == 0 || input.height == 0 {
        return Err(RadarError::RenderError(format!(
            "invalid frame size {}x{}",
            input.width, input.height
        )));
    }
    if input.opacity > 100 {
        return Err(RadarError::invalid_parameter(
            "opacity",
            format!("{} is outside 0..=100", input.opacity),
        ));
    }

    let mut canvas = match &input.basemap {
        Some(bytes) => fit(decode(bytes, "basemap")?, input.width, input.height),
        None => {
            debug!("No basemap, compositing over blank canvas");
            RgbaImage::from_pixel(input.width, input.height, BLANK_CANVAS)
        }
    };

    for tile in &input.layers {
        let mut layer = fit(decode(tile, "layer")?, input.width, input.height);
        scale_alpha(&mut layer, input.opacity);
        imageops::overlay(&mut canvas, &layer, 0, 0);
    }

    let mut y_offset: i64 = 0;
    for legend in &input.legends {
        // Legends are pasted flattened, without their alpha channel
        let legend = DynamicImage::ImageRgb8(decode(legend, "legend")?.to_rgb8()).to_rgba8();
        let x = input.width as i64 - legend.width() as i64;
        imageops::replace(&mut canvas, &legend, x, y_offset);
        y_offset += legend.height() as i64;
    }

    match &input.label {
        Some(text) => {
            match &input.font {
                Some(font) => imageops::replace(&mut canvas, &render_label(font, text), 0, 0),
                None => warn!(label = %text, "Label requested but no font loaded"),
            }
            let indexed = quantize(&canvas, MAX_PALETTE_SIZE)?;
            encode_indexed(canvas.width(), canvas.height(), &indexed)
        }
        None => encode_auto(&canvas),
    }
}

fn decode(bytes: &[u8], what: &str) -> RadarResult<DynamicImage> {
    image::load_from_memory(bytes)
        .map_err(|e| RadarError::RenderError(format!("cannot decode {} image: {}", what, e)))
}

/// Convert to RGBA and resample to the frame size if the service returned
/// something else.
fn fit(img: DynamicImage, width: u32, height: u32) -> RgbaImage {
    let rgba = img.to_rgba8();
    if rgba.dimensions() == (width, height) {
        rgba
    } else {
        debug!(
            got_width = rgba.width(),
            got_height = rgba.height(),
            width,
            height,
            "Resampling image to frame size"
        );
        imageops::resize(&rgba, width, height, FilterType::Triangle)
    }
}

/// Multiply every pixel's alpha by `percent / 100`, rounding.
pub fn scale_alpha(img: &mut RgbaImage, percent: u8) {
    if percent >= 100 {
        return;
    }
    let percent = percent as u32;
    for px in img.pixels_mut() {
        px.0[3] = ((px.0[3] as u32 * percent + 50) / 100) as u8;
    }
}
