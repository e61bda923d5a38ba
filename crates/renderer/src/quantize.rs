//! Palette reduction for frames that carry a timestamp label.
//!
//! Frames whose colors already fit in a palette keep them exactly; anything
//! richer goes through NeuQuant.

use color_quant::NeuQuant;
use image::RgbaImage;
use radar_common::{RadarError, RadarResult};

use crate::png::{exact_palette, IndexedPixels, MAX_PALETTE_SIZE};

/// NeuQuant sampling factor: 1 is slowest and best, 30 fastest.
const SAMPLE_FACTOR: i32 = 10;

/// Reduce `img` to at most `colors` palette entries.
pub fn quantize(img: &RgbaImage, colors: usize) -> RadarResult<IndexedPixels> {
    if colors == 0 || colors > MAX_PALETTE_SIZE {
        return Err(RadarError::EncodeError(format!(
            "cannot quantize to {} colors (1..={})",
            colors, MAX_PALETTE_SIZE
        )));
    }

    let pixels = img.as_raw();
    if pixels.is_empty() {
        return Err(RadarError::EncodeError("cannot quantize an empty image".to_string()));
    }

    if let Some(indexed) = exact_palette(pixels) {
        if indexed.palette.len() <= colors {
            return Ok(indexed);
        }
    }

    let nq = NeuQuant::new(SAMPLE_FACTOR, colors, pixels);
    let palette: Vec<[u8; 4]> = nq
        .color_map_rgba()
        .chunks_exact(4)
        .map(|c| [c[0], c[1], c[2], c[3]])
        .collect();
    let indices = pixels
        .chunks_exact(4)
        .map(|px| nq.index_of(px) as u8)
        .collect();

    Ok(IndexedPixels { palette, indices })
}
