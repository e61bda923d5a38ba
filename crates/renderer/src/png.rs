//! PNG encoding for composited frames.
//!
//! Supports two encoding modes:
//! - **Indexed PNG (color type 3)**: used when the frame has ≤256 distinct
//!   colors, or after palette quantization.
//! - **RGBA PNG (color type 6)**: fallback for full-color frames.
//!
//! `encode_auto` picks the mode; `encode_indexed` is the path quantized
//! frames take.

use std::collections::HashMap;
use std::io::Write;

use image::RgbaImage;
use radar_common::{RadarError, RadarResult};
use rayon::prelude::*;

/// Maximum colors for indexed PNG (PNG8)
pub const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096; // 64x64 or larger

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// A palette plus one index per pixel, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedPixels {
    pub palette: Vec<[u8; 4]>,
    pub indices: Vec<u8>,
}

/// Encode a frame, using an indexed PNG when its colors fit in a palette.
pub fn encode_auto(img: &RgbaImage) -> RadarResult<Vec<u8>> {
    match exact_palette(img.as_raw()) {
        Some(indexed) => encode_indexed(img.width(), img.height(), &indexed),
        None => encode_rgba(img),
    }
}

#[inline(always)]
fn pack(px: &[u8]) -> u32 {
    u32::from_le_bytes([px[0], px[1], px[2], px[3]])
}

/// Collect the exact palette of an RGBA buffer.
///
/// Returns `None` when there are more than [`MAX_PALETTE_SIZE`] colors.
/// Palette order is first appearance for small buffers; larger buffers are
/// scanned in parallel and the order is unspecified.
pub fn exact_palette(pixels: &[u8]) -> Option<IndexedPixels> {
    if pixels.len() / 4 >= PARALLEL_THRESHOLD {
        exact_palette_parallel(pixels)
    } else {
        exact_palette_sequential(pixels)
    }
}

fn exact_palette_sequential(pixels: &[u8]) -> Option<IndexedPixels> {
    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices = Vec::with_capacity(pixels.len() / 4);

    for px in pixels.chunks_exact(4) {
        let key = pack(px);
        let index = match lookup.get(&key) {
            Some(&index) => index,
            None => {
                if palette.len() == MAX_PALETTE_SIZE {
                    return None;
                }
                let index = palette.len() as u8;
                palette.push([px[0], px[1], px[2], px[3]]);
                lookup.insert(key, index);
                index
            }
        };
        indices.push(index);
    }

    Some(IndexedPixels { palette, indices })
}

fn exact_palette_parallel(pixels: &[u8]) -> Option<IndexedPixels> {
    let chunk_pixels = (pixels.len() / 4 / rayon::current_num_threads()).max(256);

    // Per-chunk distinct colors, bailing out as soon as a chunk alone overflows
    let per_chunk: Vec<Option<Vec<u32>>> = pixels
        .par_chunks(chunk_pixels * 4)
        .map(|chunk| {
            let mut seen: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
            for px in chunk.chunks_exact(4) {
                seen.insert(pack(px), ());
                if seen.len() > MAX_PALETTE_SIZE {
                    return None;
                }
            }
            Some(seen.into_keys().collect())
        })
        .collect();

    let mut lookup: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    for colors in per_chunk {
        for key in colors? {
            if lookup.contains_key(&key) {
                continue;
            }
            if palette.len() == MAX_PALETTE_SIZE {
                return None;
            }
            lookup.insert(key, palette.len() as u8);
            palette.push(key.to_le_bytes());
        }
    }

    let indices = pixels
        .par_chunks_exact(4)
        .map(|px| lookup.get(&pack(px)).copied().unwrap_or(0))
        .collect();

    Some(IndexedPixels { palette, indices })
}

/// Encode an indexed PNG (color type 3).
///
/// A `tRNS` chunk is written only when some palette entry is not opaque.
pub fn encode_indexed(width: u32, height: u32, indexed: &IndexedPixels) -> RadarResult<Vec<u8>> {
    if indexed.palette.is_empty() || indexed.palette.len() > MAX_PALETTE_SIZE {
        return Err(RadarError::EncodeError(format!(
            "palette must hold 1..={} colors, got {}",
            MAX_PALETTE_SIZE,
            indexed.palette.len()
        )));
    }
    check_len(indexed.indices.len(), width, height, 1)?;

    let mut png = Vec::with_capacity(indexed.indices.len() / 2);
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));

    let plte: Vec<u8> = indexed.palette.iter().flat_map(|c| [c[0], c[1], c[2]]).collect();
    write_chunk(&mut png, b"PLTE", &plte);

    if indexed.palette.iter().any(|c| c[3] < 255) {
        let trns: Vec<u8> = indexed.palette.iter().map(|c| c[3]).collect();
        write_chunk(&mut png, b"tRNS", &trns);
    }

    let idat = deflate_scanlines(&indexed.indices, width as usize)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

/// Encode a full-color RGBA PNG (color type 6).
pub fn encode_rgba(img: &RgbaImage) -> RadarResult<Vec<u8>> {
    let (width, height) = img.dimensions();
    check_len(img.as_raw().len(), width, height, 4)?;

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);
    write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));
    let idat = deflate_scanlines(img.as_raw(), width as usize * 4)?;
    write_chunk(&mut png, b"IDAT", &idat);
    write_chunk(&mut png, b"IEND", &[]);

    Ok(png)
}

fn check_len(len: usize, width: u32, height: u32, bytes_per_pixel: usize) -> RadarResult<()> {
    let expected = width as usize * height as usize * bytes_per_pixel;
    if width == 0 || height == 0 || len != expected {
        return Err(RadarError::EncodeError(format!(
            "{}x{} image needs {} bytes of pixel data, got {}",
            width, height, expected, len
        )));
    }
    Ok(())
}

fn ihdr(width: u32, height: u32, color_type: u8) -> [u8; 13] {
    let mut data = [0u8; 13];
    data[..4].copy_from_slice(&width.to_be_bytes());
    data[4..8].copy_from_slice(&height.to_be_bytes());
    data[8] = 8; // bit depth
    data[9] = color_type;
    // compression, filter and interlace methods stay 0
    data
}

/// Prefix each scanline with filter type 0 and zlib-compress the result.
fn deflate_scanlines(data: &[u8], row_bytes: usize) -> RadarResult<Vec<u8>> {
    let rows = data.len() / row_bytes;
    let mut raw = Vec::with_capacity(rows * (row_bytes + 1));
    for row in data.chunks_exact(row_bytes) {
        raw.push(0);
        raw.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
    encoder
        .write_all(&raw)
        .and_then(|_| encoder.finish())
        .map_err(|e| RadarError::EncodeError(format!("IDAT compression failed: {}", e)))
}

fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_exact_palette_shares_indices() {
        let pixels = [
            255, 0, 0, 255, // red
            0, 255, 0, 255, // green
            0, 0, 255, 255, // blue
            255, 0, 0, 255, // red again
        ];
        let indexed = exact_palette_sequential(&pixels).unwrap();
        assert_eq!(indexed.palette.len(), 3);
        assert_eq!(indexed.indices, vec![0, 1, 2, 0]);
    }

    #[test]
    fn test_exact_palette_keeps_alpha() {
        let pixels = [255, 0, 0, 255, 0, 0, 0, 0];
        let indexed = exact_palette_sequential(&pixels).unwrap();
        assert!(indexed.palette.contains(&[0, 0, 0, 0]));
        assert!(indexed.palette.contains(&[255, 0, 0, 255]));
    }

    #[test]
    fn test_exact_palette_overflow() {
        let pixels: Vec<u8> = (0..300u32).flat_map(|i| [(i % 256) as u8, (i / 256) as u8, 0, 255]).collect();
        assert!(exact_palette_sequential(&pixels).is_none());
    }

    #[test]
    fn test_parallel_matches_sequential_colors() {
        let img = RgbaImage::from_fn(128, 128, |x, y| {
            let band = ((x / 8 + y / 8) % 50) as u8;
            Rgba([band * 5, 100 + band, 200 - band, 255])
        });
        let parallel = exact_palette_parallel(img.as_raw()).unwrap();
        let sequential = exact_palette_sequential(img.as_raw()).unwrap();
        assert_eq!(parallel.palette.len(), sequential.palette.len());
        assert_eq!(parallel.indices.len(), 128 * 128);

        // Every pixel must map back to its own color
        for (px, &index) in img.as_raw().chunks_exact(4).zip(&parallel.indices) {
            assert_eq!(&parallel.palette[index as usize][..], px);
        }
    }

    #[test]
    fn test_rejects_wrong_buffer_length() {
        let indexed = IndexedPixels {
            palette: vec![[0, 0, 0, 255]],
            indices: vec![0; 5],
        };
        assert!(matches!(
            encode_indexed(2, 2, &indexed),
            Err(RadarError::EncodeError(_))
        ));
    }

    #[test]
    fn test_ihdr_layout() {
        let data = ihdr(800, 600, 3);
        assert_eq!(&data[..4], &800u32.to_be_bytes());
        assert_eq!(&data[4..8], &600u32.to_be_bytes());
        assert_eq!(data[8], 8);
        assert_eq!(data[9], 3);
    }
}
