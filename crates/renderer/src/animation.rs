//! Animated GIF assembly.

use std::io::Cursor;

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};
use radar_common::{RadarError, RadarResult};

/// Frame rate used when the caller does not pick one
pub const DEFAULT_FPS: u32 = 5;

/// Number of extra copies of the final frame, so loops pause on the latest image
pub const HOLD_LAST_FRAME: usize = 3;

/// Append [`HOLD_LAST_FRAME`] copies of the last frame.
pub fn hold_last_frame<T: Clone>(frames: &mut Vec<T>) {
    if let Some(last) = frames.last().cloned() {
        frames.extend(std::iter::repeat(last).take(HOLD_LAST_FRAME));
    }
}

/// Encode PNG frames into an infinitely repeating GIF at `fps` frames per second.
pub fn encode_gif<B: AsRef<[u8]>>(frames: &[B], fps: u32) -> RadarResult<Vec<u8>> {
    if fps == 0 {
        return Err(RadarError::invalid_parameter("fps", "must be at least 1"));
    }
    if frames.is_empty() {
        return Err(RadarError::EncodeError("no frames to animate".to_string()));
    }

    let delay = Delay::from_numer_denom_ms(1000, fps);
    let mut decoded = Vec::with_capacity(frames.len());
    for (i, bytes) in frames.iter().enumerate() {
        let img = image::load_from_memory(bytes.as_ref())
            .map_err(|e| RadarError::EncodeError(format!("frame {} is not an image: {}", i, e)))?
            .to_rgba8();
        decoded.push(Frame::from_parts(img, 0, 0, delay));
    }

    let mut out = Cursor::new(Vec::new());
    {
        let mut encoder = GifEncoder::new(&mut out);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| RadarError::EncodeError(e.to_string()))?;
        encoder
            .encode_frames(decoded)
            .map_err(|e| RadarError::EncodeError(format!("GIF encoding failed: {}", e)))?;
    }
    Ok(out.into_inner())
}
