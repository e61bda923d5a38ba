//! Timestamp label rendering.
//!
//! The label is dark text on an opaque white patch, drawn small and then
//! upscaled 2x with nearest-neighbour sampling so it stays crisp.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, TimeZone};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use imageproc::drawing::draw_text_mut;
use radar_common::{RadarError, RadarResult};
use rusttype::{point, Font, Scale};
use tracing::{debug, warn};

/// Embedded DejaVu Sans Mono font
const FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// Glyph height in pixels before upscaling
pub const LABEL_FONT_SIZE: f32 = 20.0;

/// Upscale factor applied to the rendered patch
pub const LABEL_UPSCALE: u32 = 2;

const LABEL_PADDING: u32 = 2;
const TEXT_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const PATCH_COLOR: Rgb<u8> = Rgb([255, 255, 255]);

/// A loaded TrueType font for labels.
#[derive(Clone)]
pub struct LabelFont {
    font: Arc<Font<'static>>,
    /// File the font was read from; `None` for the embedded font
    source: Option<PathBuf>,
}

impl std::fmt::Debug for LabelFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelFont").field("source", &self.source).finish()
    }
}

impl LabelFont {
    /// The font compiled into the crate.
    pub fn bundled() -> RadarResult<Self> {
        let font = Font::try_from_bytes(FONT_DATA)
            .ok_or_else(|| RadarError::RenderError("embedded label font is unreadable".to_string()))?;
        Ok(Self {
            font: Arc::new(font),
            source: None,
        })
    }

    /// Load a font file.
    pub fn from_file(path: impl AsRef<Path>) -> RadarResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let font = Font::try_from_vec(data).ok_or_else(|| {
            RadarError::RenderError(format!("{} is not a usable TrueType font", path.display()))
        })?;
        Ok(Self {
            font: Arc::new(font),
            source: Some(path.to_path_buf()),
        })
    }

    /// Load the configured font, falling back to the embedded one.
    pub fn discover(configured: Option<&Path>) -> Option<Self> {
        if let Some(path) = configured {
            match Self::from_file(path) {
                Ok(font) => {
                    debug!(font = %path.display(), "Loaded label font");
                    return Some(font);
                }
                Err(e) => warn!(font = %path.display(), error = %e, "Configured font unusable, using embedded font"),
            }
        }

        match Self::bundled() {
            Ok(font) => Some(font),
            Err(e) => {
                warn!(error = %e, "No label font; timestamp labels will be omitted");
                None
            }
        }
    }

    /// File the font came from, or `None` for the embedded font.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Width in pixels of `text` at `scale`.
    fn text_width(&self, text: &str, scale: Scale) -> u32 {
        self.font
            .layout(text, scale, point(0.0, 0.0))
            .filter_map(|glyph| glyph.pixel_bounding_box().map(|bb| bb.max.x))
            .max()
            .unwrap_or(0)
            .max(0) as u32
    }
}

/// Label text: `"{labels joined by ", "} @ {HH:MM}"` in the given zone.
pub fn format_label<Tz>(labels: &[&str], time: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{} @ {}", labels.join(", "), time.format("%H:%M"))
}

/// Render `text` onto an opaque white patch, upscaled.
///
/// Text is drawn on an RGB canvas so glyph blending never touches alpha.
pub fn render_label(font: &LabelFont, text: &str) -> RgbaImage {
    let scale = Scale::uniform(LABEL_FONT_SIZE);
    let width = font.text_width(text, scale) + 2 * LABEL_PADDING;
    let height = LABEL_FONT_SIZE.ceil() as u32 + 2 * LABEL_PADDING;

    let mut patch = RgbImage::from_pixel(width, height, PATCH_COLOR);
    draw_text_mut(
        &mut patch,
        TEXT_COLOR,
        LABEL_PADDING as i32,
        LABEL_PADDING as i32,
        scale,
        &font.font,
        text,
    );
    let patch = DynamicImage::ImageRgb8(patch).to_rgba8();

    imageops::resize(
        &patch,
        width * LABEL_UPSCALE,
        height * LABEL_UPSCALE,
        FilterType::Nearest,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn test_format_label_single_layer() {
        let time = Utc.with_ymd_and_hms(2025, 2, 13, 16, 54, 0).unwrap();
        assert_eq!(format_label(&["Rain"], &time), "Rain @ 16:54");
    }

    #[test]
    fn test_format_label_joins_layers_and_converts_zone() {
        let time = Utc.with_ymd_and_hms(2025, 2, 13, 16, 54, 0).unwrap();
        let winnipeg = FixedOffset::west_opt(6 * 3600).unwrap();
        assert_eq!(
            format_label(&["Pluie", "Neige"], &time.with_timezone(&winnipeg)),
            "Pluie, Neige @ 10:54"
        );
    }

    #[test]
    fn test_bundled_font_loads() {
        let font = LabelFont::bundled().unwrap();
        assert!(font.source().is_none());
        assert!(font.text_width("Rain @ 16:54", Scale::uniform(LABEL_FONT_SIZE)) > 0);
    }

    #[test]
    fn test_discover_falls_back_to_bundled() {
        let font = LabelFont::discover(Some(Path::new("/nonexistent/font.ttf"))).unwrap();
        assert!(font.source().is_none());
        assert!(LabelFont::discover(None).is_some());
    }

    #[test]
    fn test_missing_font_file() {
        assert!(LabelFont::from_file("/nonexistent/font.ttf").is_err());
    }

    #[test]
    fn test_non_font_file_is_rejected() {
        let dir = test_utils::temp_dir();
        let path = dir.path().join("bogus.ttf");
        std::fs::write(&path, b"not a font").unwrap();
        assert!(matches!(
            LabelFont::from_file(&path),
            Err(RadarError::RenderError(_))
        ));
    }
}
