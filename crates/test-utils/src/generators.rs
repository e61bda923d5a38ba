//! Generators for synthetic images and service documents.
//!
//! These produce small, predictable inputs so compositing results can be
//! checked pixel by pixel.

use std::io::Cursor;

use image::{ImageFormat, Rgba, RgbaImage};

/// Encode an RGBA image as PNG bytes.
pub fn encode_png(img: &RgbaImage) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)
        .expect("PNG encoding of a generated image failed");
    out.into_inner()
}

/// A PNG filled with one color.
///
/// # Example
///
/// ```
/// use test_utils::solid_png;
///
/// let png = solid_png(4, 4, [255, 0, 0, 255]);
/// assert_eq!(&png[..4], &[137, 80, 78, 71]);
/// ```
pub fn solid_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    encode_png(&RgbaImage::from_pixel(width, height, Rgba(color)))
}

/// A PNG where the left half is `color` and the right half is fully transparent,
/// like a radar tile with precipitation only on one side.
pub fn half_covered_png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgba(color)
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    encode_png(&img)
}

/// Color uniquely identifying frame `index` of a loop.
///
/// The red channel encodes the index so decoded animations can be checked
/// for ordering.
pub fn frame_color(index: usize) -> [u8; 4] {
    [(index * 8).min(255) as u8, 100, 200, 255]
}

/// Decode any supported image bytes to RGBA.
pub fn decode_rgba(bytes: &[u8]) -> RgbaImage {
    image::load_from_memory(bytes)
        .expect("failed to decode image")
        .to_rgba8()
}

/// Builder for minimal WMS 1.3.0 capabilities documents.
#[derive(Debug, Default, Clone)]
pub struct CapabilitiesBuilder {
    layers: Vec<(String, Option<String>, Vec<String>)>,
}

impl CapabilitiesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer with an optional time dimension and any number of styles.
    pub fn layer(mut self, name: &str, dimension: Option<&str>, styles: &[&str]) -> Self {
        self.layers.push((
            name.to_string(),
            dimension.map(str::to_string),
            styles.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    pub fn build(&self) -> String {
        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<WMS_Capabilities xmlns="http://www.opengis.net/wms" xmlns:xlink="http://www.w3.org/1999/xlink" version="1.3.0">
  <Service><Name>WMS</Name><Title>Test GeoMet</Title></Service>
  <Capability>
    <Layer>
      <Title>Root</Title>
"#,
        );
        for (name, dimension, styles) in &self.layers {
            xml.push_str("      <Layer queryable=\"1\">\n");
            xml.push_str(&format!("        <Name>{}</Name>\n", name));
            xml.push_str(&format!("        <Title>{} title</Title>\n", name));
            if let Some(dimension) = dimension {
                xml.push_str(&format!(
                    "        <Dimension name=\"time\" units=\"ISO8601\" nearestValue=\"0\">{}</Dimension>\n",
                    dimension
                ));
            }
            for style in styles {
                xml.push_str(&format!(
                    "        <Style><Name>{}</Name><Title>{}</Title></Style>\n",
                    style, style
                ));
            }
            xml.push_str("      </Layer>\n");
        }
        xml.push_str("    </Layer>\n  </Capability>\n</WMS_Capabilities>\n");
        xml
    }
}

/// Capabilities listing the rain layer with `dimension` and its default style.
pub fn rain_capabilities(dimension: &str) -> String {
    CapabilitiesBuilder::new()
        .layer(
            crate::fixtures::layers::RAIN,
            Some(dimension),
            &[crate::fixtures::layers::RAIN_STYLE],
        )
        .build()
}
