//! WMS GetCapabilities parsing for layer metadata.
//!
//! Only the pieces the radar engine needs are extracted: for one named
//! layer, its TIME dimension declaration and the names of its styles.
//! Layers nest arbitrarily deep in a capabilities document, so the parser
//! keeps a stack of open `<Layer>` elements and reports the one whose
//! direct `<Name>` child matches.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use radar_common::{RadarError, RadarResult, TimeDimension};
use serde::Serialize;
use tracing::debug;

/// What a capabilities document says about one layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayerCapabilities {
    pub name: String,
    /// Raw dimension text, e.g. `2025-02-13T13:54:00Z/2025-02-13T16:54:00Z/PT6M`
    pub time_dimension: Option<String>,
    pub styles: Vec<String>,
}

impl LayerCapabilities {
    /// Parsed time range, if the declaration is present and well formed.
    pub fn time_range(&self) -> Option<TimeDimension> {
        self.time_dimension
            .as_deref()
            .and_then(TimeDimension::from_wms_dimension)
    }

    /// Choose the style to request a legend with.
    ///
    /// Order of preference: a style marked for `lang_code` (`NAME_fr`,
    /// `NAME-fr`), the layer's known default, then the first style listed.
    pub fn legend_style(&self, default_style: Option<&str>, lang_code: &str) -> Option<&str> {
        let is_localized = |style: &str| {
            let lower = style.to_ascii_lowercase();
            lower.ends_with(&format!("_{}", lang_code)) || lower.ends_with(&format!("-{}", lang_code))
        };
        let stem_matches = |style: &str, stem: &str| {
            style.len() == stem.len() + 1 + lang_code.len()
                && style
                    .get(..stem.len())
                    .map_or(false, |head| head.eq_ignore_ascii_case(stem))
        };

        let localized: Vec<&str> = self
            .styles
            .iter()
            .map(String::as_str)
            .filter(|&s| is_localized(s))
            .collect();

        if let Some(default) = default_style {
            if let Some(style) = localized.iter().copied().find(|&s| stem_matches(s, default)) {
                return Some(style);
            }
        }
        if let Some(style) = localized.first().copied() {
            return Some(style);
        }
        if let Some(default) = default_style {
            if let Some(style) = self
                .styles
                .iter()
                .map(String::as_str)
                .find(|s| s.eq_ignore_ascii_case(default))
            {
                return Some(style);
            }
        }
        self.styles.first().map(String::as_str)
    }
}

/// Per-layer accumulator while the layer element is open.
#[derive(Default)]
struct OpenLayer {
    name: Option<String>,
    time_dimension: Option<String>,
    styles: Vec<String>,
}

fn is_time_dimension(e: &BytesStart<'_>) -> RadarResult<bool> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| RadarError::CapabilitiesError(err.to_string()))?;
        if attr.key.local_name().as_ref() == b"name" {
            let value = attr
                .unescape_value()
                .map_err(|err| RadarError::CapabilitiesError(err.to_string()))?;
            return Ok(value.eq_ignore_ascii_case("time"));
        }
    }
    // An unnamed dimension is taken as the time dimension
    Ok(true)
}

/// Find `layer_name` in a capabilities document.
///
/// Returns `Ok(None)` when the document does not mention the layer, and an
/// error only for XML that cannot be read at all.
pub fn find_layer(xml: &[u8], layer_name: &str) -> RadarResult<Option<LayerCapabilities>> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);

    let mut buf = Vec::new();
    let mut elements: Vec<Vec<u8>> = Vec::new();
    let mut layers: Vec<OpenLayer> = Vec::new();
    let mut in_time_dimension = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let local = e.local_name().as_ref().to_vec();
                let parent_is_layer = elements.last().map(|p| p.as_slice()) == Some(&b"Layer"[..]);
                match local.as_slice() {
                    b"Layer" => layers.push(OpenLayer::default()),
                    b"Dimension" if parent_is_layer => {
                        in_time_dimension = is_time_dimension(&e)?;
                    }
                    _ => {}
                }
                elements.push(local);
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|err| RadarError::CapabilitiesError(err.to_string()))?;
                let depth = elements.len();
                let current = elements.last().map(|e| e.as_slice());
                let parent = depth.checked_sub(2).map(|i| elements[i].as_slice());
                let grandparent = depth.checked_sub(3).map(|i| elements[i].as_slice());

                if let Some(open) = layers.last_mut() {
                    match (current, parent, grandparent) {
                        (Some(b"Name"), Some(b"Layer"), _) => {
                            open.name = Some(text.trim().to_string());
                        }
                        (Some(b"Name"), Some(b"Style"), Some(b"Layer")) => {
                            open.styles.push(text.trim().to_string());
                        }
                        (Some(b"Dimension"), Some(b"Layer"), _) if in_time_dimension => {
                            open.time_dimension
                                .get_or_insert_with(String::new)
                                .push_str(text.trim());
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::End(e)) => {
                match e.local_name().as_ref() {
                    b"Layer" => {
                        if let Some(open) = layers.pop() {
                            if open.name.as_deref() == Some(layer_name) {
                                return Ok(Some(LayerCapabilities {
                                    name: layer_name.to_string(),
                                    time_dimension: open.time_dimension,
                                    styles: open.styles,
                                }));
                            }
                        }
                    }
                    b"Dimension" => in_time_dimension = false,
                    _ => {}
                }
                elements.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(RadarError::CapabilitiesError(format!(
                    "XML parsing error at position {}: {:?}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
        buf.clear();
    }

    debug!(layer = layer_name, "Layer not present in capabilities document");
    Ok(None)
}

/// The time range `layer_name` currently offers, if any.
///
/// A missing layer, a missing dimension, and an unparsable dimension all
/// mean "no data available yet" and yield `Ok(None)`.
pub fn time_dimension(xml: &[u8], layer_name: &str) -> RadarResult<Option<TimeDimension>> {
    Ok(find_layer(xml, layer_name)?.and_then(|layer| layer.time_range()))
}
