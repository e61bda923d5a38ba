//! Radar layer catalogue and display languages.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RadarError;

/// A renderable radar data layer published by GeoMet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Rain,
    Snow,
    PrecipType,
}

impl Layer {
    pub const ALL: [Layer; 3] = [Layer::Rain, Layer::Snow, Layer::PrecipType];

    /// Short key used in configuration and cache keys.
    pub fn key(&self) -> &'static str {
        match self {
            Layer::Rain => "rain",
            Layer::Snow => "snow",
            Layer::PrecipType => "precip_type",
        }
    }

    /// Layer name on the WMS service.
    pub fn wms_name(&self) -> &'static str {
        match self {
            Layer::Rain => "RADAR_1KM_RRAI",
            Layer::Snow => "RADAR_1KM_RSNO",
            Layer::PrecipType => "Radar_1km_SfcPrecipType",
        }
    }

    /// Legend style preferred when the capabilities document lists it.
    pub fn default_legend_style(&self) -> Option<&'static str> {
        match self {
            Layer::Rain => Some("RADARURPPRECIPR"),
            Layer::Snow => Some("RADARURPPRECIPS14"),
            Layer::PrecipType => None,
        }
    }

    /// Label drawn in the frame timestamp.
    pub fn label(&self, language: Language) -> &'static str {
        match (self, language) {
            (Layer::Rain, Language::English) => "Rain",
            (Layer::Rain, Language::French) => "Pluie",
            (Layer::Snow, Language::English) => "Snow",
            (Layer::Snow, Language::French) => "Neige",
            (Layer::PrecipType, Language::English) => "Precipitation",
            (Layer::PrecipType, Language::French) => "Précipitation",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Layer {
    type Err = RadarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Layer::ALL
            .into_iter()
            .find(|layer| layer.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| RadarError::UnknownLayer(s.to_string()))
    }
}

/// Display language for labels, legends and attribution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    French,
}

impl Language {
    /// Two-letter code used for the `lang` WMS parameter.
    pub fn code(&self) -> &'static str {
        match self {
            Language::English => "en",
            Language::French => "fr",
        }
    }

    pub fn attribution(&self) -> &'static str {
        match self {
            Language::English => "Data provided by Environment Canada",
            Language::French => "Données fournies par Environnement Canada",
        }
    }
}

impl FromStr for Language {
    type Err = RadarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "english" | "en" => Ok(Language::English),
            "french" | "fr" => Ok(Language::French),
            other => Err(RadarError::invalid_parameter(
                "language",
                format!("expected 'english' or 'french', got '{}'", other),
            )),
        }
    }
}
