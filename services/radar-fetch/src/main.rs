//! Radar fetch tool.
//!
//! Fetches the latest radar frame (PNG) or the full animated loop (GIF)
//! for a location and writes it to disk:
//! - Settings from a YAML file, `RADAR_*` environment variables, or flags
//! - Optional seasonal rain/snow selection
//! - Map metadata printed as JSON

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use radar_common::{Language, Layer};
use radar_map::{PrecipType, RadarConfig, RadarMap};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "radar-fetch")]
#[command(about = "Fetch GeoMet radar imagery for a location")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "RADAR_CONFIG")]
    config: Option<PathBuf>,

    /// Map center latitude
    #[arg(long, allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Map center longitude
    #[arg(long, allow_hyphen_values = true)]
    lon: Option<f64>,

    /// Distance from center to map edge (km)
    #[arg(long)]
    radius: Option<u32>,

    /// Image width (px)
    #[arg(long)]
    width: Option<u32>,

    /// Image height (px)
    #[arg(long)]
    height: Option<u32>,

    /// Radar layer opacity (0-100)
    #[arg(long)]
    opacity: Option<u8>,

    /// Comma-separated layers: rain, snow, precip_type
    #[arg(long, value_delimiter = ',')]
    layers: Vec<Layer>,

    /// Pick rain or snow: rain, snow or auto (by season). Overrides --layers
    #[arg(long)]
    precip_type: Option<PrecipType>,

    /// Label and legend language: english or french
    #[arg(long)]
    language: Option<Language>,

    /// Leave the legend off
    #[arg(long)]
    no_legend: bool,

    /// Leave the timestamp label off
    #[arg(long)]
    no_timestamp: bool,

    /// Fetch the animated loop instead of the latest frame
    #[arg(long = "loop")]
    animate: bool,

    /// Loop frame rate
    #[arg(long, default_value = "5")]
    fps: u32,

    /// Output file (default radar.png, or radar.gif with --loop)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print map metadata as JSON after fetching
    #[arg(long)]
    metadata: bool,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log as JSON
    #[arg(long)]
    log_json: bool,
}

impl Args {
    /// Resolve the map configuration: file or environment first, flags on top.
    fn radar_config(&self) -> Result<RadarConfig> {
        let mut config = match (&self.config, self.lat, self.lon) {
            (Some(path), _, _) => RadarConfig::from_yaml_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?,
            (None, Some(lat), Some(lon)) => RadarConfig::new(lat, lon).with_env_overrides()?,
            (None, None, None) => RadarConfig::from_env()
                .context("No location given: pass --lat/--lon, --config, or set RADAR_LATITUDE/RADAR_LONGITUDE")?,
            (None, _, _) => bail!("--lat and --lon must be given together"),
        };

        if let Some(lat) = self.lat {
            config.latitude = lat;
        }
        if let Some(lon) = self.lon {
            config.longitude = lon;
        }
        if let Some(radius) = self.radius {
            config.radius = radius;
        }
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(opacity) = self.opacity {
            config.opacity = opacity;
        }
        if !self.layers.is_empty() {
            config.layers = self.layers.clone();
        }
        if let Some(precip_type) = self.precip_type {
            config.layers = vec![precip_type.current_layer()];
        }
        if let Some(language) = self.language {
            config.language = language;
        }
        if self.no_legend {
            config.legend = false;
        }
        if self.no_timestamp {
            config.timestamp = false;
        }

        config.validate()?;
        Ok(config)
    }

    fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            PathBuf::from(if self.animate { "radar.gif" } else { "radar.png" })
        })
    }
}

fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    let builder = fmt().with_env_filter(filter).with_target(true).with_level(true);
    if args.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment from .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    init_tracing(&args);

    let config = args.radar_config()?;
    info!(
        lat = config.latitude,
        lon = config.longitude,
        radius = config.radius,
        layers = ?config.layers,
        "Fetching radar imagery"
    );

    let map = RadarMap::new(config).context("Failed to create radar map")?;
    let output = args.output_path();

    let image = if args.animate {
        map.get_loop(args.fps).await.context("Failed to build radar loop")?
    } else {
        match map.get_latest_frame().await.context("Failed to fetch latest frame")? {
            Some(frame) => frame,
            None => {
                warn!("The radar service has no imagery for this layer right now");
                bail!("no radar imagery available");
            }
        }
    };

    tokio::fs::write(&output, &image)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!(path = %output.display(), bytes = image.len(), "Wrote radar image");

    if args.metadata {
        let metadata = map.metadata().await;
        println!("{}", serde_json::to_string_pretty(&metadata)?);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_location() {
        let args = Args::parse_from([
            "radar-fetch",
            "--lat",
            "45.4",
            "--lon",
            "-75.7",
            "--radius",
            "100",
            "--layers",
            "rain,snow",
            "--language",
            "french",
            "--no-legend",
        ]);
        let config = args.radar_config().unwrap();
        assert_eq!(config.latitude, 45.4);
        assert_eq!(config.longitude, -75.7);
        assert_eq!(config.radius, 100);
        assert_eq!(config.layers, vec![Layer::Rain, Layer::Snow]);
        assert_eq!(config.language, Language::French);
        assert!(!config.legend);
        assert!(config.timestamp);
    }

    #[test]
    fn test_precip_type_overrides_layers() {
        let args = Args::parse_from([
            "radar-fetch", "--lat", "50", "--lon", "-100", "--layers", "precip_type", "--precip-type", "snow",
        ]);
        assert_eq!(args.radar_config().unwrap().layers, vec![Layer::Snow]);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let args = Args::parse_from(["radar-fetch", "--lat", "50", "--lon", "-100", "--opacity", "120"]);
        assert!(args.radar_config().is_err());

        let args = Args::parse_from(["radar-fetch", "--lat", "50"]);
        assert!(args.radar_config().is_err());
    }

    #[test]
    fn test_output_defaults_follow_mode() {
        let args = Args::parse_from(["radar-fetch", "--loop"]);
        assert_eq!(args.output_path(), PathBuf::from("radar.gif"));
        let args = Args::parse_from(["radar-fetch"]);
        assert_eq!(args.output_path(), PathBuf::from("radar.png"));
    }

    #[test]
    fn test_bad_layer_name_fails_parsing() {
        assert!(Args::try_parse_from(["radar-fetch", "--layers", "hail"]).is_err());
    }
}
