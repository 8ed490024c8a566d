//! Configuration management for geoanim.
//!
//! This module handles the layered configuration system with the following precedence:
//! 1. Command-line arguments (highest priority)
//! 2. Environment variables
//! 3. JSON config file
//! 4. Default values (lowest priority)

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::basemap::BasemapRequest;
use crate::colormaps::{Color, LegendLayout, SchemeSource, DEFAULT_TOP_K};
use crate::error::{GeoAnimError, Result};
use crate::geo::bounds::Bounds;
use crate::geo::crs::Crs;
use crate::geo::frame::DrawingExtent;
use crate::geo::projection::Projection;

/// Command-line arguments for geoanim
#[derive(Parser, Debug, Default)]
#[command(name = "geoanim")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the GeoJSON file to map
    pub data_file: PathBuf,

    /// Map projection (mercator, equirectangular, plate_carree, robinson)
    #[arg(short, long, env = "GEOANIM_PROJECTION")]
    pub projection: Option<String>,

    /// Attribute column used for choropleth or categorical coloring
    #[arg(long, env = "GEOANIM_COLOR_BY")]
    pub color_by: Option<String>,

    /// Color scheme name, or comma-separated hex colors
    #[arg(long, env = "GEOANIM_COLOR_SCHEME")]
    pub color_scheme: Option<String>,

    /// Attribute column that orders the reveal animation
    #[arg(long, env = "GEOANIM_ORDER")]
    pub order: Option<String>,

    /// Reveal in descending order instead of ascending
    #[arg(long)]
    pub reverse_order: bool,

    /// Basemap: light, dark, neutral, a provider id, or tiles:<provider>
    #[arg(short, long, env = "GEOANIM_BASEMAP")]
    pub basemap: Option<String>,

    /// Directory holding the bundled basemap images
    #[arg(long, env = "GEOANIM_ASSETS_DIR")]
    pub assets_dir: Option<PathBuf>,

    /// Fill opacity in [0, 1]
    #[arg(long)]
    pub fill_opacity: Option<f64>,

    /// Stroke width for outlines and lines
    #[arg(long)]
    pub stroke_width: Option<f64>,

    /// Normalize each geometry by its own bounds instead of a shared frame
    #[arg(long)]
    pub no_axes: bool,

    /// Directory for the scene description and background raster
    #[arg(short, long, env = "GEOANIM_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Path to JSON configuration file
    #[arg(short, long, env = "GEOANIM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "GEOANIM_LOG_LEVEL")]
    pub log_level: Option<String>,
}

/// How the map is projected, styled and backed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub projection: String,
    /// Shared reference frame (true) or per-geometry normalization (false)
    pub use_axes: bool,
    pub color_by: Option<String>,
    pub color_scheme: SchemeSource,
    /// Color for features without a classified value
    pub fill_color: Color,
    pub fill_opacity: f64,
    /// Polygon outline color; unset outlines each feature in its own color
    pub stroke_color: Option<Color>,
    pub stroke_width: f64,
    pub marker_radius: f64,
    pub order: Option<String>,
    pub reverse_order: bool,
    pub top_k: usize,
    /// Frame padding as a fraction of the data span (ignored with a basemap)
    pub padding: f64,
    pub extent: DrawingExtent,
    pub basemap: Option<String>,
    pub background_image: Option<PathBuf>,
    pub background_bounds: Option<Bounds>,
    pub background_crs: Crs,
    pub background_opacity: f64,
    pub assets_dir: PathBuf,
    pub legend: LegendLayout,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            projection: Projection::default().name().to_string(),
            use_axes: true,
            color_by: None,
            color_scheme: SchemeSource::default(),
            fill_color: Color::rgb(0x29, 0xAB, 0xCA),
            fill_opacity: 0.7,
            stroke_color: None,
            stroke_width: 1.0,
            marker_radius: 0.08,
            order: None,
            reverse_order: false,
            top_k: DEFAULT_TOP_K,
            padding: 0.1,
            extent: DrawingExtent::default(),
            basemap: None,
            background_image: None,
            background_bounds: None,
            background_crs: Crs::WGS84,
            background_opacity: 0.7,
            assets_dir: PathBuf::from("assets"),
            legend: LegendLayout::default(),
        }
    }
}

impl MapConfig {
    pub fn projection(&self) -> Result<Projection> {
        Projection::parse_projection(&self.projection)
    }

    pub fn basemap_request(&self) -> Result<Option<BasemapRequest>> {
        BasemapRequest::from_options(
            self.basemap.as_deref(),
            self.background_image.as_deref(),
            self.background_bounds,
            self.background_crs,
        )
    }

    /// Validate the map options
    pub fn validate(&self) -> Result<()> {
        self.projection()?;
        self.color_scheme.resolve()?;
        self.basemap_request()?;

        for (name, value) in [
            ("fill_opacity", self.fill_opacity),
            ("background_opacity", self.background_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(invalid(name, format!("{} must be in [0, 1]", value)));
            }
        }

        for (name, value) in [
            ("stroke_width", self.stroke_width),
            ("marker_radius", self.marker_radius),
            ("padding", self.padding),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(name, format!("{} must be non-negative", value)));
            }
        }

        if self.extent.width <= 0.0 || self.extent.height <= 0.0 {
            return Err(invalid(
                "extent",
                format!(
                    "{} x {} must be positive",
                    self.extent.width, self.extent.height
                ),
            ));
        }

        if self.top_k == 0 {
            return Err(invalid("top_k", "must be at least 1".to_string()));
        }

        Ok(())
    }
}

/// Output and playback configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory the scene description is written to
    pub dir: PathBuf,
    /// Duration of the creation animation, in seconds
    pub run_time: f64,
    /// Delay between successive features in an ordered reveal, as a
    /// fraction of each feature's duration
    pub lag_ratio: f64,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("geoanim_output"),
            run_time: 3.0,
            lag_ratio: 0.05,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Map configuration
    #[serde(default)]
    pub map: MapConfig,

    /// Output configuration
    #[serde(default)]
    pub output: OutputConfig,

    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Config {
    /// Load configuration from all sources with proper precedence
    pub fn load() -> Result<(Self, PathBuf)> {
        Self::from_args(Args::parse())
    }

    /// Build configuration from parsed arguments. Returns the config and the
    /// data file path.
    pub fn from_args(args: Args) -> Result<(Self, PathBuf)> {
        // Start with defaults
        let mut config = Config::default();

        // Load from JSON file if provided
        if let Some(config_path) = &args.config {
            let json_config = Self::load_from_file(config_path)?;
            config.merge(json_config);
        }

        // Override with command-line arguments
        let map = &mut config.map;
        if let Some(projection) = args.projection {
            map.projection = projection;
        }
        if args.color_by.is_some() {
            map.color_by = args.color_by;
        }
        if let Some(scheme) = args.color_scheme {
            map.color_scheme = SchemeSource::parse_arg(&scheme);
        }
        if args.order.is_some() {
            map.order = args.order;
        }
        if args.reverse_order {
            map.reverse_order = true;
        }
        if args.basemap.is_some() {
            map.basemap = args.basemap;
        }
        if let Some(dir) = args.assets_dir {
            map.assets_dir = dir;
        }
        if let Some(opacity) = args.fill_opacity {
            map.fill_opacity = opacity;
        }
        if let Some(width) = args.stroke_width {
            map.stroke_width = width;
        }
        if args.no_axes {
            map.use_axes = false;
        }
        if let Some(dir) = args.output {
            config.output.dir = dir;
        }
        if let Some(level) = args.log_level {
            config.log_level = level;
        }

        Ok((config, args.data_file))
    }

    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(GeoAnimError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Merge another config into this one (other takes precedence)
    fn merge(&mut self, other: Config) {
        self.map = other.map;
        self.output = other.output;
        self.log_level = other.log_level;
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.map.validate()?;

        if !(0.0..=1.0).contains(&self.output.lag_ratio) {
            return Err(invalid(
                "lag_ratio",
                format!("{} must be in [0, 1]", self.output.lag_ratio),
            ));
        }
        if self.output.run_time <= 0.0 || !self.output.run_time.is_finite() {
            return Err(invalid(
                "run_time",
                format!("{} must be positive", self.output.run_time),
            ));
        }

        // Validate log level
        match self.log_level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(GeoAnimError::Config {
                    message: format!(
                        "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                        self.log_level
                    ),
                });
            }
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            map: MapConfig::default(),
            output: OutputConfig::default(),
            log_level: default_log_level(),
        }
    }
}

fn invalid(param: &str, message: String) -> GeoAnimError {
    GeoAnimError::InvalidParameter {
        param: param.to_string(),
        message,
    }
}

// Default value functions for serde
fn default_log_level() -> String {
    "info".to_string()
}
