//! Error types for geoanim.
//!
//! Configuration mistakes are fatal and surface immediately with the list of
//! valid options. Per-feature geometry problems and basemap failures are
//! recovered where they happen and never reach this type.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for geoanim operations.
#[derive(Error, Debug)]
pub enum GeoAnimError {
    /// Projection name not in the function table
    #[error("Unknown projection '{name}'. Available: {}", available.join(", "))]
    UnknownProjection {
        name: String,
        available: Vec<&'static str>,
    },

    /// Color scheme name not in the ramp table
    #[error("Unknown color scheme '{name}'. Available: {}", available.join(", "))]
    UnknownColorScheme {
        name: String,
        available: Vec<&'static str>,
    },

    /// Input file does not exist
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Dataset contains no features
    #[error("No features in dataset")]
    EmptyDataset,

    /// Input file extension is not a supported vector format
    #[error("Unsupported data format: {}", path.display())]
    UnsupportedFormat { path: PathBuf },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Invalid parameter errors
    #[error("Invalid parameter: {param} - {message}")]
    InvalidParameter { param: String, message: String },

    /// Coordinate reference system errors
    #[error("CRS error: {message}")]
    Crs { message: String },

    /// Basemap resolution or fetch errors
    #[error("Basemap error: {message}")]
    Basemap { message: String },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// GeoJSON parse errors
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// Raster decode/encode errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Coordinate transformation errors
    #[error("Projection error: {0}")]
    Projection(#[from] proj4rs::errors::Error),
}

/// Convenience type alias for Results with GeoAnimError
pub type Result<T> = std::result::Result<T, GeoAnimError>;
