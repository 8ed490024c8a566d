//! # geoanim
//!
//! Turn geospatial vector data into drawable primitives for animated maps.
//!
//! This library takes a feature collection (polygons, lines, points with
//! attributes), projects it into a planar drawing space, colors it from an
//! attribute column, lines it up with an optional raster basemap and hands
//! back an ordered scene for a host renderer to play.
//!
//! ## Key Features
//!
//! - **Projections**: mercator (clamped at ±85.0511°), equirectangular and a simplified robinson
//! - **Consistent framing**: one reference frame per scene, or per-geometry normalization
//! - **Choropleth and categorical coloring**: min/max ramps and top-K-plus-Other buckets
//! - **Basemap alignment**: fast path, cropped reprojection or no background
//!
//! ## Architecture
//!
//! - **Data Layer**: loads GeoJSON into a [`FeatureCollection`]
//! - **Pipeline**: [`GeoMap::build`] projects, classifies and converts
//! - **Output**: primitives, a legend and playback directives serialized for the host

pub mod basemap;
pub mod colormaps;
pub mod config;
pub mod convert;
pub mod data_loader;
pub mod error;
pub mod geo;
pub mod logging;
pub mod primitive;
pub mod scene;
pub mod timeline;

pub use config::{Config, MapConfig, OutputConfig};
pub use error::{GeoAnimError, Result};
pub use geo::{Crs, Feature, FeatureCollection, Projection};
pub use logging::{
    generate_operation_id, init_tracing, log_dataset_stats, log_error, log_timed_operation,
    StageTimer,
};
pub use primitive::{Primitive, RenderedFeature};
pub use scene::GeoMap;
pub use timeline::{Animation, Storyboard};
