//! GeoJSON data loading functionality.
//!
//! This module reads GeoJSON documents (feature collections, single features
//! or bare geometries) into a [`FeatureCollection`]. The legacy top-level
//! `crs` member is honoured; without it data is taken to be EPSG:4326.

use geojson::{GeoJson, JsonObject, JsonValue};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{GeoAnimError, Result};
use crate::geo::crs::Crs;
use crate::geo::feature::{AttributeValue, Feature, FeatureCollection};
use crate::logging::log_dataset_stats;

/// File extensions read as GeoJSON
pub const SUPPORTED_EXTENSIONS: [&str; 2] = ["geojson", "json"];

/// Load a vector data file into memory
pub fn load_features(path: &Path) -> Result<FeatureCollection> {
    // Check if the file exists
    if !path.exists() {
        return Err(GeoAnimError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(GeoAnimError::UnsupportedFormat {
            path: path.to_path_buf(),
        });
    }

    let text = std::fs::read_to_string(path)?;
    info!("Opened GeoJSON file: {}", path.display());

    let collection = parse_geojson(&text)?;

    log_dataset_stats(
        &path.display().to_string(),
        collection.len(),
        &collection.column_names(),
        &collection.crs,
        collection.total_bounds().as_ref(),
    );

    Ok(collection)
}

/// Parse a GeoJSON document
pub fn parse_geojson(text: &str) -> Result<FeatureCollection> {
    let geojson: GeoJson = text.parse()?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => {
            let crs = parse_legacy_crs(fc.foreign_members.as_ref());
            let features = fc.features.into_iter().map(convert_feature).collect();
            FeatureCollection::new(features, crs)
        }
        GeoJson::Feature(f) => {
            let crs = parse_legacy_crs(f.foreign_members.as_ref());
            FeatureCollection::new(vec![convert_feature(f)], crs)
        }
        GeoJson::Geometry(g) => {
            let feature = Feature {
                geometry: convert_geometry(g),
                properties: HashMap::new(),
            };
            FeatureCollection::new(vec![feature], Crs::WGS84)
        }
    };

    debug!(
        features = collection.len(),
        crs = %collection.crs,
        "Parsed GeoJSON"
    );
    Ok(collection)
}

fn convert_feature(feature: geojson::Feature) -> Feature {
    let properties = feature
        .properties
        .map(|props| {
            props
                .into_iter()
                .map(|(name, value)| (name, convert_value(value)))
                .collect()
        })
        .unwrap_or_default();

    Feature {
        geometry: feature.geometry.and_then(convert_geometry),
        properties,
    }
}

fn convert_geometry(geometry: geojson::Geometry) -> Option<geo_types::Geometry<f64>> {
    match geo_types::Geometry::<f64>::try_from(geometry) {
        Ok(g) => Some(g),
        Err(e) => {
            warn!(error = %e, "Skipping unconvertible geometry");
            None
        }
    }
}

/// Map a JSON property onto an attribute value. Arrays and objects are kept
/// as their JSON text.
fn convert_value(value: JsonValue) -> AttributeValue {
    match value {
        JsonValue::Null => AttributeValue::Null,
        JsonValue::Bool(b) => AttributeValue::Bool(b),
        JsonValue::Number(n) => n
            .as_f64()
            .map(AttributeValue::Number)
            .unwrap_or(AttributeValue::Null),
        JsonValue::String(s) => AttributeValue::Text(s),
        other => AttributeValue::Text(other.to_string()),
    }
}

/// Read `{"crs": {"type": "name", "properties": {"name": ...}}}`.
/// Anything missing or unparseable means EPSG:4326.
fn parse_legacy_crs(foreign: Option<&JsonObject>) -> Crs {
    let name = foreign
        .and_then(|members| members.get("crs"))
        .and_then(|crs| crs.get("properties"))
        .and_then(|props| props.get("name"))
        .and_then(|name| name.as_str());

    match name {
        Some(name) => match Crs::parse_crs(name) {
            Ok(crs) => crs,
            Err(e) => {
                warn!(crs = name, error = %e, "Unrecognized CRS, assuming EPSG:4326");
                Crs::WGS84
            }
        },
        None => Crs::WGS84,
    }
}
