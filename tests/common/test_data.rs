//! Test data generation utilities.
//!
//! This module provides functions that write GeoJSON datasets and basemap
//! images with known layouts for the pipeline tests.

use image::RgbaImage;
use serde_json::{json, Value};
use std::path::Path;

type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

fn square_ring(x0: f64, y0: f64, size: f64) -> Value {
    json!([[
        [x0, y0],
        [x0 + size, y0],
        [x0 + size, y0 + size],
        [x0, y0 + size],
        [x0, y0]
    ]])
}

fn write_collection(path: &Path, features: Vec<Value>, crs: Option<&str>) -> Result<()> {
    let mut doc = json!({
        "type": "FeatureCollection",
        "features": features,
    });
    if let Some(name) = crs {
        doc["crs"] = json!({"type": "name", "properties": {"name": name}});
    }
    std::fs::write(path, serde_json::to_string_pretty(&doc)?)?;
    Ok(())
}

/// Three unit squares side by side along the equator with a numeric
/// `value` column of 100, 200 and 150.
pub fn create_three_squares(path: &Path) -> Result<()> {
    let features = [100.0, 200.0, 150.0]
        .iter()
        .enumerate()
        .map(|(i, v)| {
            json!({
                "type": "Feature",
                "properties": {"name": format!("sq{}", i), "value": v},
                "geometry": {"type": "Polygon", "coordinates": square_ring(i as f64 * 2.0, 0.0, 1.0)}
            })
        })
        .collect();
    write_collection(path, features, None)
}

/// A grid of small countries with a categorical `region` column: seven
/// distinct regions with decreasing frequency, plus one feature with no
/// region.
pub fn create_regions(path: &Path) -> Result<()> {
    let regions = [
        "Europe", "Europe", "Europe", "Europe", "Asia", "Asia", "Asia", "Africa", "Africa",
        "Oceania", "Americas", "Arctic", "Antarctica",
    ];
    let mut features: Vec<Value> = regions
        .iter()
        .enumerate()
        .map(|(i, region)| {
            let x = (i % 5) as f64 * 10.0 - 25.0;
            let y = (i / 5) as f64 * 10.0 - 15.0;
            json!({
                "type": "Feature",
                "properties": {"region": region, "gdp": (i as f64 + 1.0) * 10.0},
                "geometry": {"type": "Polygon", "coordinates": square_ring(x, y, 8.0)}
            })
        })
        .collect();
    features.push(json!({
        "type": "Feature",
        "properties": {"region": null, "gdp": null},
        "geometry": {"type": "Polygon", "coordinates": square_ring(30.0, 20.0, 5.0)}
    }));
    write_collection(path, features, None)
}

/// A mixed dataset: a route, a multi-line, two cities, a polygon with a
/// hole, one degenerate polygon and one feature with null geometry.
pub fn create_mixed_geometries(path: &Path) -> Result<()> {
    let features = vec![
        json!({
            "type": "Feature",
            "properties": {"kind": "route", "rank": 3},
            "geometry": {"type": "LineString", "coordinates": [[-10.0, 40.0], [0.0, 45.0], [10.0, 50.0]]}
        }),
        json!({
            "type": "Feature",
            "properties": {"kind": "rivers", "rank": 1},
            "geometry": {"type": "MultiLineString", "coordinates": [
                [[-5.0, 42.0], [-4.0, 43.0]],
                [[5.0, 47.0], [6.0, 48.0]]
            ]}
        }),
        json!({
            "type": "Feature",
            "properties": {"kind": "city", "rank": 2},
            "geometry": {"type": "Point", "coordinates": [2.35, 48.85]}
        }),
        json!({
            "type": "Feature",
            "properties": {"kind": "city", "rank": 5},
            "geometry": {"type": "MultiPoint", "coordinates": [[-3.7, 40.4], [12.5, 41.9]]}
        }),
        json!({
            "type": "Feature",
            "properties": {"kind": "lake", "rank": 4},
            "geometry": {"type": "Polygon", "coordinates": [
                [[0.0, 44.0], [4.0, 44.0], [4.0, 47.0], [0.0, 47.0], [0.0, 44.0]],
                [[1.0, 45.0], [2.0, 45.0], [2.0, 46.0], [1.0, 45.0]]
            ]}
        }),
        json!({
            "type": "Feature",
            "properties": {"kind": "sliver", "rank": 6},
            "geometry": {"type": "Polygon", "coordinates": [[[1.0, 1.0], [2.0, 2.0], [1.0, 1.0]]]}
        }),
        json!({
            "type": "Feature",
            "properties": {"kind": "unknown", "rank": null},
            "geometry": null
        }),
    ];
    write_collection(path, features, None)
}

/// The three squares again, stored in Web Mercator meters with a legacy
/// `crs` member.
pub fn create_web_mercator_squares(path: &Path) -> Result<()> {
    // One degree of longitude at the equator, in meters
    const DEG: f64 = 111_319.490_793_273_57;
    let features = [1.0, 2.0, 3.0]
        .iter()
        .enumerate()
        .map(|(i, v)| {
            json!({
                "type": "Feature",
                "properties": {"value": v},
                "geometry": {"type": "Polygon", "coordinates": square_ring(i as f64 * 2.0 * DEG, 0.0, DEG)}
            })
        })
        .collect();
    write_collection(path, features, Some("urn:ogc:def:crs:EPSG::3857"))
}

/// Write a basemap image to disk
pub fn create_basemap_png(path: &Path, image: &RgbaImage) -> Result<()> {
    image.save(path)?;
    Ok(())
}
