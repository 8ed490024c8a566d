use std::error::Error;
use std::path::PathBuf;

use geoanim::data_loader::load_features;
use geoanim::geo::ColumnKind;

fn main() -> Result<(), Box<dyn Error>> {
    // Path to the GeoJSON file
    let file_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .ok_or("usage: inspect_geojson <file.geojson>")?;

    println!("Inspecting GeoJSON file: {}", file_path.display());

    let collection = load_features(&file_path)?;

    // Print file information
    println!("\n=== FILE INFORMATION ===");
    println!("\nFeatures: {}", collection.len());
    println!("CRS: {}", collection.crs);
    match collection.total_bounds() {
        Some(b) => println!(
            "Bounds: ({:.4}, {:.4}) - ({:.4}, {:.4})",
            b.min_x, b.min_y, b.max_x, b.max_y
        ),
        None => println!("Bounds: none"),
    }

    // Print geometry kinds
    println!("\nGeometry kinds:");
    let mut kinds: Vec<(&str, usize)> = Vec::new();
    for feature in &collection.features {
        let kind = match &feature.geometry {
            Some(geo_types::Geometry::Point(_)) => "Point",
            Some(geo_types::Geometry::MultiPoint(_)) => "MultiPoint",
            Some(geo_types::Geometry::LineString(_)) => "LineString",
            Some(geo_types::Geometry::MultiLineString(_)) => "MultiLineString",
            Some(geo_types::Geometry::Polygon(_)) => "Polygon",
            Some(geo_types::Geometry::MultiPolygon(_)) => "MultiPolygon",
            Some(_) => "Other",
            None => "null",
        };
        match kinds.iter_mut().find(|(k, _)| *k == kind) {
            Some((_, count)) => *count += 1,
            None => kinds.push((kind, 1)),
        }
    }
    for (kind, count) in kinds {
        println!("  {} = {}", kind, count);
    }

    // Print columns
    println!("\nColumns:");
    for name in collection.column_names() {
        let kind = match collection.column_kind(&name) {
            Some(ColumnKind::Numeric) => "numeric",
            Some(ColumnKind::Categorical) => "categorical",
            None => "unknown",
        };
        let missing = collection
            .features
            .iter()
            .filter(|f| f.property(&name).map_or(true, |v| v.is_missing()))
            .count();
        print!("  {} ({})", name, kind);
        if missing > 0 {
            print!(" [{} missing]", missing);
        }
        println!();
    }

    // Print sample values
    println!("\nSample Values:");
    for (i, feature) in collection.features.iter().take(3).enumerate() {
        let mut props: Vec<_> = feature.properties.iter().collect();
        props.sort_by(|a, b| a.0.cmp(b.0));
        let rendered: Vec<String> = props.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        println!("  #{}: {}", i, rendered.join(", "));
    }

    Ok(())
}
