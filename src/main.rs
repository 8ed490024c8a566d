//! geoanim - project, style and stage geospatial data for animated maps
//!
//! This is the main entry point for the geoanim command-line tool. It loads
//! a dataset, builds the map scene and writes the scene description for the
//! host renderer.

use anyhow::Context;
use tracing::{error, info};

use geoanim::basemap::NoTileProvider;
use geoanim::data_loader::load_features;
use geoanim::{init_tracing, log_error, log_timed_operation, Config, GeoMap};

fn main() -> anyhow::Result<()> {
    // Load configuration
    let (config, data_path) = Config::load().context("Failed to load configuration")?;

    init_tracing(&config.log_level);

    info!("Starting geoanim v{}", env!("CARGO_PKG_VERSION"));

    // Validate configuration
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        e
    })?;

    info!("Loading data file: {:?}", data_path);

    let collection = load_features(&data_path).map_err(|e| {
        log_error(&e, "data_load");
        e
    })?;

    let map = GeoMap::build(&collection, &config.map, &NoTileProvider).map_err(|e| {
        log_error(&e, "build_map");
        e
    })?;

    info!(
        "Built map with {} features ({} skipped)",
        map.features.len(),
        map.skipped
    );

    let scene_path = log_timed_operation("export_scene", || {
        map.export(
            &config.output.dir,
            config.output.run_time,
            config.output.lag_ratio,
        )
    })
    .with_context(|| format!("Failed to write scene to {}", config.output.dir.display()))?;

    info!("Scene written to {}", scene_path.display());
    Ok(())
}
