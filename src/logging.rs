//! Logging utilities for geoanim.
//!
//! Every map build gets an id so its stage messages can be grepped together.

use std::time::Instant;
use tracing::{debug, error, info, warn};

use uuid::Uuid;

use crate::error::GeoAnimError;
use crate::geo::bounds::Bounds;
use crate::geo::crs::Crs;

/// Initialize the tracing subscriber. `RUST_LOG` wins over `log_level`.
pub fn init_tracing(log_level: &str) {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());

    // Tests call this repeatedly; only the first subscriber sticks
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .try_init();
}

/// A running pipeline stage, timed from creation until [`StageTimer::finish`].
#[derive(Debug)]
pub struct StageTimer {
    stage: &'static str,
    map_id: String,
    started: Instant,
}

impl StageTimer {
    pub fn start(stage: &'static str, map_id: &str) -> Self {
        info!(stage = stage, map_id = %map_id, "Stage started");
        Self {
            stage,
            map_id: map_id.to_string(),
            started: Instant::now(),
        }
    }

    /// Elapsed time so far, in milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.started.elapsed().as_secs_f64() * 1000.0
    }

    /// Close the stage. `dropped` counts inputs that were skipped on the way.
    pub fn finish(self, dropped: usize) {
        let duration_ms = self.elapsed_ms();
        if dropped == 0 {
            info!(
                stage = self.stage,
                map_id = %self.map_id,
                duration_ms = duration_ms,
                "Stage completed"
            );
        } else {
            warn!(
                stage = self.stage,
                map_id = %self.map_id,
                duration_ms = duration_ms,
                dropped = dropped,
                "Stage completed with dropped inputs"
            );
        }
    }
}

/// Run `f`, logging how long it took under a fresh operation id
pub fn log_timed_operation<F, R>(operation: &str, f: F) -> R
where
    F: FnOnce() -> R,
{
    let started = Instant::now();
    let operation_id = generate_operation_id();
    debug!(operation = operation, operation_id = %operation_id, "Operation started");

    let result = f();

    info!(
        operation = operation,
        operation_id = %operation_id,
        duration_ms = started.elapsed().as_secs_f64() * 1000.0,
        "Operation completed"
    );
    result
}

/// Summary of a freshly loaded dataset
pub fn log_dataset_stats(
    file_path: &str,
    feature_count: usize,
    columns: &[String],
    crs: &Crs,
    bounds: Option<&Bounds>,
) {
    let bounds = bounds
        .map(|b| format!("{:.4},{:.4},{:.4},{:.4}", b.min_x, b.min_y, b.max_x, b.max_y))
        .unwrap_or_else(|| "none".to_string());
    info!(
        file_path = file_path,
        feature_count = feature_count,
        columns = %columns.join(", "),
        crs = %crs,
        bounds = %bounds,
        "Dataset loaded"
    );
}

/// Log an error together with the stage it came from
pub fn log_error(err: &GeoAnimError, stage: &str) {
    let kind = match err {
        GeoAnimError::UnknownProjection { .. }
        | GeoAnimError::UnknownColorScheme { .. }
        | GeoAnimError::Config { .. }
        | GeoAnimError::InvalidParameter { .. } => "config",
        GeoAnimError::FileNotFound { .. }
        | GeoAnimError::UnsupportedFormat { .. }
        | GeoAnimError::EmptyDataset
        | GeoAnimError::GeoJson(_) => "input",
        GeoAnimError::Crs { .. } | GeoAnimError::Projection(_) => "crs",
        GeoAnimError::Basemap { .. } | GeoAnimError::Image(_) => "basemap",
        GeoAnimError::Io(_) | GeoAnimError::Json(_) => "io",
    };
    error!(error = %err, stage = stage, kind = kind, "Pipeline error");
}

/// A fresh id for a map build or a timed operation
pub fn generate_operation_id() -> String {
    Uuid::new_v4().to_string()
}
