//! Playback directives for the host renderer.
//!
//! The host owns timing; this module only says what to play. A
//! [`Storyboard`] carries the previously shown map so that a sequence of
//! maps can morph from one into the next.

use serde::Serialize;
use tracing::debug;

use crate::scene::GeoMap;

/// When one item of a lagged reveal starts and how long it runs
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RevealStep {
    /// Index into the map's ordered feature list
    pub index: usize,
    pub start: f64,
    pub duration: f64,
}

/// Per-item timings for revealing `count` items one after another.
///
/// Each item runs for `d` seconds and item `i` starts at `i * lag_ratio * d`,
/// with `d` chosen so the last item ends exactly at `run_time`.
pub fn lagged_schedule(count: usize, run_time: f64, lag_ratio: f64) -> Vec<RevealStep> {
    if count == 0 {
        return Vec::new();
    }
    let duration = run_time / (1.0 + (count - 1) as f64 * lag_ratio);
    (0..count)
        .map(|index| RevealStep {
            index,
            start: index as f64 * lag_ratio * duration,
            duration,
        })
        .collect()
}

/// A directive the host plays on a map
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Animation {
    /// Draw every primitive at once
    Create { run_time: f64 },
    /// Fade the whole map in; used when a basemap is present
    FadeIn { run_time: f64 },
    /// Reveal features one by one in sorted order
    LaggedCreate {
        run_time: f64,
        lag_ratio: f64,
        schedule: Vec<RevealStep>,
    },
    /// Morph the previously shown map into this one
    Transform { from: String, run_time: f64 },
}

impl Animation {
    pub fn run_time(&self) -> f64 {
        match self {
            Animation::Create { run_time }
            | Animation::FadeIn { run_time }
            | Animation::LaggedCreate { run_time, .. }
            | Animation::Transform { run_time, .. } => *run_time,
        }
    }
}

/// One shown map and how it enters the scene
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoryStep {
    pub map_id: String,
    pub animation: Animation,
}

/// A sequence of maps. The first one is created; each later one transforms
/// out of its predecessor.
#[derive(Debug, Default)]
pub struct Storyboard {
    previous: Option<GeoMap>,
    steps: Vec<StoryStep>,
}

impl Storyboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `map` next and return the directive that brings it in
    pub fn show(&mut self, map: GeoMap, run_time: f64, lag_ratio: f64) -> &StoryStep {
        let animation = match &self.previous {
            Some(prev) => Animation::Transform {
                from: prev.id.clone(),
                run_time,
            },
            None => map.creation_animation(run_time, lag_ratio),
        };
        debug!(map_id = %map.id, run_time = run_time, "Storyboard step");

        let index = self.steps.len();
        self.steps.push(StoryStep {
            map_id: map.id.clone(),
            animation,
        });
        self.previous = Some(map);
        &self.steps[index]
    }

    /// The map currently on screen
    pub fn current(&self) -> Option<&GeoMap> {
        self.previous.as_ref()
    }

    pub fn steps(&self) -> &[StoryStep] {
        &self.steps
    }
}
