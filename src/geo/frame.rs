//! Reference frames and the mapping from planar units into drawing space.
//!
//! Axis-fit mode fixes one [`ReferenceFrame`] for the whole scene and maps
//! every point through it. The self-normalizing fallback rescales each batch
//! by its own min/max, which only lines up when all geometry is normalized
//! together in a single batch.

use serde::{Deserialize, Serialize};

use crate::geo::bounds::Bounds;

/// A point in the host's drawing space (y up, origin at the center)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawPoint {
    pub x: f64,
    pub y: f64,
}

impl DrawPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Size of the drawing-space region the map is fitted into
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawingExtent {
    pub width: f64,
    pub height: f64,
}

impl Default for DrawingExtent {
    fn default() -> Self {
        Self {
            width: 14.0,
            height: 8.0,
        }
    }
}

/// The bounding box used to map planar units linearly into drawing space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReferenceFrame {
    pub bounds: Bounds,
    pub extent: DrawingExtent,
}

impl ReferenceFrame {
    /// Build a frame from planar bounds, growing each side by `padding`
    /// (a fraction of the span).
    pub fn from_bounds(bounds: Bounds, padding: f64, extent: DrawingExtent) -> Self {
        Self {
            bounds: bounds.padded(padding),
            extent,
        }
    }

    /// Map a planar point into drawing space.
    ///
    /// A zero-width or zero-height frame maps that axis to the center.
    pub fn to_drawing(&self, x: f64, y: f64) -> DrawPoint {
        DrawPoint {
            x: scale_axis(x, self.bounds.min_x, self.bounds.max_x, self.extent.width),
            y: scale_axis(y, self.bounds.min_y, self.bounds.max_y, self.extent.height),
        }
    }

    /// Map a planar rectangle into drawing space
    pub fn rect_to_drawing(&self, rect: &Bounds) -> DrawRect {
        let bl = self.to_drawing(rect.min_x, rect.min_y);
        let tr = self.to_drawing(rect.max_x, rect.max_y);
        DrawRect::from_corners(bl, tr)
    }
}

/// An axis-aligned rectangle in drawing space, described by center and size
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawRect {
    pub center: DrawPoint,
    pub width: f64,
    pub height: f64,
}

impl DrawRect {
    pub fn from_corners(a: DrawPoint, b: DrawPoint) -> Self {
        Self {
            center: DrawPoint::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        }
    }

    /// The rectangle covering a whole drawing extent
    pub fn covering(extent: &DrawingExtent) -> Self {
        Self {
            center: DrawPoint::new(0.0, 0.0),
            width: extent.width,
            height: extent.height,
        }
    }
}

fn scale_axis(value: f64, min: f64, max: f64, length: f64) -> f64 {
    let span = max - min;
    let normalized = if span > 0.0 { (value - min) / span } else { 0.5 };
    (normalized - 0.5) * length
}

/// Self-normalizing fallback: rescale a batch by its own bounds.
///
/// Points normalized in separate batches do not share a coordinate system.
pub fn normalize_batch(points: &[(f64, f64)], extent: &DrawingExtent) -> Vec<DrawPoint> {
    match Bounds::from_points(points.iter().copied()) {
        Some(bounds) => {
            let frame = ReferenceFrame::from_bounds(bounds, 0.0, *extent);
            points.iter().map(|&(x, y)| frame.to_drawing(x, y)).collect()
        }
        None => Vec::new(),
    }
}

/// How planar points are placed into drawing space
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalizer {
    /// One frame shared by the whole scene
    AxisFit(ReferenceFrame),
    /// Each batch is rescaled by its own bounds
    SelfNormalizing(DrawingExtent),
}

impl Normalizer {
    /// Place a batch of planar points into drawing space
    pub fn fit(&self, points: &[(f64, f64)]) -> Vec<DrawPoint> {
        match self {
            Normalizer::AxisFit(frame) => points
                .iter()
                .map(|&(x, y)| frame.to_drawing(x, y))
                .collect(),
            Normalizer::SelfNormalizing(extent) => normalize_batch(points, extent),
        }
    }

    pub fn frame(&self) -> Option<&ReferenceFrame> {
        match self {
            Normalizer::AxisFit(frame) => Some(frame),
            Normalizer::SelfNormalizing(_) => None,
        }
    }

    pub fn extent(&self) -> DrawingExtent {
        match self {
            Normalizer::AxisFit(frame) => frame.extent,
            Normalizer::SelfNormalizing(extent) => *extent,
        }
    }
}
