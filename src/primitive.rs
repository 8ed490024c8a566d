//! Drawable primitives handed to the host renderer.
//!
//! Everything here is already in drawing space. The host owns rasterizing,
//! timing and encoding; this crate only decides what to draw and in which
//! order.

use image::RgbaImage;
use serde::Serialize;

use crate::colormaps::Color;
use crate::geo::feature::AttributeValue;
use crate::geo::frame::{DrawPoint, DrawRect};

/// Horizontal anchoring of a text label relative to its position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelAnchor {
    Left,
    Center,
}

/// A positioned raster drawn beneath every vector primitive.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackgroundRaster {
    /// Pixels are written to disk at export time and referenced by name
    #[serde(skip)]
    pub image: RgbaImage,
    /// File name of the exported raster, set by the scene exporter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub rect: DrawRect,
    pub opacity: f64,
    pub pixel_width: u32,
    pub pixel_height: u32,
}

impl BackgroundRaster {
    pub fn new(image: RgbaImage, rect: DrawRect, opacity: f64) -> Self {
        let (pixel_width, pixel_height) = image.dimensions();
        Self {
            image,
            source: None,
            rect,
            opacity,
            pixel_width,
            pixel_height,
        }
    }
}

/// A drawable primitive
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Primitive {
    /// Closed, filled and stroked outline
    Shape {
        points: Vec<DrawPoint>,
        fill: Color,
        fill_opacity: f64,
        stroke: Color,
        stroke_width: f64,
    },
    /// Open stroked polyline
    Path {
        points: Vec<DrawPoint>,
        stroke: Color,
        stroke_width: f64,
    },
    /// Filled circular marker
    Marker {
        center: DrawPoint,
        radius: f64,
        fill: Color,
        fill_opacity: f64,
    },
    Label {
        text: String,
        position: DrawPoint,
        color: Color,
        font_size: f64,
        anchor: LabelAnchor,
    },
    Group {
        children: Vec<Primitive>,
    },
    Background(BackgroundRaster),
}

impl Primitive {
    /// An axis-aligned rectangle as a shape primitive
    pub fn rect(
        rect: &DrawRect,
        fill: Color,
        fill_opacity: f64,
        stroke: Color,
        stroke_width: f64,
    ) -> Self {
        let hw = rect.width / 2.0;
        let hh = rect.height / 2.0;
        let (cx, cy) = (rect.center.x, rect.center.y);
        Primitive::Shape {
            points: vec![
                DrawPoint::new(cx - hw, cy - hh),
                DrawPoint::new(cx + hw, cy - hh),
                DrawPoint::new(cx + hw, cy + hh),
                DrawPoint::new(cx - hw, cy + hh),
            ],
            fill,
            fill_opacity,
            stroke,
            stroke_width,
        }
    }

    /// Number of leaf primitives, counting through groups
    pub fn leaf_count(&self) -> usize {
        match self {
            Primitive::Group { children } => children.iter().map(Primitive::leaf_count).sum(),
            _ => 1,
        }
    }

    /// Every drawing-space vertex of this primitive and its children
    pub fn vertices(&self) -> Vec<DrawPoint> {
        let mut out = Vec::new();
        self.collect_vertices(&mut out);
        out
    }

    fn collect_vertices(&self, out: &mut Vec<DrawPoint>) {
        match self {
            Primitive::Shape { points, .. } | Primitive::Path { points, .. } => {
                out.extend_from_slice(points)
            }
            Primitive::Marker { center, .. } => out.push(*center),
            Primitive::Label { position, .. } => out.push(*position),
            Primitive::Group { children } => {
                for child in children {
                    child.collect_vertices(out);
                }
            }
            Primitive::Background(bg) => out.push(bg.rect.center),
        }
    }
}

/// The primitive produced for one source feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedFeature {
    /// Index of the feature in the input collection
    pub source_index: usize,
    /// Value of the ordering column, when ordering was requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_value: Option<AttributeValue>,
    pub color: Color,
    pub primitive: Primitive,
}
