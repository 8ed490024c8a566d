//! Colorbar and categorical legend primitives built from a classification.

use serde::{Deserialize, Serialize};

use super::classify::{CategoricalClassification, Classification, NumericClassification};
use super::colormap::Color;
use crate::geo::frame::{DrawPoint, DrawRect};
use crate::primitive::{LabelAnchor, Primitive};

/// Gradient resolution of the colorbar
pub const COLORBAR_SEGMENTS: usize = 50;

/// Placement and text styling of a legend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegendLayout {
    /// Center of the colorbar, or the top-left anchor of a category list
    pub position: DrawPoint,
    pub width: f64,
    pub height: f64,
    pub num_labels: usize,
    pub font_size: f64,
    pub text_color: Color,
}

impl Default for LegendLayout {
    fn default() -> Self {
        Self {
            position: DrawPoint::new(5.5, 0.0),
            width: 0.5,
            height: 3.0,
            num_labels: 5,
            font_size: 20.0,
            text_color: Color::WHITE,
        }
    }
}

/// Human title for a column: underscores become spaces, words are capitalized
pub fn title_from_column(column: &str) -> String {
    column
        .split(|c: char| c == '_' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(|c| c.to_lowercase()))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Legend for any classification; None when there is nothing to show
pub fn build_legend(classification: Option<&Classification>, layout: &LegendLayout) -> Option<Primitive> {
    match classification? {
        Classification::Numeric(n) => colorbar(n, layout),
        Classification::Categorical(c) => Some(category_legend(c, layout)),
    }
}

/// Vertical colorbar: gradient segments low to high, a border, evenly
/// spaced value labels on the right and a title above.
pub fn colorbar(numeric: &NumericClassification, layout: &LegendLayout) -> Option<Primitive> {
    let (min, max) = (numeric.min?, numeric.max?);
    let pos = layout.position;
    let segment_height = layout.height / COLORBAR_SEGMENTS as f64;
    let bottom = pos.y - layout.height / 2.0;

    let mut children = Vec::with_capacity(COLORBAR_SEGMENTS + layout.num_labels + 2);

    for i in 0..COLORBAR_SEGMENTS {
        let value = min + (i as f64 / COLORBAR_SEGMENTS as f64) * (max - min);
        let color = numeric.ramp.map(value, min, max);
        let rect = DrawRect {
            center: DrawPoint::new(pos.x, bottom + (i as f64 + 0.5) * segment_height),
            width: layout.width,
            height: segment_height,
        };
        children.push(Primitive::rect(&rect, color, 1.0, color, 0.0));
    }

    let border = DrawRect {
        center: pos,
        width: layout.width,
        height: layout.height,
    };
    children.push(Primitive::rect(&border, layout.text_color, 0.0, layout.text_color, 2.0));

    let steps = layout.num_labels.saturating_sub(1).max(1) as f64;
    for i in 0..layout.num_labels {
        let t = i as f64 / steps;
        let value = min + t * (max - min);
        children.push(Primitive::Label {
            text: format!("{:.1}", value),
            position: DrawPoint::new(pos.x + layout.width / 2.0 + 0.2, bottom + t * layout.height),
            color: layout.text_color,
            font_size: layout.font_size,
            anchor: LabelAnchor::Left,
        });
    }

    children.push(Primitive::Label {
        text: title_from_column(&numeric.column),
        position: DrawPoint::new(pos.x, pos.y + layout.height / 2.0 + 0.3),
        color: layout.text_color,
        font_size: layout.font_size + 2.0,
        anchor: LabelAnchor::Center,
    });

    Some(Primitive::Group { children })
}

/// One swatch and label per category, stacked downward from the top of the layout box
pub fn category_legend(categorical: &CategoricalClassification, layout: &LegendLayout) -> Primitive {
    const SWATCH: f64 = 0.25;
    const SPACING: f64 = 0.15;

    let left = layout.position.x - layout.width / 2.0;
    let mut y = layout.position.y + layout.height / 2.0 - SWATCH / 2.0;
    let mut children = Vec::with_capacity(categorical.entries.len() * 2);

    for entry in &categorical.entries {
        let swatch = DrawRect {
            center: DrawPoint::new(left + SWATCH / 2.0, y),
            width: SWATCH,
            height: SWATCH,
        };
        children.push(Primitive::rect(&swatch, entry.color, 1.0, entry.color, 0.0));
        children.push(Primitive::Label {
            text: entry.key.to_string(),
            position: DrawPoint::new(left + SWATCH + 0.15, y),
            color: entry.color,
            font_size: layout.font_size,
            anchor: LabelAnchor::Left,
        });
        y -= SWATCH + SPACING;
    }

    Primitive::Group { children }
}
