//! Colors, named ramps, data classification and legends.
//!
//! A column is classified once per map (numeric min/max or categorical
//! top-K plus Other) and the result is reused to color every feature and to
//! build the colorbar or legend.

pub mod classify;
pub mod colormap;
pub mod legend;
pub mod schemes;

pub use classify::{
    classify, CategoricalClassification, CategoryEntry, CategoryKey, Classification,
    NumericClassification, DEFAULT_TOP_K,
};
pub use colormap::{lerp_color, Color, ColorRamp};
pub use legend::{build_legend, LegendLayout};
pub use schemes::{ColorScheme, SchemeSource, SCHEME_NAMES};
