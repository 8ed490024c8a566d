//! Geographic building blocks: projections, CRS handling, bounds,
//! reference frames and the feature data model.

pub mod bounds;
pub mod crs;
pub mod feature;
pub mod frame;
pub mod projection;

pub use bounds::Bounds;
pub use crs::Crs;
pub use feature::{AttributeValue, ColumnKind, Feature, FeatureCollection};
pub use frame::{DrawPoint, DrawRect, DrawingExtent, Normalizer, ReferenceFrame};
pub use projection::{Projection, MERCATOR_LAT_LIMIT};
