//! Geometry to drawable primitive conversion.
//!
//! Each geometry is projected vertex by vertex, placed into drawing space
//! through the scene's [`Normalizer`] and wrapped into a primitive. A bad
//! geometry produces no primitive and never fails the batch.

use geo_types::{Coord, Geometry, LineString, Point, Polygon};
use tracing::debug;

use crate::colormaps::Color;
use crate::geo::bounds::Bounds;
use crate::geo::feature::{visit_coords, FeatureCollection};
use crate::geo::frame::{DrawPoint, Normalizer};
use crate::geo::projection::Projection;
use crate::primitive::Primitive;

/// How source coordinates become planar units before normalization
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlanarMapping {
    /// Geographic (lon, lat) through one of the built-in projections
    Projected(Projection),
    /// Coordinates are already planar (e.g. Web Mercator meters)
    Identity,
}

impl PlanarMapping {
    /// Map one source coordinate, given as (x, y) = (lon, lat) for geographic data
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        match self {
            PlanarMapping::Projected(p) => p.project(y, x),
            PlanarMapping::Identity => (x, y),
        }
    }

    /// Bounds of every mapped vertex in the collection
    pub fn collection_bounds(&self, collection: &FeatureCollection) -> Option<Bounds> {
        let mut points = Vec::new();
        for geom in collection.features.iter().filter_map(|f| f.geometry.as_ref()) {
            visit_coords(geom, &mut |c| points.push(self.apply(c.x, c.y)));
        }
        Bounds::from_points(points)
    }
}

/// Styling applied by the converter on top of the per-feature color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvertStyle {
    pub fill_opacity: f64,
    /// Polygon outline color; unset outlines each shape in its own color
    pub stroke_color: Option<Color>,
    pub stroke_width: f64,
    pub marker_radius: f64,
}

impl Default for ConvertStyle {
    fn default() -> Self {
        Self {
            fill_opacity: 0.7,
            stroke_color: None,
            stroke_width: 1.0,
            marker_radius: 0.08,
        }
    }
}

/// Converts geometries into primitives for one scene
#[derive(Debug, Clone)]
pub struct GeometryConverter {
    mapping: PlanarMapping,
    normalizer: Normalizer,
    style: ConvertStyle,
}

impl GeometryConverter {
    pub fn new(mapping: PlanarMapping, normalizer: Normalizer, style: ConvertStyle) -> Self {
        Self {
            mapping,
            normalizer,
            style,
        }
    }

    pub fn mapping(&self) -> PlanarMapping {
        self.mapping
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Convert one geometry, or None if it is degenerate or unsupported.
    ///
    /// Polygons are filled and outlined with `color`; lines are stroked with
    /// it and points are drawn as markers in it.
    pub fn convert(&self, geometry: &Geometry<f64>, color: Color) -> Option<Primitive> {
        match geometry {
            Geometry::Polygon(p) => self.convert_polygon(p, color),
            Geometry::MultiPolygon(mp) => {
                group(mp.0.iter().filter_map(|p| self.convert_polygon(p, color)))
            }
            Geometry::Rect(r) => self.convert_polygon(&r.to_polygon(), color),
            Geometry::Triangle(t) => self.convert_polygon(&t.to_polygon(), color),
            Geometry::LineString(ls) => self.convert_line(ls, color),
            Geometry::MultiLineString(mls) => {
                group(mls.0.iter().filter_map(|ls| self.convert_line(ls, color)))
            }
            Geometry::Line(l) => self.convert_line(&LineString::from(vec![l.start, l.end]), color),
            Geometry::Point(p) => self.convert_point(p, color),
            Geometry::MultiPoint(mp) => group(mp.0.iter().filter_map(|p| self.convert_point(p, color))),
            Geometry::GeometryCollection(gc) => {
                group(gc.0.iter().filter_map(|g| self.convert(g, color)))
            }
        }
    }

    /// Filled shape from the exterior ring. Interior rings are ignored.
    pub fn convert_polygon(&self, polygon: &Polygon<f64>, color: Color) -> Option<Primitive> {
        let mut ring: Vec<Coord<f64>> = polygon.exterior().0.clone();
        if ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        if ring.len() < 3 {
            debug!(vertices = ring.len(), "Skipping degenerate polygon");
            return None;
        }

        let points = self.place(&ring)?;
        Some(Primitive::Shape {
            points,
            fill: color,
            fill_opacity: self.style.fill_opacity,
            stroke: self.style.stroke_color.unwrap_or(color),
            stroke_width: self.style.stroke_width,
        })
    }

    /// Open stroked path through the line's vertices
    pub fn convert_line(&self, line: &LineString<f64>, color: Color) -> Option<Primitive> {
        if line.0.len() < 2 {
            debug!(vertices = line.0.len(), "Skipping degenerate line");
            return None;
        }

        let points = self.place(&line.0)?;
        Some(Primitive::Path {
            points,
            stroke: color,
            stroke_width: self.style.stroke_width,
        })
    }

    pub fn convert_point(&self, point: &Point<f64>, color: Color) -> Option<Primitive> {
        let center = *self.place(&[point.0])?.first()?;
        Some(Primitive::Marker {
            center,
            radius: self.style.marker_radius,
            fill: color,
            fill_opacity: 1.0,
        })
    }

    /// Place raw (lat, lon) pairs as one batch, for overlays
    pub fn place_lat_lon(&self, coords: &[(f64, f64)]) -> Option<Vec<DrawPoint>> {
        let coords: Vec<Coord<f64>> = coords.iter().map(|&(lat, lon)| Coord { x: lon, y: lat }).collect();
        self.place(&coords)
    }

    /// Project and normalize a batch; any non-finite vertex rejects the batch
    fn place(&self, coords: &[Coord<f64>]) -> Option<Vec<DrawPoint>> {
        let mut planar = Vec::with_capacity(coords.len());
        for c in coords {
            let (x, y) = self.mapping.apply(c.x, c.y);
            if !x.is_finite() || !y.is_finite() {
                debug!(x = c.x, y = c.y, "Skipping geometry with non-finite coordinate");
                return None;
            }
            planar.push((x, y));
        }
        Some(self.normalizer.fit(&planar))
    }
}

fn group(children: impl Iterator<Item = Primitive>) -> Option<Primitive> {
    let children: Vec<Primitive> = children.collect();
    if children.is_empty() {
        None
    } else {
        Some(Primitive::Group { children })
    }
}
