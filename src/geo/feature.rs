//! Features, attribute values and feature collections.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use geo_types::{Coord, Geometry, Polygon};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::geo::bounds::Bounds;
use crate::geo::crs::Crs;

/// A scalar attribute value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Explicit null / missing
    Null,
    Bool(bool),
    /// Numeric attribute (stored as f64 for simplicity)
    Number(f64),
    Text(String),
}

impl AttributeValue {
    /// Missing values are nulls and NaN numbers
    pub fn is_missing(&self) -> bool {
        match self {
            AttributeValue::Null => true,
            AttributeValue::Number(n) => n.is_nan(),
            _ => false,
        }
    }

    /// Finite numeric value, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttributeValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// Label used when the value acts as a category
    pub fn category_label(&self) -> Option<String> {
        if self.is_missing() {
            return None;
        }
        Some(self.to_string())
    }

    fn type_rank(&self) -> u8 {
        match self {
            AttributeValue::Bool(_) => 0,
            AttributeValue::Number(_) => 1,
            AttributeValue::Text(_) => 2,
            AttributeValue::Null => 3,
        }
    }

    /// Total order used for sorting: booleans, then numbers, then text.
    /// Missing values are not ordered here; callers place them last.
    pub fn sort_cmp(&self, other: &AttributeValue) -> Ordering {
        match (self, other) {
            (AttributeValue::Bool(a), AttributeValue::Bool(b)) => a.cmp(b),
            (AttributeValue::Number(a), AttributeValue::Number(b)) => a.total_cmp(b),
            (AttributeValue::Text(a), AttributeValue::Text(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => f.write_str("null"),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Number(n) => write!(f, "{}", n),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        AttributeValue::Number(n)
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        AttributeValue::Text(s.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        AttributeValue::Text(s)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        AttributeValue::Bool(b)
    }
}

/// How an attribute column should be classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Numeric,
    Categorical,
}

/// One geometry plus its attributes
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Geometry in (lon, lat) order for geographic data; None for null geometry
    pub geometry: Option<Geometry<f64>>,
    pub properties: HashMap<String, AttributeValue>,
}

impl Feature {
    pub fn new(geometry: Geometry<f64>) -> Self {
        Self {
            geometry: Some(geometry),
            properties: HashMap::new(),
        }
    }

    /// Builder-style attribute setter
    pub fn with_property(mut self, name: &str, value: impl Into<AttributeValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn property(&self, name: &str) -> Option<&AttributeValue> {
        self.properties.get(name)
    }
}

/// An ordered sequence of features in one CRS
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
    pub crs: Crs,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>, crs: Crs) -> Self {
        Self { features, crs }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Whether any feature carries the named attribute
    pub fn has_column(&self, name: &str) -> bool {
        self.features.iter().any(|f| f.properties.contains_key(name))
    }

    /// Sorted list of every attribute name in the collection
    pub fn column_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .features
            .iter()
            .flat_map(|f| f.properties.keys().cloned())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    /// Numeric unless some non-missing value is text or boolean
    pub fn column_kind(&self, name: &str) -> Option<ColumnKind> {
        if !self.has_column(name) {
            return None;
        }
        let categorical = self.features.iter().any(|f| {
            matches!(
                f.property(name),
                Some(AttributeValue::Text(_)) | Some(AttributeValue::Bool(_))
            )
        });
        Some(if categorical {
            ColumnKind::Categorical
        } else {
            ColumnKind::Numeric
        })
    }

    /// Bounds of every coordinate in the collection, in its own CRS
    pub fn total_bounds(&self) -> Option<Bounds> {
        let mut bounds: Option<Bounds> = None;
        for geom in self.features.iter().filter_map(|f| f.geometry.as_ref()) {
            visit_coords(geom, &mut |c| {
                if c.x.is_finite() && c.y.is_finite() {
                    bounds = Some(match bounds {
                        Some(b) => b.expand(c.x, c.y),
                        None => Bounds::new(c.x, c.y, c.x, c.y),
                    });
                }
            });
        }
        bounds
    }

    /// Feature indices sorted by an attribute. The sort is stable and
    /// missing values go last in both directions.
    pub fn sorted_indices(&self, key: &str, descending: bool) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.features.len()).collect();
        indices.sort_by(|&a, &b| {
            let va = self.features[a].property(key).filter(|v| !v.is_missing());
            let vb = self.features[b].property(key).filter(|v| !v.is_missing());
            match (va, vb) {
                (Some(x), Some(y)) => {
                    let ord = x.sort_cmp(y);
                    if descending {
                        ord.reverse()
                    } else {
                        ord
                    }
                }
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
        });
        indices
    }

    /// Clamp every y coordinate into [-limit, limit]. Used before sending
    /// geographic data into Web Mercator, which cannot represent the poles.
    pub fn clamp_latitudes(&mut self, limit: f64) {
        for geom in self.features.iter_mut().filter_map(|f| f.geometry.as_mut()) {
            visit_coords_mut(geom, &mut |c| c.y = c.y.clamp(-limit, limit));
        }
    }

    /// Reproject every coordinate into `target`, returning a new collection.
    pub fn to_crs(&self, target: &Crs) -> Result<FeatureCollection> {
        let mut out = self.clone();
        if &self.crs == target {
            return Ok(out);
        }

        for geom in out.features.iter_mut().filter_map(|f| f.geometry.as_mut()) {
            let mut points = Vec::new();
            visit_coords_mut(geom, &mut |c| points.push((c.x, c.y)));

            self.crs.transform_points(target, &mut points)?;

            let mut next = points.into_iter();
            visit_coords_mut(geom, &mut |c| {
                if let Some((x, y)) = next.next() {
                    c.x = x;
                    c.y = y;
                }
            });
        }

        out.crs = *target;
        Ok(out)
    }
}

/// Call `f` for every coordinate of a geometry
pub fn visit_coords(geom: &Geometry<f64>, f: &mut dyn FnMut(&Coord<f64>)) {
    match geom {
        Geometry::Point(p) => f(&p.0),
        Geometry::Line(l) => {
            f(&l.start);
            f(&l.end);
        }
        Geometry::LineString(ls) => ls.0.iter().for_each(|c| f(c)),
        Geometry::Polygon(poly) => visit_polygon(poly, f),
        Geometry::MultiPoint(mp) => mp.0.iter().for_each(|p| f(&p.0)),
        Geometry::MultiLineString(mls) => {
            for ls in &mls.0 {
                ls.0.iter().for_each(|c| f(c));
            }
        }
        Geometry::MultiPolygon(mp) => {
            for poly in &mp.0 {
                visit_polygon(poly, f);
            }
        }
        Geometry::GeometryCollection(gc) => {
            for g in &gc.0 {
                visit_coords(g, f);
            }
        }
        Geometry::Rect(r) => {
            f(&r.min());
            f(&r.max());
        }
        Geometry::Triangle(t) => {
            f(&t.0);
            f(&t.1);
            f(&t.2);
        }
    }
}

fn visit_polygon(poly: &Polygon<f64>, f: &mut dyn FnMut(&Coord<f64>)) {
    poly.exterior().0.iter().for_each(|c| f(c));
    for ring in poly.interiors() {
        ring.0.iter().for_each(|c| f(c));
    }
}

fn visit_polygon_mut(poly: &mut Polygon<f64>, f: &mut dyn FnMut(&mut Coord<f64>)) {
    poly.exterior_mut(|ring| ring.0.iter_mut().for_each(|c| f(c)));
    poly.interiors_mut(|rings| {
        for ring in rings.iter_mut() {
            ring.0.iter_mut().for_each(|c| f(c));
        }
    });
}

/// Call `f` for every coordinate of a geometry, mutably.
///
/// Visiting order matches [`visit_coords`], so a read pass followed by a
/// write pass lines up point for point.
pub fn visit_coords_mut(geom: &mut Geometry<f64>, f: &mut dyn FnMut(&mut Coord<f64>)) {
    match geom {
        Geometry::Point(p) => f(&mut p.0),
        Geometry::Line(l) => {
            f(&mut l.start);
            f(&mut l.end);
        }
        Geometry::LineString(ls) => ls.0.iter_mut().for_each(|c| f(c)),
        Geometry::Polygon(poly) => visit_polygon_mut(poly, f),
        Geometry::MultiPoint(mp) => mp.0.iter_mut().for_each(|p| f(&mut p.0)),
        Geometry::MultiLineString(mls) => {
            for ls in mls.0.iter_mut() {
                ls.0.iter_mut().for_each(|c| f(c));
            }
        }
        Geometry::MultiPolygon(mp) => {
            for poly in mp.0.iter_mut() {
                visit_polygon_mut(poly, f);
            }
        }
        Geometry::GeometryCollection(gc) => {
            for g in gc.0.iter_mut() {
                visit_coords_mut(g, f);
            }
        }
        Geometry::Rect(r) => {
            let mut min = r.min();
            let mut max = r.max();
            f(&mut min);
            f(&mut max);
            *r = geo_types::Rect::new(min, max);
        }
        Geometry::Triangle(t) => {
            f(&mut t.0);
            f(&mut t.1);
            f(&mut t.2);
        }
    }
}
