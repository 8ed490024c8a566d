//! Coordinate reference system identifiers and transforms.
//!
//! A CRS is identified by its EPSG code. Transforms go through `proj4rs`,
//! which works in radians for geographic systems, so degrees are converted
//! on the way in and out.

use std::fmt;
use std::str::FromStr;

use proj4rs::{transform::transform, Proj};
use serde::{Deserialize, Serialize};

use crate::error::{GeoAnimError, Result};
use crate::geo::bounds::Bounds;

/// An EPSG-coded coordinate reference system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Crs {
    epsg: u16,
}

impl Crs {
    /// Geographic WGS84 longitude/latitude in degrees
    pub const WGS84: Crs = Crs { epsg: 4326 };
    /// Spherical Web Mercator in meters
    pub const WEB_MERCATOR: Crs = Crs { epsg: 3857 };

    pub fn from_epsg(epsg: u16) -> Self {
        Self { epsg }
    }

    pub fn epsg(&self) -> u16 {
        self.epsg
    }

    /// Parse "EPSG:3857", "urn:ogc:def:crs:EPSG::3857", "CRS84" and friends
    pub fn parse_crs(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let upper = trimmed.to_uppercase();

        if upper == "WGS84" || upper == "CRS84" || upper.ends_with(":CRS84") {
            return Ok(Crs::WGS84);
        }

        let code = upper
            .strip_prefix("EPSG:")
            .or_else(|| upper.strip_prefix("URN:OGC:DEF:CRS:EPSG::"))
            .or_else(|| upper.strip_prefix("URN:OGC:DEF:CRS:EPSG:"))
            .unwrap_or(&upper);

        let epsg = code
            .rsplit(':')
            .next()
            .unwrap_or(code)
            .parse::<u16>()
            .map_err(|_| GeoAnimError::Crs {
                message: format!("Unrecognized CRS identifier: {}", s),
            })?;

        Ok(Crs { epsg })
    }

    fn proj(&self) -> Result<Proj> {
        Ok(Proj::from_epsg_code(self.epsg)?)
    }

    /// Whether coordinates in this CRS are longitude/latitude degrees
    pub fn is_geographic(&self) -> bool {
        match self.epsg {
            4326 => true,
            3857 => false,
            _ => self.proj().map(|p| p.is_latlong()).unwrap_or(false),
        }
    }

    /// Transform (x, y) points in place from this CRS into `to`.
    pub fn transform_points(&self, to: &Crs, points: &mut [(f64, f64)]) -> Result<()> {
        if self == to || points.is_empty() {
            return Ok(());
        }

        let src = self.proj()?;
        let dst = to.proj()?;

        if src.is_latlong() {
            for p in points.iter_mut() {
                *p = (p.0.to_radians(), p.1.to_radians());
            }
        }

        transform(&src, &dst, points)?;

        if dst.is_latlong() {
            for p in points.iter_mut() {
                *p = (p.0.to_degrees(), p.1.to_degrees());
            }
        }

        Ok(())
    }

    /// Transform a single point
    pub fn transform_point(&self, to: &Crs, x: f64, y: f64) -> Result<(f64, f64)> {
        let mut pts = [(x, y)];
        self.transform_points(to, &mut pts)?;
        Ok(pts[0])
    }

    /// Transform a bounding box by its two corners.
    ///
    /// The result is not re-ordered: a transform that flips an axis yields
    /// an inverted rectangle, which callers treat as "no overlap".
    pub fn transform_bounds(&self, to: &Crs, bounds: &Bounds) -> Result<Bounds> {
        let mut corners = [(bounds.min_x, bounds.min_y), (bounds.max_x, bounds.max_y)];
        self.transform_points(to, &mut corners)?;
        Ok(Bounds::new(corners[0].0, corners[0].1, corners[1].0, corners[1].1))
    }
}

impl Default for Crs {
    fn default() -> Self {
        Crs::WGS84
    }
}

impl FromStr for Crs {
    type Err = GeoAnimError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Crs::parse_crs(s)
    }
}

impl TryFrom<String> for Crs {
    type Error = GeoAnimError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        Crs::parse_crs(&s)
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}
