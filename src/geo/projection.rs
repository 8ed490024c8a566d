//! Map projections from geographic degrees to unprojected planar units.
//!
//! Only three approximate projections are provided. They are plain functions
//! selected through a tagged enum, so every call site dispatches on the
//! variant rather than on a name string.

use std::f64::consts::FRAC_PI_4;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GeoAnimError, Result};

/// Latitude limit applied before the Mercator formula.
pub const MERCATOR_LAT_LIMIT: f64 = 85.0511;

/// Names accepted by [`Projection::parse_projection`].
pub const PROJECTION_NAMES: [&str; 4] = ["mercator", "equirectangular", "plate_carree", "robinson"];

/// Supported map projections
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    /// Spherical Mercator with latitude clamped to ±85.0511°
    #[default]
    Mercator,
    /// Plate carrée: radians in, radians out
    Equirectangular,
    /// Closed-form stand-in for Robinson, not the tabulated projection
    Robinson,
}

impl Projection {
    /// Project a (latitude, longitude) pair in degrees to planar (x, y).
    pub fn project(&self, lat: f64, lon: f64) -> (f64, f64) {
        match self {
            Projection::Mercator => mercator(lat, lon),
            Projection::Equirectangular => equirectangular(lat, lon),
            Projection::Robinson => robinson(lat, lon),
        }
    }

    /// Canonical name of the projection
    pub fn name(&self) -> &'static str {
        match self {
            Projection::Mercator => "mercator",
            Projection::Equirectangular => "equirectangular",
            Projection::Robinson => "robinson",
        }
    }

    /// Create a Projection from a string (case-insensitive)
    pub fn parse_projection(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mercator" => Ok(Projection::Mercator),
            "equirectangular" | "plate_carree" => Ok(Projection::Equirectangular),
            "robinson" => Ok(Projection::Robinson),
            _ => Err(GeoAnimError::UnknownProjection {
                name: s.to_string(),
                available: PROJECTION_NAMES.to_vec(),
            }),
        }
    }
}

impl FromStr for Projection {
    type Err = GeoAnimError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Projection::parse_projection(s)
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Spherical Mercator. Latitude is clamped so the poles stay finite.
pub fn mercator(lat: f64, lon: f64) -> (f64, f64) {
    let lat = lat.clamp(-MERCATOR_LAT_LIMIT, MERCATOR_LAT_LIMIT);
    let x = lon.to_radians();
    let y = (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
    (x, y)
}

/// Equirectangular (plate carrée)
pub fn equirectangular(lat: f64, lon: f64) -> (f64, f64) {
    (lon.to_radians(), lat.to_radians())
}

/// Approximate Robinson: x = λ·cos(φ/2), y = 1.3·φ
pub fn robinson(lat: f64, lon: f64) -> (f64, f64) {
    let lat_rad = lat.to_radians();
    let x = lon.to_radians() * (0.5 * lat_rad).cos();
    let y = 1.3 * lat_rad;
    (x, y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_equirectangular_is_radians() {
        let (x, y) = equirectangular(45.0, -90.0);
        assert!((x + PI / 2.0).abs() < 1e-12);
        assert!((y - PI / 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_mercator_equator_origin() {
        let (x, y) = mercator(0.0, 0.0);
        assert_eq!(x, 0.0);
        assert!(y.abs() < 1e-12);
    }

    #[test]
    fn test_mercator_pole_clamp() {
        assert_eq!(mercator(90.0, 0.0), mercator(MERCATOR_LAT_LIMIT, 0.0));
        assert_eq!(mercator(-90.0, 0.0), mercator(-MERCATOR_LAT_LIMIT, 0.0));
        assert!(mercator(90.0, 0.0).1.is_finite());
        // The clamp lands close to the Web Mercator square edge (y ≈ π)
        assert!((mercator(MERCATOR_LAT_LIMIT, 0.0).1 - PI).abs() < 1e-3);
    }

    #[test]
    fn test_mercator_finite_and_monotonic_in_lon() {
        let mut lat = -MERCATOR_LAT_LIMIT;
        while lat <= MERCATOR_LAT_LIMIT {
            let mut prev = f64::NEG_INFINITY;
            let mut lon = -180.0;
            while lon <= 180.0 {
                let (x, y) = mercator(lat, lon);
                assert!(x.is_finite() && y.is_finite());
                assert!(x > prev, "x not increasing at lat={lat} lon={lon}");
                prev = x;
                lon += 7.5;
            }
            lat += 5.0;
        }
    }

    #[test]
    fn test_robinson_formula() {
        let (x, y) = robinson(60.0, 90.0);
        assert!((x - (PI / 2.0) * (PI / 6.0).cos()).abs() < 1e-12);
        assert!((y - 1.3 * PI / 3.0).abs() < 1e-12);
        // Equator keeps longitude unscaled
        assert!((robinson(0.0, 180.0).0 - PI).abs() < 1e-12);
    }

    #[test]
    fn test_parse_projection() {
        assert_eq!(Projection::from_str("mercator").unwrap(), Projection::Mercator);
        assert_eq!(Projection::from_str("Robinson").unwrap(), Projection::Robinson);
        assert_eq!(
            Projection::from_str("plate_carree").unwrap(),
            Projection::Equirectangular
        );

        match Projection::from_str("azimuthal") {
            Err(GeoAnimError::UnknownProjection { name, available }) => {
                assert_eq!(name, "azimuthal");
                assert!(available.contains(&"robinson"));
            }
            other => panic!("expected UnknownProjection, got {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_matches_functions() {
        assert_eq!(Projection::Mercator.project(10.0, 20.0), mercator(10.0, 20.0));
        assert_eq!(Projection::Robinson.project(10.0, 20.0), robinson(10.0, 20.0));
        assert_eq!(
            Projection::Equirectangular.project(10.0, 20.0),
            equirectangular(10.0, 20.0)
        );
    }
}
