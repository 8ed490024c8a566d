//! Colors and piecewise-linear color ramps.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GeoAnimError, Result};

/// An opaque RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse "#RRGGBB" (the leading '#' is optional)
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let invalid = || GeoAnimError::InvalidParameter {
            param: "color".to_string(),
            message: format!("Invalid hex color: {}", hex),
        };
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        Ok(Color::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }

    /// RGBA bytes with the given alpha
    pub fn to_rgba(&self, alpha: u8) -> [u8; 4] {
        [self.r, self.g, self.b, alpha]
    }
}

impl FromStr for Color {
    type Err = GeoAnimError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Color::from_hex(s)
    }
}

impl TryFrom<String> for Color {
    type Error = GeoAnimError;

    fn try_from(s: String) -> std::result::Result<Self, Self::Error> {
        Color::from_hex(&s)
    }
}

impl From<Color> for String {
    fn from(c: Color) -> Self {
        c.to_hex()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Linear interpolation between two colors
pub fn lerp_color(c1: Color, c2: Color, t: f64) -> Color {
    let mix = |a: u8, b: u8| (a as f64 * (1.0 - t) + b as f64 * t).round().clamp(0.0, 255.0) as u8;
    Color::rgb(mix(c1.r, c2.r), mix(c1.g, c2.g), mix(c1.b, c2.b))
}

/// An ordered list of at least two color stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorRamp {
    stops: Vec<Color>,
}

impl ColorRamp {
    /// Build a ramp. A single color is repeated to form a flat ramp.
    pub fn new(stops: Vec<Color>) -> Result<Self> {
        match stops.len() {
            0 => Err(GeoAnimError::InvalidParameter {
                param: "color_scheme".to_string(),
                message: "A color ramp needs at least one color".to_string(),
            }),
            1 => Ok(Self {
                stops: vec![stops[0], stops[0]],
            }),
            _ => Ok(Self { stops }),
        }
    }

    /// Built-in tables always carry two or more stops
    pub(crate) fn from_builtin(stops: &'static [Color]) -> Self {
        debug_assert!(stops.len() >= 2);
        Self {
            stops: stops.to_vec(),
        }
    }

    pub fn stops(&self) -> &[Color] {
        &self.stops
    }

    pub fn first(&self) -> Color {
        self.stops[0]
    }

    pub fn last(&self) -> Color {
        self.stops[self.stops.len() - 1]
    }

    /// Map a value in [0, 1] to a color
    pub fn map_normalized(&self, value: f64) -> Color {
        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };

        // Calculate the position in our color array
        let position = value * (self.stops.len() - 1) as f64;
        let index = position.floor() as usize;

        if index >= self.stops.len() - 1 {
            return self.last();
        }

        let t = position - index as f64;
        lerp_color(self.stops[index], self.stops[index + 1], t)
    }

    /// Map a value to a color given the data range.
    ///
    /// A zero-width range returns the first stop.
    pub fn map(&self, value: f64, min: f64, max: f64) -> Color {
        if max == min {
            return self.first();
        }
        self.map_normalized((value - min) / (max - min))
    }

    /// Exactly `n` discrete colors taken from the stops in order,
    /// cycling through the stops when `n` exceeds their count.
    pub fn cycled(&self, n: usize) -> Vec<Color> {
        self.stops.iter().copied().cycle().take(n).collect()
    }
}
