//! Named color schemes for choropleth and categorical maps.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::colormap::{Color, ColorRamp};
use crate::error::{GeoAnimError, Result};

const BLUE_E: Color = Color::rgb(0x1C, 0x75, 0x8A);
const BLUE_D: Color = Color::rgb(0x29, 0xAB, 0xCA);
const BLUE_C: Color = Color::rgb(0x58, 0xC4, 0xDD);
const BLUE_B: Color = Color::rgb(0x9C, 0xDC, 0xEB);
const BLUE_A: Color = Color::rgb(0xC7, 0xE9, 0xF1);
const RED_E: Color = Color::rgb(0xCF, 0x50, 0x44);
const RED_D: Color = Color::rgb(0xE6, 0x5A, 0x4C);
const RED_C: Color = Color::rgb(0xFC, 0x62, 0x55);
const RED_B: Color = Color::rgb(0xFF, 0x80, 0x80);
const RED_A: Color = Color::rgb(0xF7, 0xA1, 0xA3);
const GREEN_E: Color = Color::rgb(0x69, 0x9C, 0x52);
const GREEN_D: Color = Color::rgb(0x77, 0xB0, 0x5D);
const GREEN_C: Color = Color::rgb(0x83, 0xC1, 0x67);
const GREEN_B: Color = Color::rgb(0xA6, 0xCF, 0x8C);
const GREEN_A: Color = Color::rgb(0xC9, 0xE2, 0xAE);
const PURPLE_E: Color = Color::rgb(0x64, 0x41, 0x72);
const PURPLE_D: Color = Color::rgb(0x71, 0x55, 0x82);
const PURPLE_C: Color = Color::rgb(0x9A, 0x72, 0xAC);
const PURPLE_B: Color = Color::rgb(0xB1, 0x89, 0xC6);
const PURPLE_A: Color = Color::rgb(0xCA, 0xA3, 0xE8);
const ORANGE: Color = Color::rgb(0xFF, 0x86, 0x2F);
const YELLOW_E: Color = Color::rgb(0xE8, 0xC1, 0x1C);
const YELLOW_C: Color = Color::rgb(0xFF, 0xFF, 0x00);
const TEAL_E: Color = Color::rgb(0x49, 0xA8, 0x8F);

const ORANGES: [Color; 5] = [
    ORANGE,
    Color::rgb(0xFF, 0x8C, 0x00),
    Color::rgb(0xFF, 0x63, 0x47),
    Color::rgb(0xFF, 0x45, 0x00),
    Color::rgb(0xDC, 0x14, 0x3C),
];
const VIRIDIS: [Color; 4] = [
    Color::rgb(0x44, 0x01, 0x54),
    Color::rgb(0x31, 0x68, 0x8E),
    Color::rgb(0x35, 0xB7, 0x79),
    Color::rgb(0xFD, 0xE7, 0x24),
];
const PLASMA: [Color; 5] = [
    Color::rgb(0x0D, 0x08, 0x87),
    Color::rgb(0x7E, 0x03, 0xA8),
    Color::rgb(0xCC, 0x47, 0x78),
    Color::rgb(0xF8, 0x95, 0x40),
    Color::rgb(0xF0, 0xF9, 0x21),
];

/// Names accepted by [`ColorScheme::parse_scheme`]
pub const SCHEME_NAMES: [&str; 10] = [
    "blues",
    "reds",
    "greens",
    "purples",
    "oranges",
    "viridis",
    "plasma",
    "warm",
    "cool",
    "diverging",
];

/// Built-in color schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Blues,
    Reds,
    Greens,
    Purples,
    Oranges,
    Viridis,
    Plasma,
    Warm,
    Cool,
    Diverging,
}

impl ColorScheme {
    /// Color stops of the scheme, low to high
    pub fn stops(&self) -> &'static [Color] {
        match self {
            ColorScheme::Blues => &[BLUE_E, BLUE_D, BLUE_C, BLUE_B, BLUE_A],
            ColorScheme::Reds => &[RED_E, RED_D, RED_C, RED_B, RED_A],
            ColorScheme::Greens => &[GREEN_E, GREEN_D, GREEN_C, GREEN_B, GREEN_A],
            ColorScheme::Purples => &[PURPLE_E, PURPLE_D, PURPLE_C, PURPLE_B, PURPLE_A],
            ColorScheme::Oranges => &ORANGES,
            ColorScheme::Viridis => &VIRIDIS,
            ColorScheme::Plasma => &PLASMA,
            ColorScheme::Warm => &[YELLOW_E, YELLOW_C, ORANGE, RED_C, RED_A],
            ColorScheme::Cool => &[BLUE_E, TEAL_E, GREEN_C, GREEN_A],
            ColorScheme::Diverging => &[BLUE_E, BLUE_C, Color::WHITE, RED_C, RED_E],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorScheme::Blues => "blues",
            ColorScheme::Reds => "reds",
            ColorScheme::Greens => "greens",
            ColorScheme::Purples => "purples",
            ColorScheme::Oranges => "oranges",
            ColorScheme::Viridis => "viridis",
            ColorScheme::Plasma => "plasma",
            ColorScheme::Warm => "warm",
            ColorScheme::Cool => "cool",
            ColorScheme::Diverging => "diverging",
        }
    }

    /// Look up a scheme by name (case-insensitive)
    pub fn parse_scheme(name: &str) -> Result<Self> {
        match name.to_lowercase().as_str() {
            "blues" => Ok(ColorScheme::Blues),
            "reds" => Ok(ColorScheme::Reds),
            "greens" => Ok(ColorScheme::Greens),
            "purples" => Ok(ColorScheme::Purples),
            "oranges" => Ok(ColorScheme::Oranges),
            "viridis" => Ok(ColorScheme::Viridis),
            "plasma" => Ok(ColorScheme::Plasma),
            "warm" => Ok(ColorScheme::Warm),
            "cool" => Ok(ColorScheme::Cool),
            "diverging" => Ok(ColorScheme::Diverging),
            _ => Err(GeoAnimError::UnknownColorScheme {
                name: name.to_string(),
                available: SCHEME_NAMES.to_vec(),
            }),
        }
    }

    pub fn ramp(&self) -> ColorRamp {
        ColorRamp::from_builtin(self.stops())
    }
}

impl FromStr for ColorScheme {
    type Err = GeoAnimError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        ColorScheme::parse_scheme(s)
    }
}

/// Either a scheme name or an explicit list of hex colors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemeSource {
    Named(String),
    Colors(Vec<String>),
}

impl SchemeSource {
    /// Resolve to a color ramp, failing on unknown names or bad hex strings
    pub fn resolve(&self) -> Result<ColorRamp> {
        match self {
            SchemeSource::Named(name) => Ok(ColorScheme::parse_scheme(name)?.ramp()),
            SchemeSource::Colors(list) => {
                let colors = list
                    .iter()
                    .map(|c| Color::from_hex(c))
                    .collect::<Result<Vec<_>>>()?;
                ColorRamp::new(colors)
            }
        }
    }

    /// Parse a CLI value: a name, or comma-separated hex colors
    pub fn parse_arg(s: &str) -> Self {
        if s.contains(',') || s.starts_with('#') {
            SchemeSource::Colors(s.split(',').map(|c| c.trim().to_string()).collect())
        } else {
            SchemeSource::Named(s.to_string())
        }
    }
}

impl Default for SchemeSource {
    fn default() -> Self {
        SchemeSource::Named("blues".to_string())
    }
}
