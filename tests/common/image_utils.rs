//! Image utilities for testing.
//!
//! This module provides helper functions for building and checking basemap
//! rasters in tests.

use image::{DynamicImage, GenericImageView, ImageError, Rgba, RgbaImage};
use std::path::Path;

/// Load an image from a file
pub fn load_image(path: &Path) -> Result<DynamicImage, ImageError> {
    image::open(path)
}

/// An image where each pixel encodes its own position: red = x, green = y.
/// Cropping can then be verified from the corner pixels alone.
pub fn coordinate_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 0, 255])
    })
}

/// Position encoded in a pixel of a [`coordinate_image`]
pub fn decode_position(pixel: &Rgba<u8>) -> (u32, u32) {
    (pixel[0] as u32, pixel[1] as u32)
}

/// Assert an image has the expected dimensions
pub fn assert_dimensions(image: &DynamicImage, width: u32, height: u32) {
    let (actual_width, actual_height) = image.dimensions();
    assert_eq!(
        (actual_width, actual_height),
        (width, height),
        "Image dimensions differ: actual = {}x{}, expected = {}x{}",
        actual_width,
        actual_height,
        width,
        height
    );
}
