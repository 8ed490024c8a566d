//! Assertion utilities for testing.
//!
//! This module provides helper functions for making assertions in tests,
//! particularly for floating-point and drawing-space comparisons.

use geoanim::geo::{DrawPoint, DrawingExtent};
use geoanim::Primitive;

/// Default epsilon for floating-point comparisons
pub const DEFAULT_EPSILON: f64 = 1e-9;

/// Assert that two floating-point values are approximately equal.
///
/// # Panics
///
/// Panics if the absolute difference between `actual` and `expected` is greater than `epsilon`.
pub fn assert_approx_eq(actual: f64, expected: f64, epsilon: Option<f64>) {
    let epsilon = epsilon.unwrap_or(DEFAULT_EPSILON);
    let diff = (actual - expected).abs();

    assert!(
        diff <= epsilon,
        "Values not approximately equal: actual = {}, expected = {}, diff = {}, epsilon = {}",
        actual,
        expected,
        diff,
        epsilon
    );
}

/// Assert that two drawing-space points coincide
pub fn assert_point_approx_eq(actual: DrawPoint, expected: DrawPoint, epsilon: Option<f64>) {
    assert_approx_eq(actual.x, expected.x, epsilon);
    assert_approx_eq(actual.y, expected.y, epsilon);
}

/// Assert that every vertex of every primitive lies inside the extent
/// (centered on the origin), allowing `slack` drawing units beyond the edge.
pub fn assert_within_extent(primitives: &[Primitive], extent: &DrawingExtent, slack: f64) {
    let hw = extent.width / 2.0 + slack;
    let hh = extent.height / 2.0 + slack;
    for (i, primitive) in primitives.iter().enumerate() {
        for p in primitive.vertices() {
            assert!(
                p.x.abs() <= hw && p.y.abs() <= hh,
                "Primitive {} has vertex ({}, {}) outside {}x{}",
                i,
                p.x,
                p.y,
                extent.width,
                extent.height
            );
        }
    }
}
