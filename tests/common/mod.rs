//! Common test utilities for geoanim.
//!
//! This module provides shared fixtures and assertions for the pipeline tests.

// Re-export all common test utilities
pub mod assertions;
pub mod image_utils;
pub mod test_data;
