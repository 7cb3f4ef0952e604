pub mod config;

/// Common utilities shared across the watch store services
///
/// This crate provides functionality shared by the storefront core and the
/// backend service, including:
///
/// - Configuration loading
/// - Shared test utilities

// Test helpers module - available for both development and test builds
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

// Re-export commonly used test utilities for easier access
#[cfg(any(test, feature = "test-helpers"))]
pub use test_helpers::{generate_unique_id, generate_unique_slug};
