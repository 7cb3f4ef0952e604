/// Shared Test Helpers for Cross-Crate Use
///
/// This module provides centralized test utilities that can be used across
/// both the `storefront` and `backend` crates to avoid code duplication.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

// Global counter for truly unique test identifiers across parallel tests
static GLOBAL_TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate a globally unique test identifier that won't conflict across
/// parallel tests.
pub fn generate_unique_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Generate a unique, URL-safe slug for test products.
///
/// Combines a prefix with timestamp + atomic counter so parallel tests
/// never collide on the products.slug unique column.
pub fn generate_unique_slug(prefix: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis();
    let counter = GLOBAL_TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}-{}", prefix, timestamp, counter)
}
