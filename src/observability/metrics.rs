//! Metrics registry
//!
//! - Counters only
//! - Monotonic increase
//! - Reset only on process start
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters of one schema engine
///
/// All counters use Relaxed atomics; values are exact once all writers
/// have finished.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Schemas loaded successfully, reloads included
    schemas_loaded: AtomicU64,
    /// Schema loads that failed, reloads included
    schema_load_failures: AtomicU64,
    /// Reloads that replaced the active schema
    schema_reloads: AtomicU64,
    /// Documents that validated cleanly
    validations_passed: AtomicU64,
    /// Documents rejected with at least one violation
    validations_failed: AtomicU64,
    /// Violations reported across all rejected documents
    violations_reported: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    // Schema lifecycle

    pub fn increment_schemas_loaded(&self) {
        self.schemas_loaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_schema_load_failures(&self) {
        self.schema_load_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_schema_reloads(&self) {
        self.schema_reloads.fetch_add(1, Ordering::Relaxed);
    }

    // Validation

    pub fn increment_validations_passed(&self) {
        self.validations_passed.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one rejected document and its violation count
    pub fn record_validation_failure(&self, violations: u64) {
        self.validations_failed.fetch_add(1, Ordering::Relaxed);
        self.violations_reported.fetch_add(violations, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            schemas_loaded: self.schemas_loaded.load(Ordering::Relaxed),
            schema_load_failures: self.schema_load_failures.load(Ordering::Relaxed),
            schema_reloads: self.schema_reloads.load(Ordering::Relaxed),
            validations_passed: self.validations_passed.load(Ordering::Relaxed),
            validations_failed: self.validations_failed.load(Ordering::Relaxed),
            violations_reported: self.violations_reported.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub schemas_loaded: u64,
    pub schema_load_failures: u64,
    pub schema_reloads: u64,
    pub validations_passed: u64,
    pub validations_failed: u64,
    pub violations_reported: u64,
}
