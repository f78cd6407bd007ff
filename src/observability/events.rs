//! Observable events
//!
//! Events are explicit and typed. Each carries the severity it is logged at.

use std::fmt;

use super::logger::Severity;

/// Observable events of the schema engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Configuration file loaded
    ConfigLoaded,

    // Schema lifecycle
    /// Schema load started
    SchemaLoadBegin,
    /// Schema loaded and resolved
    SchemaLoadComplete,
    /// Schema rejected at load
    SchemaLoadFailed,
    /// A new schema replaced the active one
    SchemaReloaded,
    /// A reload failed; the active schema was kept
    SchemaReloadRejected,
    /// An `override` slot had nothing to override
    SlotOverrideUnmatched,

    // Resolution
    /// An induced view was computed and memoized
    InducedViewComputed,

    // Validation
    /// A document validated cleanly
    ValidationComplete,
    /// A document failed validation
    ValidationRejected,
}

impl Event {
    /// Returns the string representation for logging
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::SchemaLoadBegin => "SCHEMA_LOAD_BEGIN",
            Event::SchemaLoadComplete => "SCHEMA_LOAD_COMPLETE",
            Event::SchemaLoadFailed => "SCHEMA_LOAD_FAILED",
            Event::SchemaReloaded => "SCHEMA_RELOADED",
            Event::SchemaReloadRejected => "SCHEMA_RELOAD_REJECTED",
            Event::SlotOverrideUnmatched => "SLOT_OVERRIDE_UNMATCHED",
            Event::InducedViewComputed => "INDUCED_VIEW_COMPUTED",
            Event::ValidationComplete => "VALIDATION_COMPLETE",
            Event::ValidationRejected => "VALIDATION_REJECTED",
        }
    }

    /// Severity the event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::SchemaLoadFailed => Severity::Error,
            Event::SchemaReloadRejected | Event::SlotOverrideUnmatched => Severity::Warn,
            Event::InducedViewComputed
            | Event::ValidationComplete
            | Event::ValidationRejected => Severity::Trace,
            Event::ConfigLoaded
            | Event::SchemaLoadBegin
            | Event::SchemaLoadComplete
            | Event::SchemaReloaded => Severity::Info,
        }
    }

    /// No schema event stops the process
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
