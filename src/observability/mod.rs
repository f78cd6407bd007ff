//! Observability subsystem
//!
//! - Structured logging (JSON lines on stderr)
//! - Counters for schema loads and validations
//! - Lifecycle scopes for multi-step operations
//!
//! Observability is read-only: nothing here changes the outcome of a load or
//! a validation, and a failed log write is ignored.
//!
//! ```ignore
//! use mmschema::observability::{log_event_with_fields, Event, Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Info);
//! log_event_with_fields(Event::SchemaReloaded, &[("schema", "microscopy_core")]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

/// Log a lifecycle event at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
