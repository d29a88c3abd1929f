//! Observability subsystem
//!
//! - Structured JSON logging to stderr
//! - Typed lifecycle events
//! - Scope-based begin/complete logging
//! - Per-database operation counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on execution
//! 3. No async or background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use gpaydb::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::CollectionCreated, &[("collection", "users")]);
//!
//! let scope = ObservationScope::new("INIT", &[("database", "gpay_db")]);
//! // ... do work ...
//! scope.complete(&[]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::ObservationScope;

fn event_severity(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event.is_warning() {
        Severity::Warn
    } else if event.is_verbose() {
        Severity::Trace
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event_severity(event), event.as_str(), fields);
}
