//! Observability for the harness
//!
//! - Structured logging (JSON lines on stderr)
//! - Atomic counters reported with every run
//! - Begin/complete scopes around seeding and verification phases
//!
//! # Principles
//!
//! 1. Observability is read-only: it never changes a verdict
//! 2. Synchronous output, no background threads
//! 3. Deterministic field order
//! 4. stdout is reserved for the run report
//!
//! # Usage
//!
//! ```ignore
//! use pushdown_verify::observability::{Logger, Event, MetricsRegistry, ObservationScope};
//!
//! Logger::info("CASE_EXECUTED", &[("rows", "42")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.record_query(42);
//!
//! let scope = ObservationScope::new("SEED");
//! // ... seed ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_with_fields() {
        log_event_with_fields(Event::SplitApplied, &[("regions", "10")]);
    }
}
