//! ObservationScope for automatic begin/complete logging
//!
//! - Logs `{name}_BEGIN` on creation
//! - Logs `{name}_COMPLETE` or `{name}_FAILED` when finished explicitly
//! - Logs `{name}_INCOMPLETE` on drop if neither happened (early return, panic)

use std::time::Instant;

use super::logger::{Logger, Severity};

/// A scope that logs the lifecycle of one multi-step operation
///
/// # Usage
///
/// ```ignore
/// let scope = ObservationScope::new("INIT", &[("database", "gpay_db")]);
/// // ... do work ...
/// scope.complete(&[("collections", "4")]); // logs INIT_COMPLETE
/// ```
///
/// Fields given at creation are repeated on every later line, and the final
/// line carries `elapsed_ms`.
pub struct ObservationScope {
    name: String,
    fields: Vec<(String, String)>,
    started: Instant,
    finished: bool,
}

impl ObservationScope {
    /// Create a new observation scope and log `{name}_BEGIN`.
    pub fn new(name: impl Into<String>, fields: &[(&str, &str)]) -> Self {
        let scope = Self {
            name: name.into(),
            fields: fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            started: Instant::now(),
            finished: false,
        };
        scope.emit(Severity::Info, "BEGIN", &[]);
        scope
    }

    /// Logs `{name}_COMPLETE` at INFO level.
    pub fn complete(mut self, extra: &[(&str, &str)]) {
        self.finished = true;
        let elapsed = self.elapsed_ms();
        let mut fields = extra.to_vec();
        fields.push(("elapsed_ms", elapsed.as_str()));
        self.emit(Severity::Info, "COMPLETE", &fields);
    }

    /// Logs `{name}_FAILED` at ERROR level.
    pub fn fail(mut self, reason: &str) {
        self.finished = true;
        let elapsed = self.elapsed_ms();
        self.emit(Severity::Error, "FAILED", &[("reason", reason), ("elapsed_ms", elapsed.as_str())]);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn elapsed_ms(&self) -> String {
        self.started.elapsed().as_millis().to_string()
    }

    fn emit(&self, severity: Severity, suffix: &str, extra: &[(&str, &str)]) {
        let event = format!("{}_{}", self.name, suffix);
        let mut fields: Vec<(&str, &str)> = self
            .fields
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        fields.extend_from_slice(extra);
        Logger::log(severity, &event, &fields);
    }
}

impl Drop for ObservationScope {
    fn drop(&mut self) {
        if !self.finished {
            self.emit(
                Severity::Warn,
                "INCOMPLETE",
                &[("reason", "scope dropped without completion")],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_complete() {
        let scope = ObservationScope::new("TEST", &[("key", "value")]);
        assert_eq!(scope.name(), "TEST");
        scope.complete(&[("result", "success")]);
    }

    #[test]
    fn test_scope_fail() {
        let scope = ObservationScope::new("TEST", &[]);
        scope.fail("something went wrong");
    }

    #[test]
    fn test_scope_drop_without_complete() {
        let scope = ObservationScope::new("TEST", &[]);
        drop(scope);
    }
}
