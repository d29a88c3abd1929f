//! Observable lifecycle events
//!
//! Events are explicit and typed; their string form is the `event` field of
//! the log line.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    ConfigLoaded,

    // Server lifecycle
    ServerOpened,
    ServerClosed,

    // Database open
    SchemasLoaded,
    StorageReplayed,
    IndexesRebuilt,
    DatabaseOpened,
    /// Record file failed checksum or framing (FATAL)
    DataCorruption,

    // Catalog changes
    CollectionCreated,
    IndexCreated,
    SchemaUpgraded,

    // Writes
    DocumentInserted,
    DocumentDeleted,
    WriteRejected,

    // Initialization
    SeedSkipped,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::ServerOpened => "SERVER_OPENED",
            Event::ServerClosed => "SERVER_CLOSED",

            Event::SchemasLoaded => "SCHEMAS_LOADED",
            Event::StorageReplayed => "STORAGE_REPLAYED",
            Event::IndexesRebuilt => "INDEXES_REBUILT",
            Event::DatabaseOpened => "DATABASE_OPENED",
            Event::DataCorruption => "DATA_CORRUPTION",

            Event::CollectionCreated => "COLLECTION_CREATED",
            Event::IndexCreated => "INDEX_CREATED",
            Event::SchemaUpgraded => "SCHEMA_UPGRADED",

            Event::DocumentInserted => "DOCUMENT_INSERTED",
            Event::DocumentDeleted => "DOCUMENT_DELETED",
            Event::WriteRejected => "WRITE_REJECTED",

            Event::SeedSkipped => "SEED_SKIPPED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::DataCorruption)
    }

    /// Rejections are logged at WARN, routine events at INFO or TRACE
    pub fn is_warning(&self) -> bool {
        matches!(self, Event::WriteRejected)
    }

    /// High-volume events logged at TRACE
    pub fn is_verbose(&self) -> bool {
        matches!(self, Event::DocumentInserted | Event::DocumentDeleted)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_upper_snake() {
        let events = [
            Event::ConfigLoaded,
            Event::ServerOpened,
            Event::ServerClosed,
            Event::SchemasLoaded,
            Event::StorageReplayed,
            Event::IndexesRebuilt,
            Event::DatabaseOpened,
            Event::DataCorruption,
            Event::CollectionCreated,
            Event::IndexCreated,
            Event::SchemaUpgraded,
            Event::DocumentInserted,
            Event::DocumentDeleted,
            Event::WriteRejected,
            Event::SeedSkipped,
        ];

        for event in events {
            let s = event.as_str();
            assert!(!s.is_empty());
            assert!(s.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_fatal_events() {
        assert!(Event::DataCorruption.is_fatal());
        assert!(!Event::WriteRejected.is_fatal());
        assert!(Event::WriteRejected.is_warning());
    }
}
