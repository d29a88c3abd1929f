//! Initializer errors

use thiserror::Error;

use crate::db::DbError;

/// Result type for initializer operations
pub type InitResult<T> = Result<T, InitError>;

#[derive(Debug, Error)]
pub enum InitError {
    /// A plan step failed; nothing after it ran
    #[error("initialization step '{step}' failed: {source}")]
    Step {
        step: String,
        #[source]
        source: DbError,
    },

    /// The active schema version differs from the planned one and the
    /// policy does not upgrade
    #[error("[REJECT] GPAY_INIT_SCHEMA_DRIFT: Collection '{collection}' runs schema '{active}', plan has '{planned}'")]
    SchemaDrift {
        collection: String,
        active: String,
        planned: String,
    },

    #[error("[REJECT] GPAY_INVALID_PLAN: {0}")]
    InvalidPlan(String),
}

impl InitError {
    pub(crate) fn step(step: impl Into<String>) -> impl FnOnce(DbError) -> InitError {
        let step = step.into();
        move |source| InitError::Step { step, source }
    }

    /// Stable error code string; step failures keep the engine's code
    pub fn code(&self) -> &'static str {
        match self {
            InitError::Step { source, .. } => source.code(),
            InitError::SchemaDrift { .. } => "GPAY_INIT_SCHEMA_DRIFT",
            InitError::InvalidPlan(_) => "GPAY_INVALID_PLAN",
        }
    }

    /// Name of the failed step, if the failure came from the engine
    pub fn failed_step(&self) -> Option<&str> {
        match self {
            InitError::Step { step, .. } => Some(step),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_keeps_engine_code() {
        let err = InitError::step("create_collection:users")(DbError::CollectionExists(
            "users".into(),
        ));
        assert_eq!(err.code(), "GPAY_COLLECTION_EXISTS");
        assert_eq!(err.failed_step(), Some("create_collection:users"));
        assert!(err.to_string().contains("create_collection:users"));
    }
}
