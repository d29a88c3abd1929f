//! Applies a bootstrap plan to a server
//!
//! # Sequence (strict order)
//!
//! 1. Select (create) the plan's database
//! 2. Create each collection with its validator
//! 3. Create each collection's indexes
//! 4. Insert seed documents
//! 5. Report
//!
//! The first failing step aborts the run and is returned as
//! `InitError::Step`. Nothing is retried.

use serde::Serialize;

use super::errors::{InitError, InitResult};
use super::gpay::gpay_plan;
use super::plan::{BootstrapPlan, CollectionPlan, RerunPolicy};
use crate::db::{Database, DbError, Server};
use crate::observability::{log_event_with_fields, Event, ObservationScope};

/// Outcome of one initializer run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InitReport {
    pub database: String,
    /// Planned collection names, in plan order
    pub collections: Vec<String>,
    pub collections_created: usize,
    pub collections_existing: usize,
    pub schemas_upgraded: usize,
    pub indexes_created: usize,
    pub indexes_existing: usize,
    pub seeds_inserted: usize,
    pub seeds_skipped: usize,
}

impl InitReport {
    /// The four completion lines printed after a successful run
    pub fn status_lines(&self) -> Vec<String> {
        vec![
            "Database initialization completed successfully!".to_string(),
            format!("Collections created: {}", self.collections.join(", ")),
            "Indexes created for optimal performance".to_string(),
            "Sample data inserted for testing".to_string(),
        ]
    }
}

pub struct SchemaInitializer {
    plan: BootstrapPlan,
    policy: RerunPolicy,
    seed: bool,
}

impl Default for SchemaInitializer {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaInitializer {
    /// Initializer for the GPay plan
    pub fn new() -> Self {
        Self::with_plan(gpay_plan())
    }

    pub fn with_plan(plan: BootstrapPlan) -> Self {
        Self {
            plan,
            policy: RerunPolicy::default(),
            seed: true,
        }
    }

    pub fn policy(mut self, policy: RerunPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Whether seed batches are applied
    pub fn seed(mut self, seed: bool) -> Self {
        self.seed = seed;
        self
    }

    pub fn plan(&self) -> &BootstrapPlan {
        &self.plan
    }

    /// Runs the plan against `server`.
    pub fn initialize(&self, server: &mut Server) -> InitResult<InitReport> {
        let scope = ObservationScope::new(
            "INIT",
            &[
                ("database", &self.plan.database),
                ("policy", self.policy.as_str()),
            ],
        );

        match self.run(server) {
            Ok(report) => {
                let created = report.collections_created.to_string();
                let indexes = report.indexes_created.to_string();
                let seeds = report.seeds_inserted.to_string();
                scope.complete(&[
                    ("collections_created", &created),
                    ("indexes_created", &indexes),
                    ("seeds_inserted", &seeds),
                ]);
                Ok(report)
            }
            Err(e) => {
                scope.fail(&e.to_string());
                Err(e)
            }
        }
    }

    fn run(&self, server: &mut Server) -> InitResult<InitReport> {
        self.plan.validate()?;

        let db = server
            .database(&self.plan.database)
            .map_err(InitError::step("select_database"))?;

        let mut report = InitReport {
            database: self.plan.database.clone(),
            collections: self
                .plan
                .collection_names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            ..InitReport::default()
        };

        if self.policy == RerunPolicy::Strict {
            if let Some(existing) = self.plan.collections.iter().find(|c| db.has_collection(c.name())) {
                return Err(InitError::Step {
                    step: format!("create_collection:{}", existing.name()),
                    source: DbError::CollectionExists(existing.name().to_string()),
                });
            }
        }

        for coll in &self.plan.collections {
            self.apply_collection(db, coll, &mut report)?;
        }

        for coll in &self.plan.collections {
            for spec in &coll.indexes {
                let created = db
                    .create_index(coll.name(), spec.clone())
                    .map_err(InitError::step(format!("create_index:{}.{}", coll.name(), spec.name)))?;
                if created {
                    report.indexes_created += 1;
                } else {
                    report.indexes_existing += 1;
                }
            }
        }

        if self.seed {
            self.apply_seeds(db, &mut report)?;
        }

        Ok(report)
    }

    fn apply_collection(
        &self,
        db: &mut Database,
        coll: &CollectionPlan,
        report: &mut InitReport,
    ) -> InitResult<()> {
        let step = format!("create_collection:{}", coll.name());

        if !db.has_collection(coll.name()) {
            db.create_collection(coll.schema.clone())
                .map_err(InitError::step(step))?;
            report.collections_created += 1;
            return Ok(());
        }

        report.collections_existing += 1;
        let active = db
            .schema(coll.name())
            .map_err(InitError::step(step.as_str()))?
            .schema_version
            .clone();

        if active != coll.schema.schema_version && self.policy != RerunPolicy::Upgrade {
            return Err(InitError::SchemaDrift {
                collection: coll.name().to_string(),
                active,
                planned: coll.schema.schema_version.clone(),
            });
        }

        // Same version: no-op when identical, GPAY_SCHEMA_IMMUTABLE otherwise
        if db
            .set_schema(coll.schema.clone())
            .map_err(InitError::step(step))?
        {
            report.schemas_upgraded += 1;
        }
        Ok(())
    }

    fn apply_seeds(&self, db: &mut Database, report: &mut InitReport) -> InitResult<()> {
        for batch in &self.plan.seeds {
            let step = format!("seed:{}", batch.collection);
            for doc in &batch.documents {
                if let Some(field) = batch.match_field.as_deref() {
                    let value = doc.get(field).cloned().unwrap_or_default();
                    let present = db
                        .find_one(&batch.collection, field, &value)
                        .map_err(InitError::step(step.as_str()))?
                        .is_some();
                    if present {
                        let shown = value.to_string();
                        log_event_with_fields(
                            Event::SeedSkipped,
                            &[
                                ("collection", &batch.collection),
                                ("field", field),
                                ("value", &shown),
                            ],
                        );
                        report.seeds_skipped += 1;
                        continue;
                    }
                }
                db.insert_one(&batch.collection, doc.clone())
                    .map_err(InitError::step(step.as_str()))?;
                report.seeds_inserted += 1;
            }
        }
        Ok(())
    }
}
