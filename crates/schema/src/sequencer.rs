//! Migration sequencer - applies step plans against the database
//!
//! Evaluates each step's existence check on the live connection, runs the
//! statements for absent targets, and honors the configured transaction
//! scope: one transaction around the whole plan, or one per step.

use sqlx::postgres::PgPoolOptions;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info, warn};

use crate::error::{SchemaError, SchemaResult};
use crate::inspector::{PostgresInspector, SchemaInspector};
use crate::seeder::{self, SeedRecord};
use crate::steps::{
    ExistenceCheck, MigrationPlan, MigrationStep, RunReport, StepOutcome, TransactionScope,
};

/// Sequencer that applies migration plans exactly once each
pub struct MigrationSequencer {
    pool: PgPool,
    inspector: Box<dyn SchemaInspector>,
    scope: TransactionScope,
}

impl MigrationSequencer {
    /// Create a sequencer over an existing pool, with the Postgres
    /// inspector and per-run transaction scope
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            inspector: Box::new(PostgresInspector::new()),
            scope: TransactionScope::default(),
        }
    }

    /// Create a sequencer from a database URL
    pub async fn connect(database_url: &str) -> SchemaResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .map_err(|e| {
                SchemaError::Connection(format!("failed to connect to database: {}", e))
            })?;

        Ok(Self::new(pool))
    }

    /// Replace the schema inspector (e.g. a non-default schema)
    pub fn with_inspector(mut self, inspector: Box<dyn SchemaInspector>) -> Self {
        self.inspector = inspector;
        self
    }

    /// Set the transaction granularity for subsequent runs
    pub fn with_scope(mut self, scope: TransactionScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn scope(&self) -> TransactionScope {
        self.scope
    }

    /// Apply all steps of a plan in order.
    ///
    /// Steps whose target already exists are skipped. On the first statement
    /// failure the run aborts: uncommitted work in the current transaction
    /// scope is rolled back, later steps are not attempted, and the error
    /// names the failed step together with the database message.
    pub async fn run(&self, plan: &MigrationPlan) -> SchemaResult<RunReport> {
        info!(plan = %plan.name, steps = plan.len(), scope = ?self.scope, "starting migration run");
        let report = match self.scope {
            TransactionScope::PerRun => self.run_single_transaction(plan).await?,
            TransactionScope::PerStep => self.run_per_step(plan).await?,
        };
        info!(
            plan = %plan.name,
            applied = report.applied_count,
            skipped = report.skipped_count,
            elapsed_ms = report.execution_time_ms as u64,
            "migration run complete"
        );
        Ok(report)
    }

    /// Insert or update one row on this sequencer's pool
    pub async fn seed(&self, record: &SeedRecord) -> SchemaResult<String> {
        seeder::seed(&self.pool, record).await
    }

    async fn run_single_transaction(&self, plan: &MigrationPlan) -> SchemaResult<RunReport> {
        let start = std::time::Instant::now();
        let mut report = RunReport::new(&plan.name);

        let mut tx = self.pool.begin().await.map_err(|e| {
            SchemaError::Connection(format!("failed to start transaction: {}", e))
        })?;

        for step in &plan.steps {
            match self.execute_step(&mut tx, step).await {
                Ok(outcome) => report.record(&step.name, outcome),
                Err(err) => {
                    report.record(&step.name, StepOutcome::Failed);
                    if let Err(rb) = tx.rollback().await {
                        warn!(error = %rb, "rollback after failed step also failed");
                    }
                    return Err(err);
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| SchemaError::Connection(format!("failed to commit run: {}", e)))?;

        report.execution_time_ms = start.elapsed().as_millis();
        Ok(report)
    }

    async fn run_per_step(&self, plan: &MigrationPlan) -> SchemaResult<RunReport> {
        let start = std::time::Instant::now();
        let mut report = RunReport::new(&plan.name);

        for step in &plan.steps {
            let mut tx = self.pool.begin().await.map_err(|e| {
                SchemaError::Connection(format!("failed to start transaction: {}", e))
            })?;

            match self.execute_step(&mut tx, step).await {
                Ok(outcome) => {
                    tx.commit().await.map_err(|e| {
                        SchemaError::Connection(format!(
                            "failed to commit step '{}': {}",
                            step.name, e
                        ))
                    })?;
                    report.record(&step.name, outcome);
                }
                Err(err) => {
                    report.record(&step.name, StepOutcome::Failed);
                    if let Err(rb) = tx.rollback().await {
                        warn!(error = %rb, "rollback after failed step also failed");
                    }
                    return Err(err);
                }
            }
        }

        report.execution_time_ms = start.elapsed().as_millis();
        Ok(report)
    }

    async fn execute_step(
        &self,
        conn: &mut PgConnection,
        step: &MigrationStep,
    ) -> SchemaResult<StepOutcome> {
        if self.target_exists(&mut *conn, &step.check).await? {
            debug!(step = %step.name, "target already present, skipping");
            return Ok(StepOutcome::Skipped);
        }

        for sql in &step.statements {
            sqlx::query(sql)
                .execute(&mut *conn)
                .await
                .map_err(|e| SchemaError::Statement {
                    step: step.name.clone(),
                    statement: sql.clone(),
                    message: e.to_string(),
                })?;
        }

        info!(step = %step.name, "applied");
        Ok(StepOutcome::Applied)
    }

    async fn target_exists(
        &self,
        conn: &mut PgConnection,
        check: &ExistenceCheck,
    ) -> SchemaResult<bool> {
        match check {
            ExistenceCheck::Table(table) => self.inspector.has_table(conn, table).await,
            ExistenceCheck::Column { table, column } => {
                self.inspector.has_column(conn, table, column).await
            }
            ExistenceCheck::Index(index) => self.inspector.has_index(conn, index).await,
            ExistenceCheck::Always => Ok(false),
        }
    }
}
