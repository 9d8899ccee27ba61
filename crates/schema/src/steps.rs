//! Migration step model - declarative, ordered units of schema work
//!
//! A step pairs an existence check with the statements to run when the
//! target is absent. Plans are fixed, caller-defined sequences; order
//! matters because later steps may reference entities created earlier.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Predicate describing whether a step's target state already exists
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExistenceCheck {
    /// Skip the step when the table exists
    Table(String),
    /// Skip the step when the column exists on the table
    Column { table: String, column: String },
    /// Skip the step when the index exists
    Index(String),
    /// No guard; the statements run on every invocation
    Always,
}

/// One ordered unit of schema or data work
#[derive(Debug, Clone)]
pub struct MigrationStep {
    /// Human-readable name, used in logs and failure reports
    pub name: String,
    /// Existence check evaluated before the statements run
    pub check: ExistenceCheck,
    /// SQL statements applied when the target is absent
    pub statements: Vec<String>,
}

impl MigrationStep {
    /// Step that creates a table, guarded by a table-existence check
    pub fn create_table(table: &str, ddl: impl Into<String>) -> Self {
        Self {
            name: format!("create table {}", table),
            check: ExistenceCheck::Table(table.to_string()),
            statements: vec![ddl.into()],
        }
    }

    /// Step that adds a column, guarded by a column-existence check
    pub fn add_column(table: &str, column: &str, ddl: impl Into<String>) -> Self {
        Self {
            name: format!("add column {}.{}", table, column),
            check: ExistenceCheck::Column {
                table: table.to_string(),
                column: column.to_string(),
            },
            statements: vec![ddl.into()],
        }
    }

    /// Step that creates an index, guarded by an index-existence check
    pub fn create_index(index: &str, ddl: impl Into<String>) -> Self {
        Self {
            name: format!("create index {}", index),
            check: ExistenceCheck::Index(index.to_string()),
            statements: vec![ddl.into()],
        }
    }

    /// Unguarded step; the statements themselves must be idempotent
    pub fn raw(name: impl Into<String>, statements: Vec<String>) -> Self {
        Self {
            name: name.into(),
            check: ExistenceCheck::Always,
            statements,
        }
    }
}

/// A named, ordered sequence of migration steps
#[derive(Debug, Clone, Default)]
pub struct MigrationPlan {
    pub name: String,
    pub steps: Vec<MigrationStep>,
}

impl MigrationPlan {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Append a step, preserving insertion order
    pub fn step(mut self, step: MigrationStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Transaction granularity for a migration run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransactionScope {
    /// One transaction around the whole plan; nothing is visible until
    /// every step succeeded
    #[default]
    PerRun,
    /// Each step commits on its own; earlier commits survive a later failure
    PerStep,
}

/// Result of evaluating one step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepOutcome {
    /// The statements ran
    Applied,
    /// The target already existed
    Skipped,
    /// A statement errored; the run was aborted
    Failed,
}

/// Result of running a migration plan
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Plan name
    pub plan: String,
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Per-step outcomes in execution order
    pub outcomes: Vec<(String, StepOutcome)>,
    /// Number of steps whose statements ran
    pub applied_count: usize,
    /// Number of steps skipped because the target was already present
    pub skipped_count: usize,
    /// Name of the failed step, when the run aborted
    pub failed_step: Option<String>,
    /// Total execution time in milliseconds
    pub execution_time_ms: u128,
}

impl RunReport {
    pub fn new(plan: impl Into<String>) -> Self {
        Self {
            plan: plan.into(),
            started_at: Utc::now(),
            outcomes: Vec::new(),
            applied_count: 0,
            skipped_count: 0,
            failed_step: None,
            execution_time_ms: 0,
        }
    }

    /// Record one step's outcome and update the totals
    pub fn record(&mut self, step: &str, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Applied => self.applied_count += 1,
            StepOutcome::Skipped => self.skipped_count += 1,
            StepOutcome::Failed => self.failed_step = Some(step.to_string()),
        }
        self.outcomes.push((step.to_string(), outcome));
    }

    /// True only when no step failed
    pub fn success(&self) -> bool {
        self.failed_step.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_attach_matching_checks() {
        let step = MigrationStep::create_table("Company", "CREATE TABLE \"Company\" (id TEXT)");
        assert_eq!(step.check, ExistenceCheck::Table("Company".to_string()));
        assert_eq!(step.statements.len(), 1);

        let step = MigrationStep::add_column(
            "Company",
            "companyCode",
            "ALTER TABLE \"Company\" ADD COLUMN \"companyCode\" TEXT",
        );
        assert_eq!(
            step.check,
            ExistenceCheck::Column {
                table: "Company".to_string(),
                column: "companyCode".to_string(),
            }
        );

        let step = MigrationStep::create_index(
            "idx_company_companyCode",
            "CREATE INDEX \"idx_company_companyCode\" ON \"Company\"(\"companyCode\")",
        );
        assert_eq!(
            step.check,
            ExistenceCheck::Index("idx_company_companyCode".to_string())
        );

        let step = MigrationStep::raw("noop", vec!["SELECT 1".to_string()]);
        assert_eq!(step.check, ExistenceCheck::Always);
    }

    #[test]
    fn plans_preserve_insertion_order() {
        let plan = MigrationPlan::new("init")
            .step(MigrationStep::create_table("a", "CREATE TABLE a ()"))
            .step(MigrationStep::create_table("b", "CREATE TABLE b ()"))
            .step(MigrationStep::add_column("a", "c", "ALTER TABLE a ADD COLUMN c TEXT"));

        let names: Vec<&str> = plan.steps.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["create table a", "create table b", "add column a.c"]
        );
        assert_eq!(plan.len(), 3);
        assert!(!plan.is_empty());
    }

    #[test]
    fn report_accounting_tracks_outcomes() {
        let mut report = RunReport::new("init");
        report.record("create table a", StepOutcome::Applied);
        report.record("create table b", StepOutcome::Skipped);
        assert_eq!(report.applied_count, 1);
        assert_eq!(report.skipped_count, 1);
        assert!(report.success());

        report.record("add column a.c", StepOutcome::Failed);
        assert!(!report.success());
        assert_eq!(report.failed_step.as_deref(), Some("add column a.c"));
        assert_eq!(report.outcomes.len(), 3);
    }

    #[test]
    fn reports_serialize_for_structured_output() {
        let mut report = RunReport::new("init");
        report.record("create table a", StepOutcome::Skipped);
        report.record("create table b", StepOutcome::Applied);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["plan"], "init");
        assert_eq!(json["outcomes"][0][1], "skipped");
        assert_eq!(json["outcomes"][1][1], "applied");
        assert_eq!(json["applied_count"], 1);
    }

    #[test]
    fn default_scope_is_per_run() {
        assert_eq!(TransactionScope::default(), TransactionScope::PerRun);
    }
}
