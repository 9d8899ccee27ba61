//! Schema inspection - capability trait and Postgres implementation
//!
//! The old scripts each hand-rolled their own information-schema queries;
//! this trait is the one place those checks live now. Checks take the
//! current connection so a transactional run sees its own uncommitted DDL.

use async_trait::async_trait;
use sqlx::PgConnection;

use crate::error::{SchemaError, SchemaResult};

/// Existence checks against a relational store, implemented per dialect
#[async_trait]
pub trait SchemaInspector: Send + Sync {
    async fn has_table(&self, conn: &mut PgConnection, table: &str) -> SchemaResult<bool>;

    async fn has_column(
        &self,
        conn: &mut PgConnection,
        table: &str,
        column: &str,
    ) -> SchemaResult<bool>;

    async fn has_index(&self, conn: &mut PgConnection, index: &str) -> SchemaResult<bool>;
}

/// Inspector for PostgreSQL, scoped to one schema (`public` by default)
pub struct PostgresInspector {
    schema: String,
}

impl PostgresInspector {
    pub fn new() -> Self {
        Self {
            schema: "public".to_string(),
        }
    }

    pub fn with_schema(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
        }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }
}

impl Default for PostgresInspector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SchemaInspector for PostgresInspector {
    async fn has_table(&self, conn: &mut PgConnection, table: &str) -> SchemaResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.tables
                WHERE table_schema = $1 AND table_name = $2
            )",
        )
        .bind(&self.schema)
        .bind(table)
        .fetch_one(conn)
        .await
        .map_err(|e| SchemaError::Inspection(format!("table check for '{}' failed: {}", table, e)))
    }

    async fn has_column(
        &self,
        conn: &mut PgConnection,
        table: &str,
        column: &str,
    ) -> SchemaResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM information_schema.columns
                WHERE table_schema = $1 AND table_name = $2 AND column_name = $3
            )",
        )
        .bind(&self.schema)
        .bind(table)
        .bind(column)
        .fetch_one(conn)
        .await
        .map_err(|e| {
            SchemaError::Inspection(format!(
                "column check for '{}.{}' failed: {}",
                table, column, e
            ))
        })
    }

    async fn has_index(&self, conn: &mut PgConnection, index: &str) -> SchemaResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (
                SELECT 1 FROM pg_indexes
                WHERE schemaname = $1 AND indexname = $2
            )",
        )
        .bind(&self.schema)
        .bind(index)
        .fetch_one(conn)
        .await
        .map_err(|e| SchemaError::Inspection(format!("index check for '{}' failed: {}", index, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_public_schema() {
        assert_eq!(PostgresInspector::new().schema(), "public");
        assert_eq!(PostgresInspector::with_schema("audit").schema(), "audit");
    }
}
