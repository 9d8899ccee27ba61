//! Upsert seeder - idempotent data rows keyed on a uniqueness constraint
//!
//! Builds `INSERT ... ON CONFLICT ... DO UPDATE` statements from a
//! declarative record description. Safe to run repeatedly: the same key
//! always ends up as exactly one row carrying the latest supplied values.

use sqlx::PgPool;
use tracing::debug;

use crate::error::{SchemaError, SchemaResult};
use crate::sql::{quote_ident, quote_ident_list};

/// Typed bind value for a seeded column
#[derive(Debug, Clone, PartialEq)]
pub enum SeedValue {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Rendered inline as `CURRENT_TIMESTAMP` rather than bound
    Now,
    Null,
}

impl From<&str> for SeedValue {
    fn from(v: &str) -> Self {
        SeedValue::Text(v.to_string())
    }
}

impl From<String> for SeedValue {
    fn from(v: String) -> Self {
        SeedValue::Text(v)
    }
}

impl From<i64> for SeedValue {
    fn from(v: i64) -> Self {
        SeedValue::Int(v)
    }
}

impl From<i32> for SeedValue {
    fn from(v: i32) -> Self {
        SeedValue::Int(v as i64)
    }
}

impl From<f64> for SeedValue {
    fn from(v: f64) -> Self {
        SeedValue::Float(v)
    }
}

impl From<bool> for SeedValue {
    fn from(v: bool) -> Self {
        SeedValue::Bool(v)
    }
}

#[derive(Debug, Clone)]
struct SeedColumn {
    name: String,
    value: SeedValue,
    update_on_conflict: bool,
}

/// Declarative description of one idempotently seeded row
#[derive(Debug, Clone)]
pub struct SeedRecord {
    table: String,
    key_columns: Vec<String>,
    id_column: String,
    columns: Vec<SeedColumn>,
}

impl SeedRecord {
    /// A record for `table`, keyed on the given unique-constraint columns
    pub fn new(table: &str, key_columns: &[&str]) -> Self {
        Self {
            table: table.to_string(),
            key_columns: key_columns.iter().map(|c| c.to_string()).collect(),
            id_column: "id".to_string(),
            columns: Vec::new(),
        }
    }

    /// Column updated to the supplied value when the key already exists
    pub fn column(mut self, name: &str, value: impl Into<SeedValue>) -> Self {
        self.columns.push(SeedColumn {
            name: name.to_string(),
            value: value.into(),
            update_on_conflict: true,
        });
        self
    }

    /// Column written only on first insert (e.g. `id`, `createdAt`)
    pub fn insert_only(mut self, name: &str, value: impl Into<SeedValue>) -> Self {
        self.columns.push(SeedColumn {
            name: name.to_string(),
            value: value.into(),
            update_on_conflict: false,
        });
        self
    }

    /// Override the identifier column returned by the upsert (default `id`)
    pub fn returning(mut self, id_column: &str) -> Self {
        self.id_column = id_column.to_string();
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn validate(&self) -> SchemaResult<()> {
        if self.columns.is_empty() {
            return Err(SchemaError::Seed(format!(
                "seed record for '{}' has no columns",
                self.table
            )));
        }
        if self.key_columns.is_empty() {
            return Err(SchemaError::Seed(format!(
                "seed record for '{}' has no key columns",
                self.table
            )));
        }
        for key in &self.key_columns {
            let column = self
                .columns
                .iter()
                .find(|c| &c.name == key)
                .ok_or_else(|| {
                    SchemaError::Seed(format!(
                        "key column '{}' has no value in seed record for '{}'",
                        key, self.table
                    ))
                })?;
            // Keys must be bindable: NULL never matches a unique key, and
            // CURRENT_TIMESTAMP has no placeholder to look an id up by
            if matches!(column.value, SeedValue::Now | SeedValue::Null) {
                return Err(SchemaError::Seed(format!(
                    "key column '{}' must carry a bindable value",
                    key
                )));
            }
        }
        Ok(())
    }

    fn is_key(&self, name: &str) -> bool {
        self.key_columns.iter().any(|k| k == name)
    }

    /// Build the upsert statement. Bind placeholders are numbered in column
    /// order, skipping `Now` columns, which render inline.
    pub fn build_sql(&self) -> SchemaResult<String> {
        self.validate()?;

        let mut placeholders = Vec::new();
        let mut next = 1;
        for column in &self.columns {
            match column.value {
                SeedValue::Now => placeholders.push("CURRENT_TIMESTAMP".to_string()),
                _ => {
                    placeholders.push(format!("${}", next));
                    next += 1;
                }
            }
        }

        let names: Vec<String> = self.columns.iter().map(|c| c.name.clone()).collect();
        let insert = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(&self.table)?,
            quote_ident_list(&names)?,
            placeholders.join(", ")
        );

        let updates: SchemaResult<Vec<String>> = self
            .columns
            .iter()
            .filter(|c| c.update_on_conflict && !self.is_key(&c.name))
            .map(|c| {
                let name = quote_ident(&c.name)?;
                Ok(format!("{} = EXCLUDED.{}", name, name))
            })
            .collect();
        let updates = updates?;

        let conflict = if updates.is_empty() {
            format!(
                "ON CONFLICT ({}) DO NOTHING",
                quote_ident_list(&self.key_columns)?
            )
        } else {
            format!(
                "ON CONFLICT ({}) DO UPDATE SET {}",
                quote_ident_list(&self.key_columns)?,
                updates.join(", ")
            )
        };

        Ok(format!(
            "{} {} RETURNING {}",
            insert,
            conflict,
            quote_ident(&self.id_column)?
        ))
    }
}

/// Insert or update exactly one row and return its identifier.
///
/// When every updatable column is part of the key the statement degrades to
/// `DO NOTHING`, and the existing row's identifier is fetched instead.
pub async fn seed(pool: &PgPool, record: &SeedRecord) -> SchemaResult<String> {
    let sql = record.build_sql()?;
    debug!(table = %record.table, "seeding row");

    let mut query = sqlx::query_scalar::<_, String>(&sql);
    for column in &record.columns {
        query = match &column.value {
            SeedValue::Text(v) => query.bind(v),
            SeedValue::Int(v) => query.bind(*v),
            SeedValue::Float(v) => query.bind(*v),
            SeedValue::Bool(v) => query.bind(*v),
            SeedValue::Now => query,
            SeedValue::Null => query.bind(Option::<String>::None),
        };
    }
    let id = query
        .fetch_optional(pool)
        .await
        .map_err(|e| SchemaError::Seed(format!("upsert into '{}' failed: {}", record.table, e)))?;

    match id {
        Some(id) => Ok(id),
        // DO NOTHING on conflict returns no row
        None => fetch_existing_id(pool, record).await,
    }
}

async fn fetch_existing_id(pool: &PgPool, record: &SeedRecord) -> SchemaResult<String> {
    let conditions: SchemaResult<Vec<String>> = record
        .key_columns
        .iter()
        .enumerate()
        .map(|(i, key)| Ok(format!("{} = ${}", quote_ident(key)?, i + 1)))
        .collect();

    let sql = format!(
        "SELECT {} FROM {} WHERE {}",
        quote_ident(&record.id_column)?,
        quote_ident(&record.table)?,
        conditions?.join(" AND ")
    );

    let mut query = sqlx::query_scalar::<_, String>(&sql);
    for key in &record.key_columns {
        let column = record
            .columns
            .iter()
            .find(|c| &c.name == key)
            .ok_or_else(|| {
                SchemaError::Seed(format!("key column '{}' has no value", key))
            })?;
        query = match &column.value {
            SeedValue::Text(v) => query.bind(v),
            SeedValue::Int(v) => query.bind(*v),
            SeedValue::Float(v) => query.bind(*v),
            SeedValue::Bool(v) => query.bind(*v),
            SeedValue::Now | SeedValue::Null => query,
        };
    }

    query
        .fetch_one(pool)
        .await
        .map_err(|e| SchemaError::Seed(format!("lookup in '{}' failed: {}", record.table, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_upsert_with_excluded_assignments() {
        let record = SeedRecord::new("Company", &["email"])
            .insert_only("id", "demo-company-id")
            .column("name", "Demo Company")
            .column("email", "demo@usde.com")
            .column("balance", 5000.0);

        assert_eq!(
            record.build_sql().unwrap(),
            "INSERT INTO \"Company\" (\"id\", \"name\", \"email\", \"balance\") \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (\"email\") DO UPDATE SET \
             \"name\" = EXCLUDED.\"name\", \"balance\" = EXCLUDED.\"balance\" \
             RETURNING \"id\""
        );
    }

    #[test]
    fn now_columns_render_inline_and_skip_placeholders() {
        let record = SeedRecord::new("Role", &["id"])
            .column("id", "role_admin")
            .column("name", "ADMIN")
            .column("createdAt", SeedValue::Now)
            .column("updatedAt", SeedValue::Now);

        let sql = record.build_sql().unwrap();
        assert!(sql.contains("VALUES ($1, $2, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)"));
        assert!(sql.contains("\"updatedAt\" = EXCLUDED.\"updatedAt\""));
        // Key column never appears in the update set
        assert!(!sql.contains("\"id\" = EXCLUDED"));
    }

    #[test]
    fn degrades_to_do_nothing_without_updatable_columns() {
        let record = SeedRecord::new("UserRole", &["id"])
            .column("id", "ur-1")
            .insert_only("userId", "demo-company-id")
            .insert_only("roleId", "role_admin");

        let sql = record.build_sql().unwrap();
        assert!(sql.contains("ON CONFLICT (\"id\") DO NOTHING"));
        assert!(sql.ends_with("RETURNING \"id\""));
    }

    #[test]
    fn rejects_key_without_value() {
        let record = SeedRecord::new("Company", &["email"]).column("name", "Demo");
        assert!(record.build_sql().is_err());
    }

    #[test]
    fn rejects_unbindable_keys_and_empty_records() {
        let record = SeedRecord::new("Company", &["createdAt"]).column("createdAt", SeedValue::Now);
        assert!(record.build_sql().is_err());

        let record = SeedRecord::new("Company", &["email"])
            .column("email", SeedValue::Null)
            .column("name", "Demo");
        assert!(record.build_sql().is_err());

        let record = SeedRecord::new("Company", &["email"]);
        assert!(record.build_sql().is_err());
    }

    #[test]
    fn returning_column_is_configurable() {
        let record = SeedRecord::new("Enterprise", &["adminId"])
            .column("adminId", "demo-company-id")
            .column("name", "Demo Enterprise")
            .returning("adminId");

        assert!(record.build_sql().unwrap().ends_with("RETURNING \"adminId\""));
    }
}
