//! Error types for schema provisioning operations.

/// Result type alias for schema operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Error types for sequencer, inspector, and seeder operations
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Step '{step}' failed executing `{statement}`: {message}")]
    Statement {
        step: String,
        statement: String,
        message: String,
    },

    #[error("Inspection error: {0}")]
    Inspection(String),

    #[error("Seed error: {0}")]
    Seed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<sqlx::Error> for SchemaError {
    fn from(err: sqlx::Error) -> Self {
        SchemaError::Connection(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_errors_name_the_step_and_sql() {
        let err = SchemaError::Statement {
            step: "create table Company".to_string(),
            statement: "CREATE TABLE \"Company\" (id TEXT)".to_string(),
            message: "syntax error".to_string(),
        };

        let text = err.to_string();
        assert!(text.contains("create table Company"));
        assert!(text.contains("CREATE TABLE \"Company\" (id TEXT)"));
        assert!(text.contains("syntax error"));
    }
}
