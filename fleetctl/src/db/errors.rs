use crate::types::Operation;
use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        table: Option<String>,
        column: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation { message: String },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation { message: String },

    /// Entity cannot be modified or deleted because other rows still reference it.
    /// Raised by the repositories' reference-count guards, not by the schema.
    #[error("Cannot {operation} {entity_type}: {reason}")]
    ProtectedEntity {
        operation: Operation,
        reason: String,
        entity_type: String,
        entity_id: Option<String>,
    },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convert from sqlx::Error using sqlx's error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    let (table, column) = match extract_unique_target(db_err.message()) {
                        Some((table, column)) => (Some(table), Some(column)),
                        None => (None, None),
                    };
                    DbError::UniqueViolation {
                        table,
                        column,
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        message: db_err.message().to_string(),
                    }
                } else {
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Extract `(table, column)` from a SQLite unique violation message.
///
/// SQLite reports neither constraint nor table through the driver, only text such as
/// `UNIQUE constraint failed: customers.code`. Composite keys list several columns; the first
/// one is returned.
fn extract_unique_target(message: &str) -> Option<(String, String)> {
    let (_, target) = message.split_once("failed: ")?;
    let first = target.split(',').next()?.trim();
    let (table, column) = first.split_once('.')?;
    Some((table.to_string(), column.to_string()))
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_unique_target() {
        assert_eq!(
            extract_unique_target("UNIQUE constraint failed: customers.code"),
            Some(("customers".to_string(), "code".to_string()))
        );
        assert_eq!(
            extract_unique_target("UNIQUE constraint failed: a.x, a.y"),
            Some(("a".to_string(), "x".to_string()))
        );
        assert_eq!(extract_unique_target("something else"), None);
    }
}
