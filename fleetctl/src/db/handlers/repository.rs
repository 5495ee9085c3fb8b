//! Base repository trait for database operations.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

/// Contains the Repository trait.
///
/// A repository is a data access layer for one table. It provides methods for creating,
/// reading, updating, and deleting entities, as well as listing and counting them with simple
/// filters.
use crate::db::errors::{DbError, Result};
use crate::types::Operation;

/// Base repository trait providing common database operations
///
/// This trait has separate associated types for create requests, update requests, and responses.
#[async_trait::async_trait]
pub trait Repository {
    /// The request type for creating entities
    type CreateRequest;

    /// The request type for updating entities
    type UpdateRequest;

    /// The response/DTO type returned by operations
    type Response;

    /// The identifier type for lookups
    type Id: Send + Sync;

    /// The filter type for list operations
    type Filter: Send + Sync;

    /// Create a new entity
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    /// Get an entity by ID
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    /// List entities with filtering and pagination
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;

    /// Count entities matching the filter, ignoring its pagination
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64>;

    /// Delete an entity by ID
    async fn delete(&mut self, id: Self::Id) -> Result<bool>;

    /// Update an entity by ID
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response>;
}

/// A table/column pair that references the entity being deleted, with a label for messages.
pub struct Reference {
    pub table: &'static str,
    pub column: &'static str,
    pub label: &'static str,
}

impl Reference {
    pub const fn new(table: &'static str, column: &'static str, label: &'static str) -> Self {
        Self { table, column, label }
    }
}

/// Count rows that still reference `id` and refuse the delete when any exist.
///
/// Returns [`DbError::ProtectedEntity`] listing every non-zero count, e.g.
/// `referenced by 1 vehicle(s), 3 trip record(s)`.
pub async fn ensure_unreferenced(db: &mut SqliteConnection, entity_type: &str, id: i64, references: &[Reference]) -> Result<()> {
    let mut found = Vec::new();
    for reference in references {
        // Table and column names are compile-time constants, never user input
        let sql = format!("SELECT COUNT(*) FROM {} WHERE {} = ?", reference.table, reference.column);
        let count: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(&mut *db).await?;
        if count > 0 {
            found.push(format!("{count} {}", reference.label));
        }
    }

    if found.is_empty() {
        return Ok(());
    }

    tracing::debug!(entity_type, id, references = ?found, "Refusing delete of referenced entity");
    Err(DbError::ProtectedEntity {
        operation: Operation::Delete,
        reason: format!("referenced by {}; deactivate it instead", found.join(", ")),
        entity_type: entity_type.to_string(),
        entity_id: Some(id.to_string()),
    })
}

/// Lower-cased `%search%` with LIKE wildcards in `search` matched literally (use with `ESCAPE '\\'`).
pub fn like_pattern(search: &str) -> String {
    let mut pattern = String::from("%");
    for c in search.trim().to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Push ` AND (col LIKE ? OR ...)` matching `search` as a substring of any of `columns`.
pub fn push_search(query: &mut QueryBuilder<'_, Sqlite>, columns: &[&str], search: &str) {
    let pattern = like_pattern(search);
    query.push(" AND (");
    for (i, column) in columns.iter().enumerate() {
        if i > 0 {
            query.push(" OR ");
        }
        query.push(column);
        query.push(" LIKE ");
        query.push_bind(pattern.clone());
        query.push(" ESCAPE '\\'");
    }
    query.push(")");
}
