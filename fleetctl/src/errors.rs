use crate::db::errors::DbError;
use crate::legacy::LegacyError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum Error {
    /// Invalid request data or business rule violation
    #[error("{message}")]
    BadRequest { message: String },

    /// Requested resource not found
    #[error("{resource} with ID {id} not found")]
    NotFound { resource: String, id: String },

    /// Conflict with existing state, e.g. duplicate codes
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// Upload exceeded the configured size
    #[error("{message}")]
    PayloadTooLarge { message: String },

    /// An optional integration (legacy database, mapping API) is not configured
    #[error("{service} is not configured")]
    ServiceUnavailable { service: String },

    /// Generic internal service error
    #[error("Failed to {operation}")]
    Internal { operation: String },

    /// Database operation error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Legacy master-data system error (after retries)
    #[error(transparent)]
    Legacy(#[from] LegacyError),

    /// Unexpected error with full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Error::BadRequest { message: message.into() }
    }

    pub fn not_found(resource: &str, id: impl ToString) -> Self {
        Error::NotFound {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            Error::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            Error::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Error::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::Database(db_err) => match db_err {
                DbError::NotFound => StatusCode::NOT_FOUND,
                DbError::UniqueViolation { .. } => StatusCode::CONFLICT,
                DbError::ForeignKeyViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::CheckViolation { .. } => StatusCode::BAD_REQUEST,
                DbError::ProtectedEntity { .. } => StatusCode::CONFLICT,
                DbError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Error::Legacy(_) => StatusCode::BAD_GATEWAY,
            Error::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns a user-safe error message, without leaking internal implementation details
    pub fn user_message(&self) -> String {
        match self {
            Error::BadRequest { message } => message.clone(),
            Error::NotFound { resource, id } => format!("{resource} with ID {id} not found"),
            Error::Conflict { message } => message.clone(),
            Error::PayloadTooLarge { message } => message.clone(),
            Error::ServiceUnavailable { service } => format!("{service} is not configured"),
            Error::Internal { .. } => "Internal server error".to_string(),
            Error::Database(db_err) => match db_err {
                DbError::NotFound => "Resource not found".to_string(),
                DbError::UniqueViolation { table, column, .. } => match (table.as_deref(), column.as_deref()) {
                    (Some("customers"), Some("code")) => "A customer with this code already exists".to_string(),
                    (Some("drivers"), Some("code")) => "A driver with this code already exists".to_string(),
                    (Some("vehicles"), Some("plate_number")) => "A vehicle with this plate number already exists".to_string(),
                    (Some("items"), Some("code")) => "An item with this code already exists".to_string(),
                    (Some("subcontractors"), Some("code")) => "A subcontractor with this code already exists".to_string(),
                    _ => "Resource already exists".to_string(),
                },
                DbError::ForeignKeyViolation { .. } => "Invalid reference to related resource".to_string(),
                DbError::CheckViolation { .. } => "Invalid data provided".to_string(),
                DbError::ProtectedEntity { .. } => db_err.to_string(),
                DbError::Other(_) => "Database error occurred".to_string(),
            },
            Error::Legacy(_) => "Legacy master-data system is unavailable".to_string(),
            Error::Other(_) => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Database(DbError::Other(_)) | Error::Internal { .. } | Error::Other(_) | Error::Legacy(_) => {
                tracing::error!("Internal service error: {:#}", self);
            }
            Error::Database(_) => {
                tracing::warn!("Database constraint error: {}", self);
            }
            Error::Conflict { .. } | Error::ServiceUnavailable { .. } => {
                tracing::warn!("{}", self);
            }
            Error::BadRequest { .. } | Error::NotFound { .. } | Error::PayloadTooLarge { .. } => {
                tracing::debug!("Client error: {}", self);
            }
        }

        let status = self.status_code();
        let body = json!({
            "error": {
                "status": status.as_u16(),
                "message": self.user_message(),
            }
        });

        (status, Json(body)).into_response()
    }
}

/// Convert from String errors (e.g., from external functions)
impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Internal { operation: msg }
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_is_conflict_with_friendly_message() {
        let err = Error::Database(DbError::UniqueViolation {
            table: Some("customers".to_string()),
            column: Some("code".to_string()),
            message: "UNIQUE constraint failed: customers.code".to_string(),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.user_message(), "A customer with this code already exists");
    }

    #[test]
    fn test_protected_entity_is_conflict() {
        let err = Error::Database(DbError::ProtectedEntity {
            operation: crate::types::Operation::Delete,
            reason: "referenced by 2 vehicle(s)".to_string(),
            entity_type: "driver".to_string(),
            entity_id: Some("1".to_string()),
        });
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(err.user_message(), "Cannot delete driver: referenced by 2 vehicle(s)");
    }

    #[test]
    fn test_internal_errors_do_not_leak_details() {
        let err = Error::Other(anyhow::anyhow!("connection refused at 10.0.0.3"));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Internal server error");
    }
}
