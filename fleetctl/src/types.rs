//! Common type definitions.
//!
//! # ID Types
//!
//! All entity IDs are SQLite `INTEGER PRIMARY KEY` rowids wrapped in type aliases
//! so signatures say which table an ID belongs to:
//!
//! - [`CustomerId`], [`DriverId`], [`VehicleId`], [`ItemId`], [`SubcontractorId`]
//! - [`TripRecordId`], [`FuelRecordId`], [`EvaluationId`]
//!
//! # Operations
//!
//! [`Operation`] names what was attempted on an entity. It is carried by
//! [`crate::db::errors::DbError::ProtectedEntity`] so a refused delete can say what was refused.

use serde::{Deserialize, Serialize};
use std::fmt;

// Type aliases for IDs
pub type CustomerId = i64;
pub type DriverId = i64;
pub type VehicleId = i64;
pub type ItemId = i64;
pub type SubcontractorId = i64;
pub type TripRecordId = i64;
pub type FuelRecordId = i64;
pub type EvaluationId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Create => write!(f, "create"),
            Operation::Update => write!(f, "update"),
            Operation::Delete => write!(f, "delete"),
        }
    }
}

/// Active-flag filter used by every master-data list endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Active,
    Inactive,
    #[default]
    All,
}

impl StatusFilter {
    /// The `is_active` value to filter on, or `None` for no filter.
    pub fn is_active(&self) -> Option<bool> {
        match self {
            StatusFilter::Active => Some(true),
            StatusFilter::Inactive => Some(false),
            StatusFilter::All => None,
        }
    }
}

/// Normalise a user-entered master-data code: trimmed and upper-cased.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
