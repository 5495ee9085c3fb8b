//! HTTP request handlers for all API endpoints.
//!
//! Axum route handlers organized by resource type. Each handler:
//! - deserializes and validates the request
//! - runs it through a database repository, or the legacy/mapping integrations
//! - serializes the response
//!
//! # Handler Modules
//!
//! - [`customers`]: Customer CRUD, bulk delete and the legacy import
//! - [`subcontractors`], [`drivers`], [`vehicles`], [`items`]: Master-data CRUD
//! - [`trip_records`]: Trips, with distance and rate defaults
//! - [`fuel_records`]: Fuel purchases
//! - [`evaluations`]: Evaluation CRUD plus monthly scores and summaries
//! - [`legacy`]: Read-only preview of legacy customers
//! - [`rates`]: Distance-rate table lookup
//! - [`reports`]: PDF downloads
//! - [`uploads`]: Image upload and serving
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`], which converts to the matching HTTP status and a
//! JSON error envelope.

pub mod customers;
pub mod drivers;
pub mod evaluations;
pub mod fuel_records;
pub mod items;
pub mod legacy;
pub mod rates;
pub mod reports;
pub mod subcontractors;
pub mod trip_records;
pub mod uploads;
pub mod vehicles;

use crate::db::errors::DbError;
use crate::errors::Error;

/// Map a repository `NotFound` from an update to a 404 naming the resource.
pub(crate) fn missing_as_not_found(resource: &'static str, id: i64) -> impl FnOnce(DbError) -> Error {
    move |e| match e {
        DbError::NotFound => Error::not_found(resource, id),
        other => Error::Database(other),
    }
}
