//! API request and response data models.
//!
//! These are the HTTP contract: request bodies, query parameters and response payloads. They are
//! distinct from the row types in [`crate::db::models`] so storage and API can change
//! independently. Every model derives `utoipa` schemas for the generated docs.
//!
//! # Model Categories
//!
//! ## Master data
//!
//! - [`customers`]: Customers, bulk delete payloads
//! - [`subcontractors`], [`drivers`], [`vehicles`], [`items`]
//!
//! ## Operations
//!
//! - [`trip_records`]: Delivery trips with distance, rate and expenses
//! - [`fuel_records`]: Fuel purchases
//! - [`evaluations`]: Subcontractor evaluations, monthly scores and summaries
//!
//! ## Supporting
//!
//! - [`pagination`]: Shared `page`/`limit` parameters and the paginated envelope
//! - [`validation`]: Field checks shared by the create/update models
//! - [`imports`]: Legacy customer import request and tally
//! - [`rates`], [`reports`], [`uploads`]

pub mod customers;
pub mod drivers;
pub mod evaluations;
pub mod fuel_records;
pub mod imports;
pub mod items;
pub mod pagination;
pub mod rates;
pub mod reports;
pub mod subcontractors;
pub mod trip_records;
pub mod uploads;
pub mod validation;
pub mod vehicles;
