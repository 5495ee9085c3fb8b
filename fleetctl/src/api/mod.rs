//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! Everything below is served under `/admin/api/v1`:
//!
//! - **Master data**: `/customers`, `/subcontractors`, `/drivers`, `/vehicles`, `/items`
//! - **Operations**: `/trip-records`, `/fuel-records`, `/evaluations`
//! - **Legacy import**: `/customers/import`, `/legacy/customers`
//! - **Reports**: `/reports/{evaluations,fuel,trips}.pdf`
//! - **Uploads**: `/uploads/images`, served back from `/files/images`
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with `utoipa` annotations. The API reference is served at
//! `/docs` when the server is running.

pub mod handlers;
pub mod models;
