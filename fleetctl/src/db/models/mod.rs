//! Database record models matching table schemas.
//!
//! Row structs derive `sqlx::FromRow`; create/update request structs carry already-normalized
//! values (trimmed names, upper-cased codes, computed totals). List and get rows for operational
//! records are joined with the display names of what they reference.
//!
//! # Conversion to API Models
//!
//! Each row type converts into its API response with `From`:
//!
//! ```ignore
//! use fleetctl::api::models::vehicles::VehicleResponse;
//!
//! let response = VehicleResponse::from(db_vehicle).with_image_url("/files/images");
//! ```

pub mod customers;
pub mod drivers;
pub mod evaluations;
pub mod fuel_records;
pub mod items;
pub mod subcontractors;
pub mod trip_records;
pub mod vehicles;
