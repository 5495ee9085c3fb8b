//! Repository implementations for database access.
//!
//! One repository per table, each implementing the [`Repository`] trait over a borrowed
//! `SqliteConnection`. Repositories build their list queries with `sqlx::QueryBuilder` and
//! refuse deletes of rows other tables still reference.
//!
//! # Available Repositories
//!
//! - [`Customers`], [`Subcontractors`], [`Drivers`], [`Vehicles`], [`Items`]: Master data
//! - [`TripRecords`], [`FuelRecords`]: Operational records, with unpaginated `list_all` for reports
//! - [`Evaluations`]: Subcontractor evaluations, with a per-month listing for scoring
//!
//! # Common Pattern
//!
//! ```ignore
//! use fleetctl::db::handlers::{Drivers, Repository};
//!
//! let mut conn = pool.acquire().await?;
//! let mut repo = Drivers::new(&mut conn);
//! let driver = repo.get_by_id(7).await?;
//! ```

pub mod customers;
pub mod drivers;
pub mod evaluations;
pub mod fuel_records;
pub mod items;
pub mod repository;
pub mod subcontractors;
pub mod trip_records;
pub mod vehicles;

pub use customers::Customers;
pub use drivers::Drivers;
pub use evaluations::Evaluations;
pub use fuel_records::FuelRecords;
pub use items::Items;
pub use repository::Repository;
pub use subcontractors::Subcontractors;
pub use trip_records::TripRecords;
pub use vehicles::Vehicles;
