//! Database models for trip records.

use crate::api::models::trip_records::{TripRecordCreate, TripRecordUpdate};
use crate::types::{CustomerId, DriverId, ItemId, TripRecordId, VehicleId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Database request for creating a trip record.
///
/// Distance and rate are resolved by the caller (customer distance, rate table) before insert.
#[derive(Debug, Clone)]
pub struct TripRecordCreateDBRequest {
    pub trip_date: NaiveDate,
    pub vehicle_id: VehicleId,
    pub driver_id: DriverId,
    pub customer_id: CustomerId,
    pub item_id: Option<ItemId>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub distance_km: f64,
    pub distance_rate: f64,
    pub fuel_expense: f64,
    pub toll_expense: f64,
    pub other_expense: f64,
    pub allowance: f64,
    pub notes: Option<String>,
}

impl TripRecordCreateDBRequest {
    pub fn new(api: TripRecordCreate, distance_km: f64, distance_rate: f64) -> Self {
        Self {
            trip_date: api.trip_date,
            vehicle_id: api.vehicle_id,
            driver_id: api.driver_id,
            customer_id: api.customer_id,
            item_id: api.item_id,
            origin: api.origin,
            destination: api.destination,
            distance_km,
            distance_rate,
            fuel_expense: api.fuel_expense.unwrap_or(0.0),
            toll_expense: api.toll_expense.unwrap_or(0.0),
            other_expense: api.other_expense.unwrap_or(0.0),
            allowance: api.allowance.unwrap_or(0.0),
            notes: api.notes,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TripRecordUpdateDBRequest {
    pub trip_date: Option<NaiveDate>,
    pub vehicle_id: Option<VehicleId>,
    pub driver_id: Option<DriverId>,
    pub customer_id: Option<CustomerId>,
    pub item_id: Option<Option<ItemId>>,
    pub origin: Option<Option<String>>,
    pub destination: Option<Option<String>>,
    pub distance_km: Option<f64>,
    pub distance_rate: Option<f64>,
    pub fuel_expense: Option<f64>,
    pub toll_expense: Option<f64>,
    pub other_expense: Option<f64>,
    pub allowance: Option<f64>,
    pub notes: Option<Option<String>>,
}

impl From<TripRecordUpdate> for TripRecordUpdateDBRequest {
    fn from(api: TripRecordUpdate) -> Self {
        Self {
            trip_date: api.trip_date,
            vehicle_id: api.vehicle_id,
            driver_id: api.driver_id,
            customer_id: api.customer_id,
            item_id: api.item_id,
            origin: api.origin,
            destination: api.destination,
            distance_km: api.distance_km,
            distance_rate: api.distance_rate,
            fuel_expense: api.fuel_expense,
            toll_expense: api.toll_expense,
            other_expense: api.other_expense,
            allowance: api.allowance,
            notes: api.notes,
        }
    }
}

/// A trip record joined with the display names of what it references
#[derive(Debug, Clone, FromRow)]
pub struct TripRecordDBResponse {
    pub id: TripRecordId,
    pub trip_date: NaiveDate,
    pub vehicle_id: VehicleId,
    pub driver_id: DriverId,
    pub customer_id: CustomerId,
    pub item_id: Option<ItemId>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub distance_km: f64,
    pub distance_rate: f64,
    pub fuel_expense: f64,
    pub toll_expense: f64,
    pub other_expense: f64,
    pub allowance: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub vehicle_plate: String,
    pub driver_name: String,
    pub customer_name: String,
    pub item_name: Option<String>,
}

impl TripRecordDBResponse {
    /// Sum of every expense column plus the driver allowance
    pub fn total_expense(&self) -> f64 {
        self.fuel_expense + self.toll_expense + self.other_expense + self.allowance
    }
}
