//! API request/response models for trip records.

use super::pagination::Pagination;
use super::validation::non_negative;
use crate::db::models::trip_records::TripRecordDBResponse;
use crate::errors::{Error, Result};
use crate::types::{CustomerId, DriverId, ItemId, TripRecordId, VehicleId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing trip records
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListTripRecordsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring match on origin, destination, customer name or plate number
    pub search: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub vehicle_id: Option<VehicleId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub driver_id: Option<DriverId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub customer_id: Option<CustomerId>,

    /// First trip date to include (YYYY-MM-DD)
    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,

    /// Last trip date to include (YYYY-MM-DD)
    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TripRecordCreate {
    pub trip_date: NaiveDate,
    pub vehicle_id: VehicleId,
    pub driver_id: DriverId,
    pub customer_id: CustomerId,
    pub item_id: Option<ItemId>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    /// Defaults to the customer's stored distance from the depot
    pub distance_km: Option<f64>,
    /// Defaults to the configured rate for `distance_km`
    pub distance_rate: Option<f64>,
    pub fuel_expense: Option<f64>,
    pub toll_expense: Option<f64>,
    pub other_expense: Option<f64>,
    pub allowance: Option<f64>,
    pub notes: Option<String>,
}

impl TripRecordCreate {
    pub fn validate(&self) -> Result<()> {
        validate_amounts(
            self.distance_km,
            self.distance_rate,
            self.fuel_expense,
            self.toll_expense,
            self.other_expense,
            self.allowance,
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct TripRecordUpdate {
    pub trip_date: Option<NaiveDate>,
    pub vehicle_id: Option<VehicleId>,
    pub driver_id: Option<DriverId>,
    pub customer_id: Option<CustomerId>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub item_id: Option<Option<ItemId>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub origin: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub destination: Option<Option<String>>,
    pub distance_km: Option<f64>,
    pub distance_rate: Option<f64>,
    pub fuel_expense: Option<f64>,
    pub toll_expense: Option<f64>,
    pub other_expense: Option<f64>,
    pub allowance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub notes: Option<Option<String>>,
}

impl TripRecordUpdate {
    pub fn validate(&self) -> Result<()> {
        validate_amounts(
            self.distance_km,
            self.distance_rate,
            self.fuel_expense,
            self.toll_expense,
            self.other_expense,
            self.allowance,
        )
    }
}

fn validate_amounts(
    distance_km: Option<f64>,
    distance_rate: Option<f64>,
    fuel: Option<f64>,
    toll: Option<f64>,
    other: Option<f64>,
    allowance: Option<f64>,
) -> Result<()> {
    non_negative("distance_km", distance_km)?;
    non_negative("distance_rate", distance_rate)?;
    non_negative("fuel_expense", fuel)?;
    non_negative("toll_expense", toll)?;
    non_negative("other_expense", other)?;
    non_negative("allowance", allowance)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TripRecordResponse {
    pub id: TripRecordId,
    pub trip_date: NaiveDate,
    pub vehicle_id: VehicleId,
    pub vehicle_plate: String,
    pub driver_id: DriverId,
    pub driver_name: String,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub item_id: Option<ItemId>,
    pub item_name: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
    pub distance_km: f64,
    pub distance_rate: f64,
    pub fuel_expense: f64,
    pub toll_expense: f64,
    pub other_expense: f64,
    pub allowance: f64,
    /// Fuel, toll and other expenses plus allowance
    pub total_expense: f64,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TripRecordDBResponse> for TripRecordResponse {
    fn from(db: TripRecordDBResponse) -> Self {
        let total_expense = db.total_expense();
        Self {
            id: db.id,
            trip_date: db.trip_date,
            vehicle_id: db.vehicle_id,
            vehicle_plate: db.vehicle_plate,
            driver_id: db.driver_id,
            driver_name: db.driver_name,
            customer_id: db.customer_id,
            customer_name: db.customer_name,
            item_id: db.item_id,
            item_name: db.item_name,
            origin: db.origin,
            destination: db.destination,
            distance_km: db.distance_km,
            distance_rate: db.distance_rate,
            fuel_expense: db.fuel_expense,
            toll_expense: db.toll_expense,
            other_expense: db.other_expense,
            allowance: db.allowance,
            total_expense,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Reject a date range whose start is after its end.
pub fn check_date_range(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<()> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(Error::bad_request(format!("from ({from}) is after to ({to})"))),
        _ => Ok(()),
    }
}
