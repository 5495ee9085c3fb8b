//! API request/response models for fuel records.

use super::pagination::Pagination;
use super::validation::non_negative;
use crate::db::models::fuel_records::FuelRecordDBResponse;
use crate::errors::{Error, Result};
use crate::types::{DriverId, FuelRecordId, VehicleId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing fuel records
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListFuelRecordsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring match on station or plate number
    pub search: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub vehicle_id: Option<VehicleId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub driver_id: Option<DriverId>,

    #[param(value_type = Option<String>, format = Date)]
    pub from: Option<NaiveDate>,

    #[param(value_type = Option<String>, format = Date)]
    pub to: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FuelRecordCreate {
    pub fuel_date: NaiveDate,
    pub vehicle_id: VehicleId,
    pub driver_id: Option<DriverId>,
    #[schema(example = 45.0)]
    pub liters: f64,
    #[schema(example = 1.42)]
    pub price_per_liter: f64,
    /// Defaults to `liters * price_per_liter`
    pub total_cost: Option<f64>,
    pub odometer_km: Option<f64>,
    pub station: Option<String>,
}

impl FuelRecordCreate {
    pub fn validate(&self) -> Result<()> {
        if !self.liters.is_finite() || self.liters <= 0.0 {
            return Err(Error::bad_request("liters must be greater than zero"));
        }
        non_negative("price_per_liter", Some(self.price_per_liter))?;
        non_negative("total_cost", self.total_cost)?;
        non_negative("odometer_km", self.odometer_km)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct FuelRecordUpdate {
    pub fuel_date: Option<NaiveDate>,
    pub vehicle_id: Option<VehicleId>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub driver_id: Option<Option<DriverId>>,
    pub liters: Option<f64>,
    pub price_per_liter: Option<f64>,
    pub total_cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub odometer_km: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub station: Option<Option<String>>,
}

impl FuelRecordUpdate {
    pub fn validate(&self) -> Result<()> {
        if let Some(liters) = self.liters
            && (!liters.is_finite() || liters <= 0.0)
        {
            return Err(Error::bad_request("liters must be greater than zero"));
        }
        non_negative("price_per_liter", self.price_per_liter)?;
        non_negative("total_cost", self.total_cost)?;
        non_negative("odometer_km", self.odometer_km.flatten())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FuelRecordResponse {
    pub id: FuelRecordId,
    pub fuel_date: NaiveDate,
    pub vehicle_id: VehicleId,
    pub vehicle_plate: String,
    pub driver_id: Option<DriverId>,
    pub driver_name: Option<String>,
    pub liters: f64,
    pub price_per_liter: f64,
    pub total_cost: f64,
    pub odometer_km: Option<f64>,
    pub station: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FuelRecordDBResponse> for FuelRecordResponse {
    fn from(db: FuelRecordDBResponse) -> Self {
        Self {
            id: db.id,
            fuel_date: db.fuel_date,
            vehicle_id: db.vehicle_id,
            vehicle_plate: db.vehicle_plate,
            driver_id: db.driver_id,
            driver_name: db.driver_name,
            liters: db.liters,
            price_per_liter: db.price_per_liter,
            total_cost: db.total_cost,
            odometer_km: db.odometer_km,
            station: db.station,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
