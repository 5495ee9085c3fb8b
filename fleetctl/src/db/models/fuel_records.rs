//! Database models for fuel records.

use crate::api::models::fuel_records::{FuelRecordCreate, FuelRecordUpdate};
use crate::types::{DriverId, FuelRecordId, VehicleId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct FuelRecordCreateDBRequest {
    pub fuel_date: NaiveDate,
    pub vehicle_id: VehicleId,
    pub driver_id: Option<DriverId>,
    pub liters: f64,
    pub price_per_liter: f64,
    pub total_cost: f64,
    pub odometer_km: Option<f64>,
    pub station: Option<String>,
}

impl From<FuelRecordCreate> for FuelRecordCreateDBRequest {
    fn from(api: FuelRecordCreate) -> Self {
        let total_cost = api.total_cost.unwrap_or_else(|| round_currency(api.liters * api.price_per_liter));
        Self {
            fuel_date: api.fuel_date,
            vehicle_id: api.vehicle_id,
            driver_id: api.driver_id,
            liters: api.liters,
            price_per_liter: api.price_per_liter,
            total_cost,
            odometer_km: api.odometer_km,
            station: api.station,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FuelRecordUpdateDBRequest {
    pub fuel_date: Option<NaiveDate>,
    pub vehicle_id: Option<VehicleId>,
    pub driver_id: Option<Option<DriverId>>,
    pub liters: Option<f64>,
    pub price_per_liter: Option<f64>,
    pub total_cost: Option<f64>,
    pub odometer_km: Option<Option<f64>>,
    pub station: Option<Option<String>>,
}

impl From<FuelRecordUpdate> for FuelRecordUpdateDBRequest {
    fn from(api: FuelRecordUpdate) -> Self {
        Self {
            fuel_date: api.fuel_date,
            vehicle_id: api.vehicle_id,
            driver_id: api.driver_id,
            liters: api.liters,
            price_per_liter: api.price_per_liter,
            total_cost: api.total_cost,
            odometer_km: api.odometer_km,
            station: api.station,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct FuelRecordDBResponse {
    pub id: FuelRecordId,
    pub fuel_date: NaiveDate,
    pub vehicle_id: VehicleId,
    pub driver_id: Option<DriverId>,
    pub liters: f64,
    pub price_per_liter: f64,
    pub total_cost: f64,
    pub odometer_km: Option<f64>,
    pub station: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub vehicle_plate: String,
    pub driver_name: Option<String>,
}

/// Round to two decimal places
pub fn round_currency(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_cost_computed_when_absent() {
        let api = FuelRecordCreate {
            fuel_date: NaiveDate::from_ymd_opt(2026, 3, 4).unwrap(),
            vehicle_id: 1,
            driver_id: None,
            liters: 42.5,
            price_per_liter: 1.333,
            total_cost: None,
            odometer_km: None,
            station: None,
        };
        assert_eq!(FuelRecordCreateDBRequest::from(api.clone()).total_cost, 56.65);

        let supplied = FuelRecordCreate {
            total_cost: Some(50.0),
            ..api
        };
        assert_eq!(FuelRecordCreateDBRequest::from(supplied).total_cost, 50.0);
    }
}
