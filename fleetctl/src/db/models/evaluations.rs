//! Database models for subcontractor evaluations.

use crate::api::models::evaluations::{EvaluationCreate, EvaluationUpdate};
use crate::scoring::ScoringInput;
use crate::types::{DriverId, EvaluationId, SubcontractorId, TripRecordId, VehicleId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct EvaluationCreateDBRequest {
    pub evaluation_date: NaiveDate,
    pub subcontractor_id: SubcontractorId,
    pub vehicle_id: VehicleId,
    pub driver_id: Option<DriverId>,
    pub trip_record_id: Option<TripRecordId>,
    pub driver_cooperation: i64,
    pub vehicle_condition: i64,
    pub damage_found: bool,
    pub damage_value: f64,
    pub remarks: Option<String>,
}

impl From<EvaluationCreate> for EvaluationCreateDBRequest {
    fn from(api: EvaluationCreate) -> Self {
        let damage_found = api.damage_found.unwrap_or(false);
        Self {
            evaluation_date: api.evaluation_date,
            subcontractor_id: api.subcontractor_id,
            vehicle_id: api.vehicle_id,
            driver_id: api.driver_id,
            trip_record_id: api.trip_record_id,
            driver_cooperation: api.driver_cooperation,
            vehicle_condition: api.vehicle_condition,
            damage_found,
            // A damage value without a reported incident is meaningless
            damage_value: if damage_found { api.damage_value.unwrap_or(0.0) } else { 0.0 },
            remarks: api.remarks,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EvaluationUpdateDBRequest {
    pub evaluation_date: Option<NaiveDate>,
    pub subcontractor_id: Option<SubcontractorId>,
    pub vehicle_id: Option<VehicleId>,
    pub driver_id: Option<Option<DriverId>>,
    pub trip_record_id: Option<Option<TripRecordId>>,
    pub driver_cooperation: Option<i64>,
    pub vehicle_condition: Option<i64>,
    pub damage_found: Option<bool>,
    pub damage_value: Option<f64>,
    pub remarks: Option<Option<String>>,
}

impl From<EvaluationUpdate> for EvaluationUpdateDBRequest {
    fn from(api: EvaluationUpdate) -> Self {
        Self {
            evaluation_date: api.evaluation_date,
            subcontractor_id: api.subcontractor_id,
            vehicle_id: api.vehicle_id,
            driver_id: api.driver_id,
            trip_record_id: api.trip_record_id,
            driver_cooperation: api.driver_cooperation,
            vehicle_condition: api.vehicle_condition,
            damage_found: api.damage_found,
            damage_value: if api.damage_found == Some(false) {
                Some(0.0)
            } else {
                api.damage_value
            },
            remarks: api.remarks,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct EvaluationDBResponse {
    pub id: EvaluationId,
    pub evaluation_date: NaiveDate,
    pub subcontractor_id: SubcontractorId,
    pub vehicle_id: VehicleId,
    pub driver_id: Option<DriverId>,
    pub trip_record_id: Option<TripRecordId>,
    pub driver_cooperation: i64,
    pub vehicle_condition: i64,
    pub damage_found: bool,
    pub damage_value: f64,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub subcontractor_name: String,
    pub vehicle_plate: String,
    pub driver_name: Option<String>,
}

impl From<&EvaluationDBResponse> for ScoringInput {
    fn from(db: &EvaluationDBResponse) -> Self {
        Self {
            evaluation_id: db.id,
            subcontractor_id: db.subcontractor_id,
            vehicle_id: db.vehicle_id,
            month: db.evaluation_date.format("%Y-%m").to_string(),
            driver_cooperation: db.driver_cooperation,
            vehicle_condition: db.vehicle_condition,
            damage_found: db.damage_found,
            damage_value: db.damage_value,
        }
    }
}
