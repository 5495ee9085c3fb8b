//! API request/response models for subcontractor evaluations and their scores.

use super::pagination::Pagination;
use super::validation::{non_negative, score_in_range};
use crate::db::models::evaluations::EvaluationDBResponse;
use crate::errors::{Error, Result};
use crate::scoring::{Grade, MonthlySummary, ScoringRules, TripScore};
use crate::types::{DriverId, EvaluationId, SubcontractorId, TripRecordId, VehicleId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing evaluations
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListEvaluationsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring match on remarks, plate number or subcontractor name
    pub search: Option<String>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub subcontractor_id: Option<SubcontractorId>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub vehicle_id: Option<VehicleId>,

    /// Calendar month, `YYYY-MM`
    pub month: Option<String>,
}

/// Query parameters for monthly scores and summaries
#[serde_as]
#[derive(Debug, Deserialize, IntoParams)]
pub struct MonthQuery {
    /// Calendar month, `YYYY-MM`
    #[param(example = "2026-03")]
    pub month: String,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub subcontractor_id: Option<SubcontractorId>,
}

/// Check a `YYYY-MM` month string.
pub fn parse_month(month: &str) -> Result<String> {
    let month = month.trim();
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d")
        .ok()
        .filter(|_| month.len() == 7)
        .map(|_| month.to_string())
        .ok_or_else(|| Error::bad_request(format!("Invalid month '{month}', expected YYYY-MM")))
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvaluationCreate {
    pub evaluation_date: NaiveDate,
    pub subcontractor_id: SubcontractorId,
    pub vehicle_id: VehicleId,
    pub driver_id: Option<DriverId>,
    /// The trip this evaluation assesses
    pub trip_record_id: Option<TripRecordId>,
    #[schema(example = 30)]
    pub driver_cooperation: i64,
    #[schema(example = 32)]
    pub vehicle_condition: i64,
    pub damage_found: Option<bool>,
    /// Value of the damage, only meaningful when `damage_found`
    pub damage_value: Option<f64>,
    pub remarks: Option<String>,
}

impl EvaluationCreate {
    pub fn validate(&self, rules: &ScoringRules) -> Result<()> {
        score_in_range("driver_cooperation", Some(self.driver_cooperation), rules.max_cooperation_score)?;
        score_in_range("vehicle_condition", Some(self.vehicle_condition), rules.max_vehicle_condition_score)?;
        non_negative("damage_value", self.damage_value)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct EvaluationUpdate {
    pub evaluation_date: Option<NaiveDate>,
    pub subcontractor_id: Option<SubcontractorId>,
    pub vehicle_id: Option<VehicleId>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub driver_id: Option<Option<DriverId>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub trip_record_id: Option<Option<TripRecordId>>,
    pub driver_cooperation: Option<i64>,
    pub vehicle_condition: Option<i64>,
    pub damage_found: Option<bool>,
    pub damage_value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub remarks: Option<Option<String>>,
}

impl EvaluationUpdate {
    pub fn validate(&self, rules: &ScoringRules) -> Result<()> {
        score_in_range("driver_cooperation", self.driver_cooperation, rules.max_cooperation_score)?;
        score_in_range("vehicle_condition", self.vehicle_condition, rules.max_vehicle_condition_score)?;
        non_negative("damage_value", self.damage_value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvaluationResponse {
    pub id: EvaluationId,
    pub evaluation_date: NaiveDate,
    pub subcontractor_id: SubcontractorId,
    pub subcontractor_name: String,
    pub vehicle_id: VehicleId,
    pub vehicle_plate: String,
    pub driver_id: Option<DriverId>,
    pub driver_name: Option<String>,
    pub trip_record_id: Option<TripRecordId>,
    pub driver_cooperation: i64,
    pub vehicle_condition: i64,
    pub damage_found: bool,
    pub damage_value: f64,
    pub remarks: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<EvaluationDBResponse> for EvaluationResponse {
    fn from(db: EvaluationDBResponse) -> Self {
        Self {
            id: db.id,
            evaluation_date: db.evaluation_date,
            subcontractor_id: db.subcontractor_id,
            subcontractor_name: db.subcontractor_name,
            vehicle_id: db.vehicle_id,
            vehicle_plate: db.vehicle_plate,
            driver_id: db.driver_id,
            driver_name: db.driver_name,
            trip_record_id: db.trip_record_id,
            driver_cooperation: db.driver_cooperation,
            vehicle_condition: db.vehicle_condition,
            damage_found: db.damage_found,
            damage_value: db.damage_value,
            remarks: db.remarks,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Monthly summary row with display names resolved
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvaluationSummaryResponse {
    pub subcontractor_id: SubcontractorId,
    pub subcontractor_name: String,
    pub vehicle_id: VehicleId,
    pub vehicle_plate: String,
    pub month: String,
    pub trip_count: usize,
    pub total_score: i64,
    pub average_score: f64,
    pub incidents: usize,
    pub total_damage: f64,
    pub grade: Grade,
}

impl EvaluationSummaryResponse {
    pub fn new(summary: MonthlySummary, subcontractor_name: String, vehicle_plate: String) -> Self {
        Self {
            subcontractor_id: summary.subcontractor_id,
            subcontractor_name,
            vehicle_id: summary.vehicle_id,
            vehicle_plate,
            month: summary.month,
            trip_count: summary.trip_count,
            total_score: summary.total_score,
            average_score: summary.average_score,
            incidents: summary.incidents,
            total_damage: summary.total_damage,
            grade: summary.grade,
        }
    }
}

/// Per-trip scores for a month
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EvaluationScoresResponse {
    pub month: String,
    /// Highest achievable per-trip total
    pub max_total: i64,
    pub scores: Vec<TripScore>,
}
