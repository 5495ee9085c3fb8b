//! Database models for vehicles.

use crate::api::models::vehicles::{VehicleCreate, VehicleUpdate};
use crate::types::{DriverId, SubcontractorId, VehicleId, normalize_code};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct VehicleCreateDBRequest {
    pub plate_number: String,
    pub vehicle_type: String,
    pub brand: Option<String>,
    pub capacity_kg: Option<f64>,
    pub image_path: Option<String>,
    pub driver_id: Option<DriverId>,
    pub subcontractor_id: Option<SubcontractorId>,
    pub is_active: bool,
}

impl From<VehicleCreate> for VehicleCreateDBRequest {
    fn from(api: VehicleCreate) -> Self {
        Self {
            plate_number: normalize_code(&api.plate_number),
            vehicle_type: api.vehicle_type.trim().to_string(),
            brand: api.brand,
            capacity_kg: api.capacity_kg,
            image_path: api.image_path,
            driver_id: api.driver_id,
            subcontractor_id: api.subcontractor_id,
            is_active: api.is_active.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VehicleUpdateDBRequest {
    pub plate_number: Option<String>,
    pub vehicle_type: Option<String>,
    pub brand: Option<Option<String>>,
    pub capacity_kg: Option<Option<f64>>,
    pub image_path: Option<Option<String>>,
    pub driver_id: Option<Option<DriverId>>,
    pub subcontractor_id: Option<Option<SubcontractorId>>,
    pub is_active: Option<bool>,
}

impl From<VehicleUpdate> for VehicleUpdateDBRequest {
    fn from(api: VehicleUpdate) -> Self {
        Self {
            plate_number: api.plate_number.as_deref().map(normalize_code),
            vehicle_type: api.vehicle_type.map(|t| t.trim().to_string()),
            brand: api.brand,
            capacity_kg: api.capacity_kg,
            image_path: api.image_path,
            driver_id: api.driver_id,
            subcontractor_id: api.subcontractor_id,
            is_active: api.is_active,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct VehicleDBResponse {
    pub id: VehicleId,
    pub plate_number: String,
    pub vehicle_type: String,
    pub brand: Option<String>,
    pub capacity_kg: Option<f64>,
    pub image_path: Option<String>,
    pub driver_id: Option<DriverId>,
    pub subcontractor_id: Option<SubcontractorId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
