//! API request/response models for vehicles.

use super::pagination::Pagination;
use super::validation::{non_negative, not_blank, required};
use crate::db::models::vehicles::VehicleDBResponse;
use crate::errors::Result;
use crate::images::resolve_image_url;
use crate::types::{DriverId, StatusFilter, SubcontractorId, VehicleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing vehicles
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListVehiclesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring match on plate number, type or brand
    pub search: Option<String>,

    pub status: Option<StatusFilter>,

    #[serde_as(as = "Option<DisplayFromStr>")]
    pub subcontractor_id: Option<SubcontractorId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VehicleCreate {
    /// Registration plate, stored trimmed and upper-cased (must be unique)
    #[schema(example = "KX-4821")]
    pub plate_number: String,
    #[schema(example = "6-wheel truck")]
    pub vehicle_type: String,
    pub brand: Option<String>,
    pub capacity_kg: Option<f64>,
    pub image_path: Option<String>,
    /// Regular driver of this vehicle
    pub driver_id: Option<DriverId>,
    pub subcontractor_id: Option<SubcontractorId>,
    pub is_active: Option<bool>,
}

impl VehicleCreate {
    pub fn validate(&self) -> Result<()> {
        required("plate_number", &self.plate_number)?;
        required("vehicle_type", &self.vehicle_type)?;
        non_negative("capacity_kg", self.capacity_kg)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct VehicleUpdate {
    pub plate_number: Option<String>,
    pub vehicle_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub brand: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub capacity_kg: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub image_path: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub driver_id: Option<Option<DriverId>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub subcontractor_id: Option<Option<SubcontractorId>>,
    pub is_active: Option<bool>,
}

impl VehicleUpdate {
    pub fn validate(&self) -> Result<()> {
        not_blank("plate_number", self.plate_number.as_deref())?;
        not_blank("vehicle_type", self.vehicle_type.as_deref())?;
        non_negative("capacity_kg", self.capacity_kg.flatten())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct VehicleResponse {
    pub id: VehicleId,
    pub plate_number: String,
    pub vehicle_type: String,
    pub brand: Option<String>,
    pub capacity_kg: Option<f64>,
    pub image_path: Option<String>,
    pub image_url: Option<String>,
    pub driver_id: Option<DriverId>,
    pub subcontractor_id: Option<SubcontractorId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<VehicleDBResponse> for VehicleResponse {
    fn from(db: VehicleDBResponse) -> Self {
        Self {
            id: db.id,
            plate_number: db.plate_number,
            vehicle_type: db.vehicle_type,
            brand: db.brand,
            capacity_kg: db.capacity_kg,
            image_path: db.image_path,
            image_url: None,
            driver_id: db.driver_id,
            subcontractor_id: db.subcontractor_id,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl VehicleResponse {
    pub fn with_image_url(mut self, public_base_url: &str) -> Self {
        self.image_url = resolve_image_url(self.image_path.as_deref(), public_base_url);
        self
    }
}
