//! Database models for drivers.

use crate::api::models::drivers::{DriverCreate, DriverUpdate};
use crate::types::{DriverId, SubcontractorId, normalize_code};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct DriverCreateDBRequest {
    pub code: String,
    pub name: String,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub image_path: Option<String>,
    pub subcontractor_id: Option<SubcontractorId>,
    pub is_active: bool,
}

impl From<DriverCreate> for DriverCreateDBRequest {
    fn from(api: DriverCreate) -> Self {
        Self {
            code: normalize_code(&api.code),
            name: api.name.trim().to_string(),
            phone: api.phone,
            license_number: api.license_number,
            image_path: api.image_path,
            subcontractor_id: api.subcontractor_id,
            is_active: api.is_active.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DriverUpdateDBRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub phone: Option<Option<String>>,
    pub license_number: Option<Option<String>>,
    pub image_path: Option<Option<String>>,
    pub subcontractor_id: Option<Option<SubcontractorId>>,
    pub is_active: Option<bool>,
}

impl From<DriverUpdate> for DriverUpdateDBRequest {
    fn from(api: DriverUpdate) -> Self {
        Self {
            code: api.code.as_deref().map(normalize_code),
            name: api.name.map(|n| n.trim().to_string()),
            phone: api.phone,
            license_number: api.license_number,
            image_path: api.image_path,
            subcontractor_id: api.subcontractor_id,
            is_active: api.is_active,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct DriverDBResponse {
    pub id: DriverId,
    pub code: String,
    pub name: String,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub image_path: Option<String>,
    pub subcontractor_id: Option<SubcontractorId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
