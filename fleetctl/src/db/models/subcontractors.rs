//! Database models for subcontractors.

use crate::api::models::subcontractors::{SubcontractorCreate, SubcontractorUpdate};
use crate::types::{SubcontractorId, normalize_code};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct SubcontractorCreateDBRequest {
    pub code: String,
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
}

impl From<SubcontractorCreate> for SubcontractorCreateDBRequest {
    fn from(api: SubcontractorCreate) -> Self {
        Self {
            code: normalize_code(&api.code),
            name: api.name.trim().to_string(),
            contact_name: api.contact_name,
            phone: api.phone,
            is_active: api.is_active.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SubcontractorUpdateDBRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub contact_name: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl From<SubcontractorUpdate> for SubcontractorUpdateDBRequest {
    fn from(api: SubcontractorUpdate) -> Self {
        Self {
            code: api.code.as_deref().map(normalize_code),
            name: api.name.map(|n| n.trim().to_string()),
            contact_name: api.contact_name,
            phone: api.phone,
            is_active: api.is_active,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct SubcontractorDBResponse {
    pub id: SubcontractorId,
    pub code: String,
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
