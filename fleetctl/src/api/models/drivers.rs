//! API request/response models for drivers.

use super::pagination::Pagination;
use super::validation::{not_blank, required};
use crate::db::models::drivers::DriverDBResponse;
use crate::errors::Result;
use crate::images::resolve_image_url;
use crate::types::{DriverId, StatusFilter, SubcontractorId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing drivers
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListDriversQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring match on code, name, phone or licence number
    pub search: Option<String>,

    pub status: Option<StatusFilter>,

    /// Only drivers employed by this subcontractor
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub subcontractor_id: Option<SubcontractorId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DriverCreate {
    #[schema(example = "D007")]
    pub code: String,
    #[schema(example = "Sam Okafor")]
    pub name: String,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    /// Relative path returned by the image upload endpoint
    pub image_path: Option<String>,
    pub subcontractor_id: Option<SubcontractorId>,
    pub is_active: Option<bool>,
}

impl DriverCreate {
    pub fn validate(&self) -> Result<()> {
        required("code", &self.code)?;
        required("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DriverUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub license_number: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub image_path: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub subcontractor_id: Option<Option<SubcontractorId>>,
    pub is_active: Option<bool>,
}

impl DriverUpdate {
    pub fn validate(&self) -> Result<()> {
        not_blank("code", self.code.as_deref())?;
        not_blank("name", self.name.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DriverResponse {
    pub id: DriverId,
    pub code: String,
    pub name: String,
    pub phone: Option<String>,
    pub license_number: Option<String>,
    pub image_path: Option<String>,
    /// Absolute URL of the driver photo, if any
    pub image_url: Option<String>,
    pub subcontractor_id: Option<SubcontractorId>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DriverDBResponse> for DriverResponse {
    fn from(db: DriverDBResponse) -> Self {
        Self {
            id: db.id,
            code: db.code,
            name: db.name,
            phone: db.phone,
            license_number: db.license_number,
            image_path: db.image_path,
            image_url: None,
            subcontractor_id: db.subcontractor_id,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl DriverResponse {
    /// Fill `image_url` from `image_path` against the public file base URL
    pub fn with_image_url(mut self, public_base_url: &str) -> Self {
        self.image_url = resolve_image_url(self.image_path.as_deref(), public_base_url);
        self
    }
}
