//! API request/response models for subcontractors.

use super::pagination::Pagination;
use super::validation::{not_blank, required};
use crate::db::models::subcontractors::SubcontractorDBResponse;
use crate::errors::Result;
use crate::types::{StatusFilter, SubcontractorId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing subcontractors
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListSubcontractorsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring match on code, name or contact
    pub search: Option<String>,

    pub status: Option<StatusFilter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubcontractorCreate {
    #[schema(example = "SUB01")]
    pub code: String,
    #[schema(example = "Northline Haulage")]
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: Option<bool>,
}

impl SubcontractorCreate {
    pub fn validate(&self) -> Result<()> {
        required("code", &self.code)?;
        required("name", &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct SubcontractorUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub contact_name: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub phone: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl SubcontractorUpdate {
    pub fn validate(&self) -> Result<()> {
        not_blank("code", self.code.as_deref())?;
        not_blank("name", self.name.as_deref())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubcontractorResponse {
    pub id: SubcontractorId,
    pub code: String,
    pub name: String,
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<SubcontractorDBResponse> for SubcontractorResponse {
    fn from(db: SubcontractorDBResponse) -> Self {
        Self {
            id: db.id,
            code: db.code,
            name: db.name,
            contact_name: db.contact_name,
            phone: db.phone,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}
