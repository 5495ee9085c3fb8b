//! API request/response models for customers.

use super::pagination::Pagination;
use super::validation::{non_negative, not_blank, required};
use crate::db::models::customers::CustomerDBResponse;
use crate::errors::Result;
use crate::types::{CustomerId, StatusFilter};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing customers
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListCustomersQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring match on code, name, address or phone
    pub search: Option<String>,

    /// Filter on the active flag (default: all)
    pub status: Option<StatusFilter>,
}

/// Request body for creating a customer.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerCreate {
    /// Customer code, stored trimmed and upper-cased (must be unique)
    #[schema(example = "C0042")]
    pub code: String,
    #[schema(example = "Harbour Foods Ltd")]
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Driving distance from the depot in kilometres
    pub distance_km: Option<f64>,
    /// Defaults to true
    pub is_active: Option<bool>,
}

/// Request body for updating a customer. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CustomerUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub tax_id: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub latitude: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub longitude: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub distance_km: Option<Option<f64>>,
    /// Set to false to soft-delete
    pub is_active: Option<bool>,
}

/// Customer details returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerResponse {
    pub id: CustomerId,
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_km: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<CustomerDBResponse> for CustomerResponse {
    fn from(db: CustomerDBResponse) -> Self {
        Self {
            id: db.id,
            code: db.code,
            name: db.name,
            address: db.address,
            phone: db.phone,
            tax_id: db.tax_id,
            latitude: db.latitude,
            longitude: db.longitude,
            distance_km: db.distance_km,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Request body for deleting several customers at once
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkDeleteRequest {
    pub ids: Vec<CustomerId>,
}

/// A single failed row in a bulk operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BulkRowError {
    /// Customer ID or code the failure refers to
    pub key: String,
    pub message: String,
}

/// Per-row outcome of a bulk delete
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct BulkDeleteResponse {
    pub succeeded: usize,
    pub failed: usize,
    pub errors: Vec<BulkRowError>,
}

impl CustomerCreate {
    pub fn validate(&self) -> Result<()> {
        required("code", &self.code)?;
        required("name", &self.name)?;
        non_negative("distance_km", self.distance_km)
    }
}

impl CustomerUpdate {
    pub fn validate(&self) -> Result<()> {
        not_blank("code", self.code.as_deref())?;
        not_blank("name", self.name.as_deref())?;
        non_negative("distance_km", self.distance_km.flatten())
    }
}
