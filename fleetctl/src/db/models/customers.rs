//! Database models for customers.

use crate::api::models::customers::{CustomerCreate, CustomerUpdate};
use crate::types::{CustomerId, normalize_code};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database request for creating a new customer
#[derive(Debug, Clone)]
pub struct CustomerCreateDBRequest {
    pub code: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub distance_km: Option<f64>,
    pub is_active: bool,
}

impl From<CustomerCreate> for CustomerCreateDBRequest {
    fn from(api: CustomerCreate) -> Self {
        Self {
            code: normalize_code(&api.code),
            name: api.name.trim().to_string(),
            address: api.address,
            phone: api.phone,
            tax_id: api.tax_id,
            latitude: api.latitude,
            longitude: api.longitude,
            distance_km: api.distance_km,
            is_active: api.is_active.unwrap_or(true),
        }
    }
}

/// Database request for updating a customer; `None` leaves a column unchanged
#[derive(Debug, Clone, Default)]
pub struct CustomerUpdateDBRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub address: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub tax_id: Option<Option<String>>,
    pub latitude: Option<Option<f64>>,
    pub longitude: Option<Option<f64>>,
    pub distance_km: Option<Option<f64>>,
    pub is_active: Option<bool>,
}

impl From<CustomerUpdate> for CustomerUpdateDBRequest {
    fn from(api: CustomerUpdate) -> Self {
        Self {
            code: api.code.as_deref().map(normalize_code),
            name: api.name.map(|n| n.trim().to_string()),
            address: api.address,
            phone: api.phone,
            tax_id: api.tax_id,
            latitude: api.latitude,
            longitude: api.longitude,
            distance_km: api.distance_km,
            is_active: api.is_active,
        }
    }
}

/// Database response for a customer
#[derive(Debug, Clone, FromRow)]
pub struct CustomerDBResponse {
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
