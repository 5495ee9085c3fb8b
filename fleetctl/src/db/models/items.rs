//! Database models for items (goods carried on trips).

use crate::api::models::items::{ItemCreate, ItemUpdate};
use crate::types::{ItemId, normalize_code};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, Clone)]
pub struct ItemCreateDBRequest {
    pub code: String,
    pub name: String,
    pub unit: String,
    pub unit_weight_kg: Option<f64>,
    pub image_path: Option<String>,
    pub is_active: bool,
}

impl From<ItemCreate> for ItemCreateDBRequest {
    fn from(api: ItemCreate) -> Self {
        Self {
            code: normalize_code(&api.code),
            name: api.name.trim().to_string(),
            unit: api.unit.trim().to_string(),
            unit_weight_kg: api.unit_weight_kg,
            image_path: api.image_path,
            is_active: api.is_active.unwrap_or(true),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ItemUpdateDBRequest {
    pub code: Option<String>,
    pub name: Option<String>,
    pub unit: Option<String>,
    pub unit_weight_kg: Option<Option<f64>>,
    pub image_path: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl From<ItemUpdate> for ItemUpdateDBRequest {
    fn from(api: ItemUpdate) -> Self {
        Self {
            code: api.code.as_deref().map(normalize_code),
            name: api.name.map(|n| n.trim().to_string()),
            unit: api.unit.map(|u| u.trim().to_string()),
            unit_weight_kg: api.unit_weight_kg,
            image_path: api.image_path,
            is_active: api.is_active,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct ItemDBResponse {
    pub id: ItemId,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub unit_weight_kg: Option<f64>,
    pub image_path: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
