//! API request/response models for items.

use super::pagination::Pagination;
use super::validation::{non_negative, not_blank, required};
use crate::db::models::items::ItemDBResponse;
use crate::errors::Result;
use crate::images::resolve_image_url;
use crate::types::{ItemId, StatusFilter};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::rust::double_option;
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing items
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListItemsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Case-insensitive substring match on code or name
    pub search: Option<String>,

    pub status: Option<StatusFilter>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemCreate {
    #[schema(example = "CEM50")]
    pub code: String,
    #[schema(example = "Cement 50kg bag")]
    pub name: String,
    #[schema(example = "bag")]
    pub unit: String,
    pub unit_weight_kg: Option<f64>,
    pub image_path: Option<String>,
    pub is_active: Option<bool>,
}

impl ItemCreate {
    pub fn validate(&self) -> Result<()> {
        required("code", &self.code)?;
        required("name", &self.name)?;
        required("unit", &self.unit)?;
        non_negative("unit_weight_kg", self.unit_weight_kg)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ItemUpdate {
    pub code: Option<String>,
    pub name: Option<String>,
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub unit_weight_kg: Option<Option<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "double_option")]
    pub image_path: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl ItemUpdate {
    pub fn validate(&self) -> Result<()> {
        not_blank("code", self.code.as_deref())?;
        not_blank("name", self.name.as_deref())?;
        not_blank("unit", self.unit.as_deref())?;
        non_negative("unit_weight_kg", self.unit_weight_kg.flatten())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    pub id: ItemId,
    pub code: String,
    pub name: String,
    pub unit: String,
    pub unit_weight_kg: Option<f64>,
    pub image_path: Option<String>,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ItemDBResponse> for ItemResponse {
    fn from(db: ItemDBResponse) -> Self {
        Self {
            id: db.id,
            code: db.code,
            name: db.name,
            unit: db.unit,
            unit_weight_kg: db.unit_weight_kg,
            image_path: db.image_path,
            image_url: None,
            is_active: db.is_active,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl ItemResponse {
    pub fn with_image_url(mut self, public_base_url: &str) -> Self {
        self.image_url = resolve_image_url(self.image_path.as_deref(), public_base_url);
        self
    }
}
