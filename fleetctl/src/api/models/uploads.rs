//! API models for image uploads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A stored upload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UploadResponse {
    /// Path to store on a driver, vehicle or item record, e.g. `drivers/3f2c….jpg`
    pub path: String,
    /// URL the image is served from
    pub url: String,
    pub size: u64,
}
