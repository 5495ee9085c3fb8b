//! API models for the legacy customer import.

use super::customers::BulkRowError;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Request body for importing customers from the legacy system
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomerImportRequest {
    /// First customer code of the range (inclusive)
    #[schema(example = "C0001")]
    pub from_code: String,
    /// Last customer code of the range (inclusive)
    #[schema(example = "C0500")]
    pub to_code: String,
    /// Geocode addresses and compute the driving distance from the depot
    #[serde(default)]
    pub geocode: bool,
}

/// Outcome of an import run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ImportSummary {
    /// Rows returned by the legacy system
    pub total: usize,
    pub succeeded: usize,
    /// Rows whose code already exists, or repeats within the batch
    pub skipped: usize,
    pub failed: usize,
    pub skipped_codes: Vec<String>,
    pub errors: Vec<BulkRowError>,
}

/// Query parameters for previewing legacy customers
#[derive(Debug, Deserialize, IntoParams)]
pub struct LegacyCustomersQuery {
    pub from: String,
    pub to: String,
}
