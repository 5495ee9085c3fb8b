//! API models for the distance-rate table.

use crate::rates::RateBand;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct DistanceRateQuery {
    /// Distance to price, in kilometres
    pub distance_km: Option<f64>,
}

/// The configured bands, plus the rate for `distance_km` when one was given
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DistanceRateResponse {
    pub bands: Vec<RateBand>,
    pub distance_km: Option<f64>,
    pub rate: Option<f64>,
}
