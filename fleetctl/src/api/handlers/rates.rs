use crate::{
    AppState,
    api::models::rates::{DistanceRateQuery, DistanceRateResponse},
    errors::{Error, Result},
    rates::lookup_rate,
};
use axum::extract::{Json, Query, State};

#[utoipa::path(
    get,
    path = "/distance-rates",
    tag = "distance-rates",
    summary = "Distance-rate table",
    description = "Return the configured rate bands. With `distance_km`, also return the rate that distance is charged at.",
    params(DistanceRateQuery),
    responses(
        (status = 200, description = "Rate bands and optional lookup", body = DistanceRateResponse),
        (status = 400, description = "Negative distance"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn get_distance_rates(State(state): State<AppState>, Query(query): Query<DistanceRateQuery>) -> Result<Json<DistanceRateResponse>> {
    let bands = &state.config.distance_rates;
    let rate = match query.distance_km {
        Some(km) if km.is_nan() || km < 0.0 => return Err(Error::bad_request("distance_km must be a non-negative number")),
        Some(km) => lookup_rate(bands, km),
        None => None,
    };

    Ok(Json(DistanceRateResponse {
        bands: bands.clone(),
        distance_km: query.distance_km,
        rate,
    }))
}
