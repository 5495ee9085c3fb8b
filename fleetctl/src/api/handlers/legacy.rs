//! Read-only views of the legacy master-data system.

use crate::{
    AppState,
    api::models::imports::LegacyCustomersQuery,
    errors::{Error, Result},
    imports::check_code_range,
    legacy::{LegacyCustomer, LegacyCustomerSource},
    types::normalize_code,
};
use axum::extract::{Json, Path, Query, State};
use std::sync::Arc;

fn legacy_source(state: &AppState) -> Result<Arc<dyn LegacyCustomerSource>> {
    state.legacy.clone().ok_or_else(|| Error::ServiceUnavailable {
        service: "Legacy master-data system".to_string(),
    })
}

#[utoipa::path(
    get,
    path = "/legacy/customers",
    tag = "legacy",
    summary = "Preview legacy customers",
    description = "List the legacy customers an import of the same code range would read.",
    params(LegacyCustomersQuery),
    responses(
        (status = 200, description = "Legacy customer rows ordered by code", body = Vec<LegacyCustomer>),
        (status = 400, description = "Blank or inverted code range"),
        (status = 502, description = "Legacy system unavailable"),
        (status = 503, description = "Legacy system not configured"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn list_legacy_customers(
    State(state): State<AppState>,
    Query(query): Query<LegacyCustomersQuery>,
) -> Result<Json<Vec<LegacyCustomer>>> {
    let source = legacy_source(&state)?;
    let (from, to) = check_code_range(&query.from, &query.to)?;
    Ok(Json(source.customers_in_range(from, to).await?))
}

#[utoipa::path(
    get,
    path = "/legacy/customers/{code}",
    tag = "legacy",
    summary = "Get a legacy customer",
    params(("code" = String, Path, description = "Legacy customer code")),
    responses(
        (status = 200, description = "Legacy customer row", body = LegacyCustomer),
        (status = 404, description = "No such code in the legacy system"),
        (status = 502, description = "Legacy system unavailable"),
        (status = 503, description = "Legacy system not configured"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn get_legacy_customer(State(state): State<AppState>, Path(code): Path<String>) -> Result<Json<LegacyCustomer>> {
    let source = legacy_source(&state)?;
    let code = normalize_code(&code);
    source
        .customer_by_code(&code)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("Legacy customer", code))
}
