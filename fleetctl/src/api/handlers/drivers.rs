use crate::{
    AppState,
    api::models::{
        drivers::{DriverCreate, DriverResponse, DriverUpdate, ListDriversQuery},
        pagination::PaginatedResponse,
    },
    db::{
        handlers::{Drivers, Repository, drivers::DriverFilter},
        models::drivers::{DriverCreateDBRequest, DriverUpdateDBRequest},
    },
    errors::{Error, Result},
    types::DriverId,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};

use super::missing_as_not_found;

#[utoipa::path(
    get,
    path = "/drivers",
    tag = "drivers",
    summary = "List drivers",
    params(ListDriversQuery),
    responses(
        (status = 200, description = "Paginated list of drivers", body = PaginatedResponse<DriverResponse>),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn list_drivers(
    State(state): State<AppState>,
    Query(query): Query<ListDriversQuery>,
) -> Result<Json<PaginatedResponse<DriverResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = DriverFilter {
        search: query.search.clone(),
        is_active: query.status.unwrap_or_default().is_active(),
        subcontractor_id: query.subcontractor_id,
        ..DriverFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Drivers::new(&mut conn);
    let total = repo.count(&filter).await?;
    let drivers = repo.list(&filter).await?;

    let base_url = &state.config.uploads.public_base_url;
    Ok(Json(PaginatedResponse::new(
        drivers
            .into_iter()
            .map(|d| DriverResponse::from(d).with_image_url(base_url))
            .collect(),
        total,
        &query.pagination,
    )))
}

#[utoipa::path(
    get,
    path = "/drivers/{id}",
    tag = "drivers",
    summary = "Get driver",
    params(("id" = i64, Path, description = "Driver ID")),
    responses(
        (status = 200, description = "Driver details", body = DriverResponse),
        (status = 404, description = "Driver not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn get_driver(State(state): State<AppState>, Path(id): Path<DriverId>) -> Result<Json<DriverResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let driver = Drivers::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Driver", id))?;
    Ok(Json(DriverResponse::from(driver).with_image_url(&state.config.uploads.public_base_url)))
}

#[utoipa::path(
    post,
    path = "/drivers",
    tag = "drivers",
    summary = "Create driver",
    request_body = DriverCreate,
    responses(
        (status = 201, description = "Driver created", body = DriverResponse),
        (status = 400, description = "Invalid request or unknown subcontractor"),
        (status = 409, description = "Driver code already exists"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn create_driver(State(state): State<AppState>, Json(request): Json<DriverCreate>) -> Result<(StatusCode, Json<DriverResponse>)> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let driver = Drivers::new(&mut conn).create(&DriverCreateDBRequest::from(request)).await?;
    Ok((
        StatusCode::CREATED,
        Json(DriverResponse::from(driver).with_image_url(&state.config.uploads.public_base_url)),
    ))
}

#[utoipa::path(
    put,
    path = "/drivers/{id}",
    tag = "drivers",
    summary = "Update driver",
    params(("id" = i64, Path, description = "Driver ID")),
    request_body = DriverUpdate,
    responses(
        (status = 200, description = "Driver updated", body = DriverResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Driver not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn update_driver(
    State(state): State<AppState>,
    Path(id): Path<DriverId>,
    Json(request): Json<DriverUpdate>,
) -> Result<Json<DriverResponse>> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let driver = Drivers::new(&mut conn)
        .update(id, &DriverUpdateDBRequest::from(request))
        .await
        .map_err(missing_as_not_found("Driver", id))?;
    Ok(Json(DriverResponse::from(driver).with_image_url(&state.config.uploads.public_base_url)))
}

#[utoipa::path(
    delete,
    path = "/drivers/{id}",
    tag = "drivers",
    summary = "Delete driver",
    params(("id" = i64, Path, description = "Driver ID")),
    responses(
        (status = 204, description = "Driver deleted"),
        (status = 404, description = "Driver not found"),
        (status = 409, description = "Driver is assigned to vehicles or has recorded trips"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn delete_driver(State(state): State<AppState>, Path(id): Path<DriverId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Drivers::new(&mut conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Driver", id))
    }
}
