use crate::{
    AppState,
    api::models::{
        vehicles::{VehicleCreate, VehicleResponse, VehicleUpdate, ListVehiclesQuery},
        pagination::PaginatedResponse,
    },
    db::{
        handlers::{Repository, Vehicles, vehicles::VehicleFilter},
        models::vehicles::{VehicleCreateDBRequest, VehicleUpdateDBRequest},
    },
    errors::{Error, Result},
    types::VehicleId,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};

use super::missing_as_not_found;

#[utoipa::path(
    get,
    path = "/vehicles",
    tag = "vehicles",
    summary = "List vehicles",
    params(ListVehiclesQuery),
    responses(
        (status = 200, description = "Paginated list of vehicles", body = PaginatedResponse<VehicleResponse>),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn list_vehicles(
    State(state): State<AppState>,
    Query(query): Query<ListVehiclesQuery>,
) -> Result<Json<PaginatedResponse<VehicleResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = VehicleFilter {
        search: query.search.clone(),
        is_active: query.status.unwrap_or_default().is_active(),
        subcontractor_id: query.subcontractor_id,
        ..VehicleFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Vehicles::new(&mut conn);
    let total = repo.count(&filter).await?;
    let vehicles = repo.list(&filter).await?;

    let base_url = &state.config.uploads.public_base_url;
    Ok(Json(PaginatedResponse::new(
        vehicles
            .into_iter()
            .map(|d| VehicleResponse::from(d).with_image_url(base_url))
            .collect(),
        total,
        &query.pagination,
    )))
}

#[utoipa::path(
    get,
    path = "/vehicles/{id}",
    tag = "vehicles",
    summary = "Get vehicle",
    params(("id" = i64, Path, description = "Vehicle ID")),
    responses(
        (status = 200, description = "Vehicle details", body = VehicleResponse),
        (status = 404, description = "Vehicle not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn get_vehicle(State(state): State<AppState>, Path(id): Path<VehicleId>) -> Result<Json<VehicleResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let vehicle = Vehicles::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Vehicle", id))?;
    Ok(Json(VehicleResponse::from(vehicle).with_image_url(&state.config.uploads.public_base_url)))
}

#[utoipa::path(
    post,
    path = "/vehicles",
    tag = "vehicles",
    summary = "Create vehicle",
    request_body = VehicleCreate,
    responses(
        (status = 201, description = "Vehicle created", body = VehicleResponse),
        (status = 400, description = "Invalid request or unknown reference"),
        (status = 409, description = "Vehicle code already exists"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn create_vehicle(State(state): State<AppState>, Json(request): Json<VehicleCreate>) -> Result<(StatusCode, Json<VehicleResponse>)> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let vehicle = Vehicles::new(&mut conn).create(&VehicleCreateDBRequest::from(request)).await?;
    Ok((
        StatusCode::CREATED,
        Json(VehicleResponse::from(vehicle).with_image_url(&state.config.uploads.public_base_url)),
    ))
}

#[utoipa::path(
    put,
    path = "/vehicles/{id}",
    tag = "vehicles",
    summary = "Update vehicle",
    params(("id" = i64, Path, description = "Vehicle ID")),
    request_body = VehicleUpdate,
    responses(
        (status = 200, description = "Vehicle updated", body = VehicleResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Vehicle not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn update_vehicle(
    State(state): State<AppState>,
    Path(id): Path<VehicleId>,
    Json(request): Json<VehicleUpdate>,
) -> Result<Json<VehicleResponse>> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let vehicle = Vehicles::new(&mut conn)
        .update(id, &VehicleUpdateDBRequest::from(request))
        .await
        .map_err(missing_as_not_found("Vehicle", id))?;
    Ok(Json(VehicleResponse::from(vehicle).with_image_url(&state.config.uploads.public_base_url)))
}

#[utoipa::path(
    delete,
    path = "/vehicles/{id}",
    tag = "vehicles",
    summary = "Delete vehicle",
    params(("id" = i64, Path, description = "Vehicle ID")),
    responses(
        (status = 204, description = "Vehicle deleted"),
        (status = 404, description = "Vehicle not found"),
        (status = 409, description = "Vehicle has recorded trips, fuel records or evaluations"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn delete_vehicle(State(state): State<AppState>, Path(id): Path<VehicleId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Vehicles::new(&mut conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Vehicle", id))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{pagination::PaginatedResponse, vehicles::VehicleResponse},
        test_utils::*,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_plate_is_conflict(pool: SqlitePool) {
        seed_fleet(&pool).await;
        let app = create_test_app(pool).await;

        let response = app
            .post("/admin/api/v1/vehicles")
            .json(&json!({"plate_number": " kx-1001", "vehicle_type": "Van"}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        assert_eq!(body["error"]["message"], "A vehicle with this plate number already exists");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_absolute_image_url_passes_through(pool: SqlitePool) {
        let app = create_test_app(pool).await;
        let response = app
            .post("/admin/api/v1/vehicles")
            .json(&json!({
                "plate_number": "KX-2002",
                "vehicle_type": "6-wheel truck",
                "image_path": "https://cdn.example.com/kx2002.jpg"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let vehicle: VehicleResponse = response.json();
        assert_eq!(vehicle.image_url.as_deref(), Some("https://cdn.example.com/kx2002.jpg"));

        let page: PaginatedResponse<VehicleResponse> = app.get("/admin/api/v1/vehicles?search=kx-20").await.json();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.data[0].image_url.as_deref(), Some("https://cdn.example.com/kx2002.jpg"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_negative_capacity_is_rejected(pool: SqlitePool) {
        let app = create_test_app(pool).await;
        app.post("/admin/api/v1/vehicles")
            .json(&json!({"plate_number": "KX-3003", "vehicle_type": "Van", "capacity_kg": -1.0}))
            .await
            .assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unreferenced_vehicle_can_be_deleted(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let app = create_test_app(pool).await;

        app.delete(&format!("/admin/api/v1/vehicles/{}", fixtures.vehicle_id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        app.get(&format!("/admin/api/v1/vehicles/{}", fixtures.vehicle_id))
            .await
            .assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_patch_null_unassigns_driver(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let app = create_test_app(pool).await;
        let url = format!("/admin/api/v1/vehicles/{}", fixtures.vehicle_id);

        app.patch(&url)
            .json(&json!({"image_path": "vehicles/kx1001.png"}))
            .await
            .assert_status_ok();

        let response = app.patch(&url).json(&json!({"driver_id": null, "image_path": null})).await;
        response.assert_status_ok();
        let vehicle: VehicleResponse = response.json();
        assert_eq!(vehicle.driver_id, None);
        assert_eq!(vehicle.image_path, None);
        assert_eq!(vehicle.image_url, None);
        assert_eq!(vehicle.subcontractor_id, Some(fixtures.subcontractor_id));

        // Omitted fields stay put
        let vehicle: VehicleResponse = app.patch(&url).json(&json!({"brand": "Isuzu"})).await.json();
        assert_eq!(vehicle.subcontractor_id, Some(fixtures.subcontractor_id));
        assert_eq!(vehicle.capacity_kg, Some(8000.0));

        app.delete(&format!("/admin/api/v1/drivers/{}", fixtures.driver_id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
    }
}
