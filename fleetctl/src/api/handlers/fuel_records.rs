use crate::{
    AppState,
    api::models::{
        fuel_records::{FuelRecordCreate, FuelRecordResponse, FuelRecordUpdate, ListFuelRecordsQuery},
        pagination::PaginatedResponse,
        trip_records::check_date_range,
    },
    db::{
        handlers::{FuelRecords, Repository, fuel_records::FuelRecordFilter},
        models::fuel_records::{FuelRecordCreateDBRequest, FuelRecordUpdateDBRequest},
    },
    errors::{Error, Result},
    types::FuelRecordId,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};

use super::missing_as_not_found;

#[utoipa::path(
    get,
    path = "/fuel-records",
    tag = "fuel-records",
    summary = "List fuel records",
    params(ListFuelRecordsQuery),
    responses(
        (status = 200, description = "Paginated list of fuel records", body = PaginatedResponse<FuelRecordResponse>),
        (status = 400, description = "Invalid date range"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn list_fuel_records(
    State(state): State<AppState>,
    Query(query): Query<ListFuelRecordsQuery>,
) -> Result<Json<PaginatedResponse<FuelRecordResponse>>> {
    check_date_range(query.from, query.to)?;

    let (skip, limit) = query.pagination.params();
    let filter = FuelRecordFilter {
        search: query.search.clone(),
        vehicle_id: query.vehicle_id,
        driver_id: query.driver_id,
        from: query.from,
        to: query.to,
        ..FuelRecordFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = FuelRecords::new(&mut conn);
    let total = repo.count(&filter).await?;
    let records = repo.list(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        records.into_iter().map(Into::into).collect(),
        total,
        &query.pagination,
    )))
}

#[utoipa::path(
    get,
    path = "/fuel-records/{id}",
    tag = "fuel-records",
    summary = "Get fuel record",
    params(("id" = i64, Path, description = "Fuel record ID")),
    responses(
        (status = 200, description = "Fuel record details", body = FuelRecordResponse),
        (status = 404, description = "Fuel record not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn get_fuel_record(State(state): State<AppState>, Path(id): Path<FuelRecordId>) -> Result<Json<FuelRecordResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let record = FuelRecords::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Fuel record", id))?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    post,
    path = "/fuel-records",
    tag = "fuel-records",
    summary = "Record a fuel purchase",
    description = "`total_cost` defaults to `liters * price_per_liter`, rounded to cents.",
    request_body = FuelRecordCreate,
    responses(
        (status = 201, description = "Fuel record created", body = FuelRecordResponse),
        (status = 400, description = "Invalid request or unknown vehicle/driver"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn create_fuel_record(
    State(state): State<AppState>,
    Json(request): Json<FuelRecordCreate>,
) -> Result<(StatusCode, Json<FuelRecordResponse>)> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let record = FuelRecords::new(&mut conn)
        .create(&FuelRecordCreateDBRequest::from(request))
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    put,
    path = "/fuel-records/{id}",
    tag = "fuel-records",
    summary = "Update fuel record",
    params(("id" = i64, Path, description = "Fuel record ID")),
    request_body = FuelRecordUpdate,
    responses(
        (status = 200, description = "Fuel record updated", body = FuelRecordResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Fuel record not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn update_fuel_record(
    State(state): State<AppState>,
    Path(id): Path<FuelRecordId>,
    Json(request): Json<FuelRecordUpdate>,
) -> Result<Json<FuelRecordResponse>> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let record = FuelRecords::new(&mut conn)
        .update(id, &FuelRecordUpdateDBRequest::from(request))
        .await
        .map_err(missing_as_not_found("Fuel record", id))?;
    Ok(Json(record.into()))
}

#[utoipa::path(
    delete,
    path = "/fuel-records/{id}",
    tag = "fuel-records",
    summary = "Delete fuel record",
    params(("id" = i64, Path, description = "Fuel record ID")),
    responses(
        (status = 204, description = "Fuel record deleted"),
        (status = 404, description = "Fuel record not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn delete_fuel_record(State(state): State<AppState>, Path(id): Path<FuelRecordId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if FuelRecords::new(&mut conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Fuel record", id))
    }
}

#[cfg(test)]
mod tests {
    use crate::{api::models::fuel_records::FuelRecordResponse, test_utils::*};
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_total_cost_is_computed_when_absent(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let app = create_test_app(pool).await;

        let response = app
            .post("/admin/api/v1/fuel-records")
            .json(&json!({
                "fuel_date": "2026-03-02",
                "vehicle_id": fixtures.vehicle_id,
                "driver_id": fixtures.driver_id,
                "liters": 40.0,
                "price_per_liter": 1.25,
                "station": "Quayside Fuels"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let record: FuelRecordResponse = response.json();
        assert_eq!(record.total_cost, 50.0);
        assert_eq!(record.vehicle_plate, "KX-1001");

        let response = app
            .post("/admin/api/v1/fuel-records")
            .json(&json!({
                "fuel_date": "2026-03-03",
                "vehicle_id": fixtures.vehicle_id,
                "liters": 40.0,
                "price_per_liter": 1.25,
                "total_cost": 48.0
            }))
            .await;
        let record: FuelRecordResponse = response.json();
        assert_eq!(record.total_cost, 48.0);
        assert_eq!(record.driver_name, None);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_zero_liters_is_rejected(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let app = create_test_app(pool).await;

        app.post("/admin/api/v1/fuel-records")
            .json(&json!({
                "fuel_date": "2026-03-02",
                "vehicle_id": fixtures.vehicle_id,
                "liters": 0.0,
                "price_per_liter": 1.25
            }))
            .await
            .assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_fuel_record(pool: SqlitePool) {
        let app = create_test_app(pool).await;
        app.get("/admin/api/v1/fuel-records/5").await.assert_status_not_found();
        app.patch("/admin/api/v1/fuel-records/5")
            .json(&json!({"station": "Elsewhere"}))
            .await
            .assert_status_not_found();
    }
}
