use crate::{
    AppState,
    api::models::{
        pagination::PaginatedResponse,
        trip_records::{ListTripRecordsQuery, TripRecordCreate, TripRecordResponse, TripRecordUpdate, check_date_range},
    },
    db::{
        handlers::{Customers, Repository, TripRecords, trip_records::TripRecordFilter},
        models::trip_records::{TripRecordCreateDBRequest, TripRecordUpdateDBRequest},
    },
    errors::{Error, Result},
    rates::lookup_rate,
    types::TripRecordId,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use sqlx::SqliteConnection;

use super::missing_as_not_found;

/// Distance for a new trip: the explicit value, else the customer's stored distance.
async fn resolve_distance(conn: &mut SqliteConnection, request: &TripRecordCreate) -> Result<f64> {
    if let Some(distance_km) = request.distance_km {
        return Ok(distance_km);
    }

    let customer = Customers::new(conn)
        .get_by_id(request.customer_id)
        .await?
        .ok_or_else(|| Error::bad_request(format!("customer_id {} does not exist", request.customer_id)))?;
    customer
        .distance_km
        .ok_or_else(|| Error::bad_request(format!("distance_km is required: customer {} has no stored distance", customer.code)))
}

#[utoipa::path(
    get,
    path = "/trip-records",
    tag = "trip-records",
    summary = "List trip records",
    description = "List trips, newest first, filtered by vehicle, driver, customer and an inclusive date range.",
    params(ListTripRecordsQuery),
    responses(
        (status = 200, description = "Paginated list of trips", body = PaginatedResponse<TripRecordResponse>),
        (status = 400, description = "Invalid date range"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn list_trip_records(
    State(state): State<AppState>,
    Query(query): Query<ListTripRecordsQuery>,
) -> Result<Json<PaginatedResponse<TripRecordResponse>>> {
    check_date_range(query.from, query.to)?;

    let (skip, limit) = query.pagination.params();
    let filter = TripRecordFilter {
        search: query.search.clone(),
        vehicle_id: query.vehicle_id,
        driver_id: query.driver_id,
        customer_id: query.customer_id,
        from: query.from,
        to: query.to,
        ..TripRecordFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = TripRecords::new(&mut conn);
    let total = repo.count(&filter).await?;
    let trips = repo.list(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        trips.into_iter().map(Into::into).collect(),
        total,
        &query.pagination,
    )))
}

#[utoipa::path(
    get,
    path = "/trip-records/{id}",
    tag = "trip-records",
    summary = "Get trip record",
    params(("id" = i64, Path, description = "Trip record ID")),
    responses(
        (status = 200, description = "Trip details", body = TripRecordResponse),
        (status = 404, description = "Trip record not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn get_trip_record(State(state): State<AppState>, Path(id): Path<TripRecordId>) -> Result<Json<TripRecordResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let trip = TripRecords::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Trip record", id))?;
    Ok(Json(trip.into()))
}

#[utoipa::path(
    post,
    path = "/trip-records",
    tag = "trip-records",
    summary = "Record a trip",
    description = "Record a delivery trip. `distance_km` defaults to the customer's stored distance and \
                   `distance_rate` to the configured rate band for that distance.",
    request_body = TripRecordCreate,
    responses(
        (status = 201, description = "Trip recorded", body = TripRecordResponse),
        (status = 400, description = "Invalid request, unknown reference or no distance available"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn create_trip_record(
    State(state): State<AppState>,
    Json(request): Json<TripRecordCreate>,
) -> Result<(StatusCode, Json<TripRecordResponse>)> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let distance_km = resolve_distance(&mut conn, &request).await?;
    let distance_rate = request
        .distance_rate
        .or_else(|| lookup_rate(&state.config.distance_rates, distance_km))
        .unwrap_or(0.0);
    tracing::debug!(distance_km, distance_rate, "Resolved trip distance");

    let trip = TripRecords::new(&mut conn)
        .create(&TripRecordCreateDBRequest::new(request, distance_km, distance_rate))
        .await?;
    Ok((StatusCode::CREATED, Json(trip.into())))
}

#[utoipa::path(
    put,
    path = "/trip-records/{id}",
    tag = "trip-records",
    summary = "Update trip record",
    description = "Absent fields are left unchanged and `null` clears an optional field. Changing `distance_km` without a `distance_rate` re-applies the rate table.",
    params(("id" = i64, Path, description = "Trip record ID")),
    request_body = TripRecordUpdate,
    responses(
        (status = 200, description = "Trip updated", body = TripRecordResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Trip record not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn update_trip_record(
    State(state): State<AppState>,
    Path(id): Path<TripRecordId>,
    Json(request): Json<TripRecordUpdate>,
) -> Result<Json<TripRecordResponse>> {
    request.validate()?;

    let mut update = TripRecordUpdateDBRequest::from(request);
    if let Some(distance_km) = update.distance_km
        && update.distance_rate.is_none()
    {
        update.distance_rate = Some(lookup_rate(&state.config.distance_rates, distance_km).unwrap_or(0.0));
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let trip = TripRecords::new(&mut conn)
        .update(id, &update)
        .await
        .map_err(missing_as_not_found("Trip record", id))?;
    Ok(Json(trip.into()))
}

#[utoipa::path(
    delete,
    path = "/trip-records/{id}",
    tag = "trip-records",
    summary = "Delete trip record",
    params(("id" = i64, Path, description = "Trip record ID")),
    responses(
        (status = 204, description = "Trip deleted"),
        (status = 404, description = "Trip record not found"),
        (status = 409, description = "Trip has evaluations"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn delete_trip_record(State(state): State<AppState>, Path(id): Path<TripRecordId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if TripRecords::new(&mut conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Trip record", id))
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::{pagination::PaginatedResponse, trip_records::TripRecordResponse},
        test_utils::*,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_distance_and_rate_default_from_customer_and_rate_table(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let app = create_test_app(pool).await;

        let response = app
            .post("/admin/api/v1/trip-records")
            .json(&json!({
                "trip_date": "2026-03-04",
                "vehicle_id": fixtures.vehicle_id,
                "driver_id": fixtures.driver_id,
                "customer_id": fixtures.customer_id,
                "fuel_expense": 120.0,
                "allowance": 80.0
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let trip: TripRecordResponse = response.json();
        assert_eq!(trip.distance_km, SEED_CUSTOMER_DISTANCE_KM);
        assert_eq!(trip.distance_rate, 1000.0);
        assert_eq!(trip.total_expense, 200.0);
        assert_eq!(trip.customer_name, "Harbour Foods");
        assert_eq!(trip.vehicle_plate, "KX-1001");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_explicit_distance_picks_its_band(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let app = create_test_app(pool).await;

        let trip: TripRecordResponse = app
            .post("/admin/api/v1/trip-records")
            .json(&json!({
                "trip_date": "2026-03-05",
                "vehicle_id": fixtures.vehicle_id,
                "driver_id": fixtures.driver_id,
                "customer_id": fixtures.customer_id,
                "distance_km": 130.0
            }))
            .await
            .json();
        assert_eq!(trip.distance_rate, 3000.0);

        // Changing the distance re-applies the table unless a rate is given
        let updated: TripRecordResponse = app
            .patch(&format!("/admin/api/v1/trip-records/{}", trip.id))
            .json(&json!({"distance_km": 75.0}))
            .await
            .json();
        assert_eq!(updated.distance_rate, 1800.0);

        let updated: TripRecordResponse = app
            .patch(&format!("/admin/api/v1/trip-records/{}", trip.id))
            .json(&json!({"distance_km": 10.0, "distance_rate": 999.0}))
            .await
            .json();
        assert_eq!(updated.distance_rate, 999.0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_vehicle_is_bad_request(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let app = create_test_app(pool).await;

        app.post("/admin/api/v1/trip-records")
            .json(&json!({
                "trip_date": "2026-03-05",
                "vehicle_id": 9999,
                "driver_id": fixtures.driver_id,
                "customer_id": fixtures.customer_id,
                "distance_km": 10.0
            }))
            .await
            .assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_date_range(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        {
            use crate::db::handlers::{Repository, TripRecords};
            let mut conn = pool.acquire().await.unwrap();
            let mut repo = TripRecords::new(&mut conn);
            for date in ["2026-02-27", "2026-03-01", "2026-03-15", "2026-04-01"] {
                repo.create(&trip_request(&fixtures, date)).await.unwrap();
            }
        }
        let app = create_test_app(pool).await;

        let page: PaginatedResponse<TripRecordResponse> = app
            .get("/admin/api/v1/trip-records?from=2026-03-01&to=2026-03-31")
            .await
            .json();
        assert_eq!(page.total_count, 2);

        app.get("/admin/api/v1/trip-records?from=2026-04-01&to=2026-03-01")
            .await
            .assert_status_bad_request();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_empty_rate_table_prices_created_and_updated_trips_at_zero(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let mut config = create_test_config();
        config.distance_rates.clear();
        let app = create_test_app_with_config(pool, config).await;

        let trip: TripRecordResponse = app
            .post("/admin/api/v1/trip-records")
            .json(&json!({
                "trip_date": "2026-03-06",
                "vehicle_id": fixtures.vehicle_id,
                "driver_id": fixtures.driver_id,
                "customer_id": fixtures.customer_id,
                "distance_rate": 950.0
            }))
            .await
            .json();
        assert_eq!(trip.distance_rate, 950.0);

        let updated: TripRecordResponse = app
            .patch(&format!("/admin/api/v1/trip-records/{}", trip.id))
            .json(&json!({"distance_km": 60.0}))
            .await
            .json();
        assert_eq!(updated.distance_km, 60.0);
        assert_eq!(updated.distance_rate, 0.0);
    }
}
