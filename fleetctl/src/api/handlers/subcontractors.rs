use crate::{
    AppState,
    api::models::{
        pagination::PaginatedResponse,
        subcontractors::{ListSubcontractorsQuery, SubcontractorCreate, SubcontractorResponse, SubcontractorUpdate},
    },
    db::{
        handlers::{Repository, Subcontractors, subcontractors::SubcontractorFilter},
        models::subcontractors::{SubcontractorCreateDBRequest, SubcontractorUpdateDBRequest},
    },
    errors::{Error, Result},
    types::SubcontractorId,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};

use super::missing_as_not_found;

#[utoipa::path(
    get,
    path = "/subcontractors",
    tag = "subcontractors",
    summary = "List subcontractors",
    params(ListSubcontractorsQuery),
    responses(
        (status = 200, description = "Paginated list of subcontractors", body = PaginatedResponse<SubcontractorResponse>),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn list_subcontractors(
    State(state): State<AppState>,
    Query(query): Query<ListSubcontractorsQuery>,
) -> Result<Json<PaginatedResponse<SubcontractorResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = SubcontractorFilter {
        search: query.search.clone(),
        is_active: query.status.unwrap_or_default().is_active(),
        ..SubcontractorFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Subcontractors::new(&mut conn);
    let total = repo.count(&filter).await?;
    let subcontractors = repo.list(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        subcontractors.into_iter().map(Into::into).collect(),
        total,
        &query.pagination,
    )))
}

#[utoipa::path(
    get,
    path = "/subcontractors/{id}",
    tag = "subcontractors",
    summary = "Get subcontractor",
    params(("id" = i64, Path, description = "Subcontractor ID")),
    responses(
        (status = 200, description = "Subcontractor details", body = SubcontractorResponse),
        (status = 404, description = "Subcontractor not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn get_subcontractor(State(state): State<AppState>, Path(id): Path<SubcontractorId>) -> Result<Json<SubcontractorResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let subcontractor = Subcontractors::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Subcontractor", id))?;
    Ok(Json(subcontractor.into()))
}

#[utoipa::path(
    post,
    path = "/subcontractors",
    tag = "subcontractors",
    summary = "Create subcontractor",
    request_body = SubcontractorCreate,
    responses(
        (status = 201, description = "Subcontractor created", body = SubcontractorResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Subcontractor code already exists"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn create_subcontractor(
    State(state): State<AppState>,
    Json(request): Json<SubcontractorCreate>,
) -> Result<(StatusCode, Json<SubcontractorResponse>)> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let subcontractor = Subcontractors::new(&mut conn)
        .create(&SubcontractorCreateDBRequest::from(request))
        .await?;
    Ok((StatusCode::CREATED, Json(subcontractor.into())))
}

#[utoipa::path(
    put,
    path = "/subcontractors/{id}",
    tag = "subcontractors",
    summary = "Update subcontractor",
    params(("id" = i64, Path, description = "Subcontractor ID")),
    request_body = SubcontractorUpdate,
    responses(
        (status = 200, description = "Subcontractor updated", body = SubcontractorResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Subcontractor not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn update_subcontractor(
    State(state): State<AppState>,
    Path(id): Path<SubcontractorId>,
    Json(request): Json<SubcontractorUpdate>,
) -> Result<Json<SubcontractorResponse>> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let subcontractor = Subcontractors::new(&mut conn)
        .update(id, &SubcontractorUpdateDBRequest::from(request))
        .await
        .map_err(missing_as_not_found("Subcontractor", id))?;
    Ok(Json(subcontractor.into()))
}

#[utoipa::path(
    delete,
    path = "/subcontractors/{id}",
    tag = "subcontractors",
    summary = "Delete subcontractor",
    params(("id" = i64, Path, description = "Subcontractor ID")),
    responses(
        (status = 204, description = "Subcontractor deleted"),
        (status = 404, description = "Subcontractor not found"),
        (status = 409, description = "Subcontractor still has drivers, vehicles or evaluations"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn delete_subcontractor(State(state): State<AppState>, Path(id): Path<SubcontractorId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Subcontractors::new(&mut conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Subcontractor", id))
    }
}

#[cfg(test)]
mod tests {
    use crate::{api::models::subcontractors::SubcontractorResponse, test_utils::*};
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_reports_every_reference(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let app = create_test_app(pool).await;

        let response = app
            .delete(&format!("/admin/api/v1/subcontractors/{}", fixtures.subcontractor_id))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: serde_json::Value = response.json();
        let message = body["error"]["message"].as_str().unwrap();
        assert!(message.contains("1 driver(s)"), "{message}");
        assert!(message.contains("1 vehicle(s)"), "{message}");

        app.get(&format!("/admin/api/v1/subcontractors/{}", fixtures.subcontractor_id))
            .await
            .assert_status_ok();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deactivate_then_filter(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let app = create_test_app(pool).await;

        let response = app
            .patch(&format!("/admin/api/v1/subcontractors/{}", fixtures.subcontractor_id))
            .json(&json!({"is_active": false}))
            .await;
        response.assert_status_ok();
        let updated: SubcontractorResponse = response.json();
        assert!(!updated.is_active);
        assert_eq!(updated.name, "Northline Haulage");

        let body: serde_json::Value = app.get("/admin/api/v1/subcontractors?status=active").await.json();
        assert_eq!(body["total_count"], 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_missing_subcontractor_is_not_found(pool: SqlitePool) {
        let app = create_test_app(pool).await;
        app.get("/admin/api/v1/subcontractors/77").await.assert_status_not_found();
        app.delete("/admin/api/v1/subcontractors/77").await.assert_status_not_found();
    }
}
