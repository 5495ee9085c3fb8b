use crate::{
    AppState,
    api::models::{
        items::{ItemCreate, ItemResponse, ItemUpdate, ListItemsQuery},
        pagination::PaginatedResponse,
    },
    db::{
        handlers::{Items, Repository, items::ItemFilter},
        models::items::{ItemCreateDBRequest, ItemUpdateDBRequest},
    },
    errors::{Error, Result},
    types::ItemId,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};

use super::missing_as_not_found;

#[utoipa::path(
    get,
    path = "/items",
    tag = "items",
    summary = "List items",
    params(ListItemsQuery),
    responses(
        (status = 200, description = "Paginated list of items", body = PaginatedResponse<ItemResponse>),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ListItemsQuery>,
) -> Result<Json<PaginatedResponse<ItemResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = ItemFilter {
        search: query.search.clone(),
        is_active: query.status.unwrap_or_default().is_active(),
        ..ItemFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Items::new(&mut conn);
    let total = repo.count(&filter).await?;
    let items = repo.list(&filter).await?;

    let base_url = &state.config.uploads.public_base_url;
    Ok(Json(PaginatedResponse::new(
        items
            .into_iter()
            .map(|d| ItemResponse::from(d).with_image_url(base_url))
            .collect(),
        total,
        &query.pagination,
    )))
}

#[utoipa::path(
    get,
    path = "/items/{id}",
    tag = "items",
    summary = "Get item",
    params(("id" = i64, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item details", body = ItemResponse),
        (status = 404, description = "Item not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn get_item(State(state): State<AppState>, Path(id): Path<ItemId>) -> Result<Json<ItemResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let item = Items::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Item", id))?;
    Ok(Json(ItemResponse::from(item).with_image_url(&state.config.uploads.public_base_url)))
}

#[utoipa::path(
    post,
    path = "/items",
    tag = "items",
    summary = "Create item",
    request_body = ItemCreate,
    responses(
        (status = 201, description = "Item created", body = ItemResponse),
        (status = 400, description = "Invalid request or unknown reference"),
        (status = 409, description = "Item code already exists"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn create_item(State(state): State<AppState>, Json(request): Json<ItemCreate>) -> Result<(StatusCode, Json<ItemResponse>)> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let item = Items::new(&mut conn).create(&ItemCreateDBRequest::from(request)).await?;
    Ok((
        StatusCode::CREATED,
        Json(ItemResponse::from(item).with_image_url(&state.config.uploads.public_base_url)),
    ))
}

#[utoipa::path(
    put,
    path = "/items/{id}",
    tag = "items",
    summary = "Update item",
    params(("id" = i64, Path, description = "Item ID")),
    request_body = ItemUpdate,
    responses(
        (status = 200, description = "Item updated", body = ItemResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Item not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
    Json(request): Json<ItemUpdate>,
) -> Result<Json<ItemResponse>> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let item = Items::new(&mut conn)
        .update(id, &ItemUpdateDBRequest::from(request))
        .await
        .map_err(missing_as_not_found("Item", id))?;
    Ok(Json(ItemResponse::from(item).with_image_url(&state.config.uploads.public_base_url)))
}

#[utoipa::path(
    delete,
    path = "/items/{id}",
    tag = "items",
    summary = "Delete item",
    params(("id" = i64, Path, description = "Item ID")),
    responses(
        (status = 204, description = "Item deleted"),
        (status = 404, description = "Item not found"),
        (status = 409, description = "Item is used by trip records"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn delete_item(State(state): State<AppState>, Path(id): Path<ItemId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Items::new(&mut conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Item", id))
    }
}

#[cfg(test)]
mod tests {
    use crate::{api::models::items::ItemResponse, test_utils::*};
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_item_crud(pool: SqlitePool) {
        let app = create_test_app(pool).await;

        let response = app
            .post("/admin/api/v1/items")
            .json(&json!({"code": "cem50", "name": "Cement 50kg bag", "unit": "bag", "image_path": "/items/cem.webp"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let item: ItemResponse = response.json();
        assert_eq!(item.code, "CEM50");
        assert_eq!(item.image_url.as_deref(), Some("/files/images/items/cem.webp"));

        let response = app
            .put(&format!("/admin/api/v1/items/{}", item.id))
            .json(&json!({"unit_weight_kg": 50.0}))
            .await;
        response.assert_status_ok();
        let updated: ItemResponse = response.json();
        assert_eq!(updated.unit_weight_kg, Some(50.0));
        assert_eq!(updated.unit, "bag");

        app.delete(&format!("/admin/api/v1/items/{}", item.id))
            .await
            .assert_status(StatusCode::NO_CONTENT);
        app.delete(&format!("/admin/api/v1/items/{}", item.id))
            .await
            .assert_status_not_found();
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_blank_unit_is_rejected(pool: SqlitePool) {
        let app = create_test_app(pool).await;
        app.post("/admin/api/v1/items")
            .json(&json!({"code": "X1", "name": "Thing", "unit": " "}))
            .await
            .assert_status_bad_request();
    }
}
