//! Database repository for items.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{Reference, Repository, ensure_unreferenced, push_search},
    models::items::{ItemCreateDBRequest, ItemDBResponse, ItemUpdateDBRequest},
};
use crate::types::ItemId;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

#[derive(Debug, Clone, Default)]
pub struct ItemFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

impl ItemFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

const DELETE_GUARDS: &[Reference] = &[Reference::new("trip_records", "item_id", "trip record(s)")];

pub struct Items<'c> {
    db: &'c mut SqliteConnection,
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &ItemFilter) {
    if let Some(ref search) = filter.search {
        push_search(query, &["LOWER(code)", "LOWER(name)"], search);
    }
    if let Some(is_active) = filter.is_active {
        query.push(" AND is_active = ");
        query.push_bind(is_active);
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Items<'c> {
    type CreateRequest = ItemCreateDBRequest;
    type UpdateRequest = ItemUpdateDBRequest;
    type Response = ItemDBResponse;
    type Id = ItemId;
    type Filter = ItemFilter;

    #[instrument(skip(self, request), fields(code = %request.code), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let item = sqlx::query_as::<_, ItemDBResponse>(
            "INSERT INTO items (code, name, unit, unit_weight_kg, image_path, is_active) VALUES (?, ?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&request.code)
        .bind(&request.name)
        .bind(&request.unit)
        .bind(request.unit_weight_kg)
        .bind(&request.image_path)
        .bind(request.is_active)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(item)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let item = sqlx::query_as::<_, ItemDBResponse>("SELECT * FROM items WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(item)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM items WHERE 1=1");
        push_filters(&mut query, filter);
        query.push(" ORDER BY code ASC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);
        Ok(query.build_query_as::<ItemDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM items WHERE 1=1");
        push_filters(&mut query, filter);
        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        ensure_unreferenced(self.db, "item", id, DELETE_GUARDS).await?;
        let result = sqlx::query("DELETE FROM items WHERE id = ?").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let item = sqlx::query_as::<_, ItemDBResponse>(
            r#"
            UPDATE items SET
                code = COALESCE(?, code),
                name = COALESCE(?, name),
                unit = COALESCE(?, unit),
                unit_weight_kg = CASE WHEN ? THEN ? ELSE unit_weight_kg END,
                image_path = CASE WHEN ? THEN ? ELSE image_path END,
                is_active = COALESCE(?, is_active),
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&request.code)
        .bind(&request.name)
        .bind(&request.unit)
        .bind(request.unit_weight_kg.is_some())
        .bind(request.unit_weight_kg.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.image_path.is_some())
        .bind(request.image_path.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.is_active)
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(item)
    }
}

impl<'c> Items<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::SqlitePool;

    fn cement() -> ItemCreateDBRequest {
        ItemCreateDBRequest {
            code: "CEM50".to_string(),
            name: "Cement 50kg".to_string(),
            unit: "bag".to_string(),
            unit_weight_kg: Some(50.0),
            image_path: Some("items/cement.png".to_string()),
            is_active: true,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_negative_weight_is_check_violation(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut request = cement();
        request.unit_weight_kg = Some(-1.0);
        let err = Items::new(&mut conn).create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }), "{err:?}");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_and_delete_item(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Items::new(&mut conn);
        let item = repo.create(&cement()).await.unwrap();

        let updated = repo
            .update(
                item.id,
                &ItemUpdateDBRequest {
                    unit: Some("sack".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.unit, "sack");
        assert_eq!(updated.image_path.as_deref(), Some("items/cement.png"));

        assert!(repo.delete(item.id).await.unwrap());
        assert_eq!(repo.count(&ItemFilter::new(0, 10)).await.unwrap(), 0);
    }
}
