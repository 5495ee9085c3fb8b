//! Database repository for drivers.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{Reference, Repository, ensure_unreferenced, push_search},
    models::drivers::{DriverCreateDBRequest, DriverDBResponse, DriverUpdateDBRequest},
};
use crate::types::{DriverId, SubcontractorId};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

#[derive(Debug, Clone, Default)]
pub struct DriverFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub subcontractor_id: Option<SubcontractorId>,
}

impl DriverFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

const DELETE_GUARDS: &[Reference] = &[
    Reference::new("vehicles", "driver_id", "vehicle(s)"),
    Reference::new("trip_records", "driver_id", "trip record(s)"),
    Reference::new("fuel_records", "driver_id", "fuel record(s)"),
    Reference::new("evaluations", "driver_id", "evaluation(s)"),
];

pub struct Drivers<'c> {
    db: &'c mut SqliteConnection,
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &DriverFilter) {
    if let Some(ref search) = filter.search {
        push_search(
            query,
            &[
                "LOWER(code)",
                "LOWER(name)",
                "COALESCE(phone, '')",
                "LOWER(COALESCE(license_number, ''))",
            ],
            search,
        );
    }
    if let Some(is_active) = filter.is_active {
        query.push(" AND is_active = ");
        query.push_bind(is_active);
    }
    if let Some(subcontractor_id) = filter.subcontractor_id {
        query.push(" AND subcontractor_id = ");
        query.push_bind(subcontractor_id);
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Drivers<'c> {
    type CreateRequest = DriverCreateDBRequest;
    type UpdateRequest = DriverUpdateDBRequest;
    type Response = DriverDBResponse;
    type Id = DriverId;
    type Filter = DriverFilter;

    #[instrument(skip(self, request), fields(code = %request.code), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let driver = sqlx::query_as::<_, DriverDBResponse>(
            r#"
            INSERT INTO drivers (code, name, phone, license_number, image_path, subcontractor_id, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&request.code)
        .bind(&request.name)
        .bind(&request.phone)
        .bind(&request.license_number)
        .bind(&request.image_path)
        .bind(request.subcontractor_id)
        .bind(request.is_active)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(driver)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let driver = sqlx::query_as::<_, DriverDBResponse>("SELECT * FROM drivers WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(driver)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM drivers WHERE 1=1");
        push_filters(&mut query, filter);
        query.push(" ORDER BY code ASC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);
        Ok(query.build_query_as::<DriverDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM drivers WHERE 1=1");
        push_filters(&mut query, filter);
        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        ensure_unreferenced(self.db, "driver", id, DELETE_GUARDS).await?;
        let result = sqlx::query("DELETE FROM drivers WHERE id = ?").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let driver = sqlx::query_as::<_, DriverDBResponse>(
            r#"
            UPDATE drivers SET
                code = COALESCE(?, code),
                name = COALESCE(?, name),
                phone = CASE WHEN ? THEN ? ELSE phone END,
                license_number = CASE WHEN ? THEN ? ELSE license_number END,
                image_path = CASE WHEN ? THEN ? ELSE image_path END,
                subcontractor_id = CASE WHEN ? THEN ? ELSE subcontractor_id END,
                is_active = COALESCE(?, is_active),
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&request.code)
        .bind(&request.name)
        .bind(request.phone.is_some())
        .bind(request.phone.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.license_number.is_some())
        .bind(request.license_number.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.image_path.is_some())
        .bind(request.image_path.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.subcontractor_id.is_some())
        .bind(request.subcontractor_id.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.is_active)
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(driver)
    }
}

impl<'c> Drivers<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_driver_assigned_to_vehicle_is_refused(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Drivers::new(&mut conn);

        let err = repo.delete(fixtures.driver_id).await.unwrap_err();
        match &err {
            DbError::ProtectedEntity { entity_type, reason, .. } => {
                assert_eq!(entity_type, "driver");
                assert!(reason.contains("1 vehicle(s)"));
            }
            other => panic!("expected protected entity, got {other:?}"),
        }

        // Driver is still present and unchanged
        let driver = repo.get_by_id(fixtures.driver_id).await.unwrap().unwrap();
        assert!(driver.is_active);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_unknown_subcontractor_is_foreign_key_violation(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let err = Drivers::new(&mut conn)
            .create(&DriverCreateDBRequest {
                code: "D100".to_string(),
                name: "Nobody".to_string(),
                phone: None,
                license_number: None,
                image_path: None,
                subcontractor_id: Some(4242),
                is_active: true,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }), "{err:?}");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_filter_by_subcontractor(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Drivers::new(&mut conn);

        let filter = DriverFilter {
            subcontractor_id: Some(fixtures.subcontractor_id),
            ..DriverFilter::new(0, 10)
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 1);

        let filter = DriverFilter {
            subcontractor_id: Some(fixtures.subcontractor_id + 1),
            ..DriverFilter::new(0, 10)
        };
        assert!(repo.list(&filter).await.unwrap().is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_treats_wildcards_literally(pool: SqlitePool) {
        seed_fleet(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Drivers::new(&mut conn);
        repo.create(&DriverCreateDBRequest {
            code: "D_200".to_string(),
            name: "Lena 100% Reliable".to_string(),
            phone: None,
            license_number: None,
            image_path: None,
            subcontractor_id: None,
            is_active: true,
        })
        .await
        .unwrap();

        let search = |term: &str| DriverFilter {
            search: Some(term.to_string()),
            ..DriverFilter::new(0, 10)
        };
        let percent = repo.list(&search("%")).await.unwrap();
        assert_eq!(percent.len(), 1);
        assert_eq!(percent[0].code, "D_200");

        let underscore = repo.list(&search("d_")).await.unwrap();
        assert_eq!(underscore.len(), 1);
        assert_eq!(underscore[0].code, "D_200");

        assert_eq!(repo.count(&search("okafor")).await.unwrap(), 1);
    }
}
