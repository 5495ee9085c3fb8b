//! Database repository for vehicles.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{Reference, Repository, ensure_unreferenced, push_search},
    models::vehicles::{VehicleCreateDBRequest, VehicleDBResponse, VehicleUpdateDBRequest},
};
use crate::types::{SubcontractorId, VehicleId};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

#[derive(Debug, Clone, Default)]
pub struct VehicleFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub is_active: Option<bool>,
    pub subcontractor_id: Option<SubcontractorId>,
}

impl VehicleFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

const DELETE_GUARDS: &[Reference] = &[
    Reference::new("trip_records", "vehicle_id", "trip record(s)"),
    Reference::new("fuel_records", "vehicle_id", "fuel record(s)"),
    Reference::new("evaluations", "vehicle_id", "evaluation(s)"),
];

pub struct Vehicles<'c> {
    db: &'c mut SqliteConnection,
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &VehicleFilter) {
    if let Some(ref search) = filter.search {
        push_search(query, &["LOWER(plate_number)", "LOWER(vehicle_type)", "LOWER(COALESCE(brand, ''))"], search);
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
impl<'c> Repository for Vehicles<'c> {
    type CreateRequest = VehicleCreateDBRequest;
    type UpdateRequest = VehicleUpdateDBRequest;
    type Response = VehicleDBResponse;
    type Id = VehicleId;
    type Filter = VehicleFilter;

    #[instrument(skip(self, request), fields(plate_number = %request.plate_number), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let vehicle = sqlx::query_as::<_, VehicleDBResponse>(
            r#"
            INSERT INTO vehicles (plate_number, vehicle_type, brand, capacity_kg, image_path, driver_id, subcontractor_id, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&request.plate_number)
        .bind(&request.vehicle_type)
        .bind(&request.brand)
        .bind(request.capacity_kg)
        .bind(&request.image_path)
        .bind(request.driver_id)
        .bind(request.subcontractor_id)
        .bind(request.is_active)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(vehicle)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let vehicle = sqlx::query_as::<_, VehicleDBResponse>("SELECT * FROM vehicles WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(vehicle)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM vehicles WHERE 1=1");
        push_filters(&mut query, filter);
        query.push(" ORDER BY plate_number ASC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);
        Ok(query.build_query_as::<VehicleDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM vehicles WHERE 1=1");
        push_filters(&mut query, filter);
        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        ensure_unreferenced(self.db, "vehicle", id, DELETE_GUARDS).await?;
        let result = sqlx::query("DELETE FROM vehicles WHERE id = ?").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let vehicle = sqlx::query_as::<_, VehicleDBResponse>(
            r#"
            UPDATE vehicles SET
                plate_number = COALESCE(?, plate_number),
                vehicle_type = COALESCE(?, vehicle_type),
                brand = CASE WHEN ? THEN ? ELSE brand END,
                capacity_kg = CASE WHEN ? THEN ? ELSE capacity_kg END,
                image_path = CASE WHEN ? THEN ? ELSE image_path END,
                driver_id = CASE WHEN ? THEN ? ELSE driver_id END,
                subcontractor_id = CASE WHEN ? THEN ? ELSE subcontractor_id END,
                is_active = COALESCE(?, is_active),
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&request.plate_number)
        .bind(&request.vehicle_type)
        .bind(request.brand.is_some())
        .bind(request.brand.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.capacity_kg.is_some())
        .bind(request.capacity_kg.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.image_path.is_some())
        .bind(request.image_path.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.driver_id.is_some())
        .bind(request.driver_id.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.subcontractor_id.is_some())
        .bind(request.subcontractor_id.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.is_active)
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(vehicle)
    }
}

impl<'c> Vehicles<'c> {
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
    async fn test_duplicate_plate_is_unique_violation(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Vehicles::new(&mut conn);

        let existing = repo.get_by_id(fixtures.vehicle_id).await.unwrap().unwrap();
        let err = repo
            .create(&VehicleCreateDBRequest {
                plate_number: existing.plate_number,
                vehicle_type: "Van".to_string(),
                brand: None,
                capacity_kg: None,
                image_path: None,
                driver_id: None,
                subcontractor_id: None,
                is_active: true,
            })
            .await
            .unwrap_err();
        match err {
            DbError::UniqueViolation { column, .. } => assert_eq!(column.as_deref(), Some("plate_number")),
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_soft_delete_then_hard_delete(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Vehicles::new(&mut conn);

        let updated = repo
            .update(
                fixtures.vehicle_id,
                &VehicleUpdateDBRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.is_active);

        let active = VehicleFilter {
            is_active: Some(true),
            ..VehicleFilter::new(0, 10)
        };
        assert_eq!(repo.count(&active).await.unwrap(), 0);

        // No trips, fuel or evaluations reference it yet
        assert!(repo.delete(fixtures.vehicle_id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_distinguishes_absent_from_null(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Vehicles::new(&mut conn);

        let kept = repo
            .update(
                fixtures.vehicle_id,
                &VehicleUpdateDBRequest {
                    brand: Some(Some("Hino".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(kept.brand.as_deref(), Some("Hino"));
        assert_eq!(kept.driver_id, Some(fixtures.driver_id));

        let cleared = repo
            .update(
                fixtures.vehicle_id,
                &VehicleUpdateDBRequest {
                    driver_id: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.driver_id, None);
        assert_eq!(cleared.brand.as_deref(), Some("Hino"));
        assert_eq!(cleared.subcontractor_id, Some(fixtures.subcontractor_id));
    }
}
