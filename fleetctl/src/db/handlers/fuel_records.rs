//! Database repository for fuel records.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{Repository, push_search},
    models::fuel_records::{FuelRecordCreateDBRequest, FuelRecordDBResponse, FuelRecordUpdateDBRequest},
};
use crate::types::{DriverId, FuelRecordId, VehicleId};
use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

#[derive(Debug, Clone, Default)]
pub struct FuelRecordFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub vehicle_id: Option<VehicleId>,
    pub driver_id: Option<DriverId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl FuelRecordFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

const SELECT_JOINED: &str = r#"
    SELECT f.*,
           v.plate_number AS vehicle_plate,
           d.name AS driver_name
    FROM fuel_records f
    JOIN vehicles v ON v.id = f.vehicle_id
    LEFT JOIN drivers d ON d.id = f.driver_id
    WHERE 1=1"#;

pub struct FuelRecords<'c> {
    db: &'c mut SqliteConnection,
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &FuelRecordFilter) {
    if let Some(ref search) = filter.search {
        push_search(query, &["LOWER(COALESCE(f.station, ''))", "LOWER(v.plate_number)"], search);
    }
    if let Some(vehicle_id) = filter.vehicle_id {
        query.push(" AND f.vehicle_id = ");
        query.push_bind(vehicle_id);
    }
    if let Some(driver_id) = filter.driver_id {
        query.push(" AND f.driver_id = ");
        query.push_bind(driver_id);
    }
    if let Some(from) = filter.from {
        query.push(" AND f.fuel_date >= ");
        query.push_bind(from);
    }
    if let Some(to) = filter.to {
        query.push(" AND f.fuel_date <= ");
        query.push_bind(to);
    }
}

#[async_trait::async_trait]
impl<'c> Repository for FuelRecords<'c> {
    type CreateRequest = FuelRecordCreateDBRequest;
    type UpdateRequest = FuelRecordUpdateDBRequest;
    type Response = FuelRecordDBResponse;
    type Id = FuelRecordId;
    type Filter = FuelRecordFilter;

    #[instrument(skip(self, request), fields(vehicle_id = request.vehicle_id, fuel_date = %request.fuel_date), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id: FuelRecordId = sqlx::query_scalar(
            r#"
            INSERT INTO fuel_records (fuel_date, vehicle_id, driver_id, liters, price_per_liter, total_cost, odometer_km, station)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(request.fuel_date)
        .bind(request.vehicle_id)
        .bind(request.driver_id)
        .bind(request.liters)
        .bind(request.price_per_liter)
        .bind(request.total_cost)
        .bind(request.odometer_km)
        .bind(&request.station)
        .fetch_one(&mut *self.db)
        .await?;

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let mut query = QueryBuilder::<Sqlite>::new(SELECT_JOINED);
        query.push(" AND f.id = ");
        query.push_bind(id);
        Ok(query.build_query_as::<FuelRecordDBResponse>().fetch_optional(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(SELECT_JOINED);
        push_filters(&mut query, filter);
        query.push(" ORDER BY f.fuel_date DESC, f.id DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);
        Ok(query.build_query_as::<FuelRecordDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM fuel_records f JOIN vehicles v ON v.id = f.vehicle_id WHERE 1=1");
        push_filters(&mut query, filter);
        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM fuel_records WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        // Keep total_cost consistent when only liters or price change
        let recompute_total = request.total_cost.is_none() && (request.liters.is_some() || request.price_per_liter.is_some());
        let result = sqlx::query(
            r#"
            UPDATE fuel_records SET
                fuel_date = COALESCE(?, fuel_date),
                vehicle_id = COALESCE(?, vehicle_id),
                driver_id = CASE WHEN ? THEN ? ELSE driver_id END,
                liters = COALESCE(?, liters),
                price_per_liter = COALESCE(?, price_per_liter),
                total_cost = CASE
                    WHEN ? IS NOT NULL THEN ?
                    WHEN ? THEN ROUND(COALESCE(?, liters) * COALESCE(?, price_per_liter), 2)
                    ELSE total_cost
                END,
                odometer_km = CASE WHEN ? THEN ? ELSE odometer_km END,
                station = CASE WHEN ? THEN ? ELSE station END,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            "#,
        )
        .bind(request.fuel_date)
        .bind(request.vehicle_id)
        .bind(request.driver_id.is_some())
        .bind(request.driver_id.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.liters)
        .bind(request.price_per_liter)
        .bind(request.total_cost)
        .bind(request.total_cost)
        .bind(recompute_total)
        .bind(request.liters)
        .bind(request.price_per_liter)
        .bind(request.odometer_km.is_some())
        .bind(request.odometer_km.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.station.is_some())
        .bind(request.station.as_ref().and_then(|inner| inner.as_ref()))
        .bind(id)
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }
}

impl<'c> FuelRecords<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Every record matching the filter, ignoring pagination, oldest first. Used by reports.
    #[instrument(skip(self, filter), err)]
    pub async fn list_all(&mut self, filter: &FuelRecordFilter) -> Result<Vec<FuelRecordDBResponse>> {
        let mut query = QueryBuilder::new(SELECT_JOINED);
        push_filters(&mut query, filter);
        query.push(" ORDER BY f.fuel_date ASC, f.id ASC");
        Ok(query.build_query_as::<FuelRecordDBResponse>().fetch_all(&mut *self.db).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::Drivers;
    use crate::test_utils::*;
    use sqlx::SqlitePool;

    fn fill_up(fixtures: &Fixtures, date: &str) -> FuelRecordCreateDBRequest {
        FuelRecordCreateDBRequest {
            fuel_date: date.parse().unwrap(),
            vehicle_id: fixtures.vehicle_id,
            driver_id: Some(fixtures.driver_id),
            liters: 40.0,
            price_per_liter: 1.5,
            total_cost: 60.0,
            odometer_km: Some(120_000.0),
            station: Some("Quayside Fuels".to_string()),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_price_change_recomputes_total(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = FuelRecords::new(&mut conn);
        let record = repo.create(&fill_up(&fixtures, "2026-03-03")).await.unwrap();
        assert_eq!(record.vehicle_plate, "KX-1001");

        let updated = repo
            .update(
                record.id,
                &FuelRecordUpdateDBRequest {
                    price_per_liter: Some(2.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.total_cost, 80.0);

        let explicit = repo
            .update(
                record.id,
                &FuelRecordUpdateDBRequest {
                    liters: Some(10.0),
                    total_cost: Some(25.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(explicit.total_cost, 25.0);
        assert_eq!(explicit.station.as_deref(), Some("Quayside Fuels"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_fuel_record_blocks_driver_delete(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        FuelRecords::new(&mut conn).create(&fill_up(&fixtures, "2026-03-03")).await.unwrap();

        let err = Drivers::new(&mut conn).delete(fixtures.driver_id).await.unwrap_err();
        assert!(err.to_string().contains("1 fuel record(s)"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_filter_by_vehicle_and_dates(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = FuelRecords::new(&mut conn);
        repo.create(&fill_up(&fixtures, "2026-03-03")).await.unwrap();
        repo.create(&fill_up(&fixtures, "2026-04-03")).await.unwrap();

        let filter = FuelRecordFilter {
            vehicle_id: Some(fixtures.vehicle_id),
            to: NaiveDate::from_ymd_opt(2026, 3, 31),
            ..FuelRecordFilter::new(0, 10)
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 1);
        assert_eq!(repo.list_all(&filter).await.unwrap().len(), 1);
    }
}
