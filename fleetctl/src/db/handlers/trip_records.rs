//! Database repository for trip records.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{Reference, Repository, ensure_unreferenced, push_search},
    models::trip_records::{TripRecordCreateDBRequest, TripRecordDBResponse, TripRecordUpdateDBRequest},
};
use crate::types::{CustomerId, DriverId, TripRecordId, VehicleId};
use chrono::NaiveDate;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

#[derive(Debug, Clone, Default)]
pub struct TripRecordFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub vehicle_id: Option<VehicleId>,
    pub driver_id: Option<DriverId>,
    pub customer_id: Option<CustomerId>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl TripRecordFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

const DELETE_GUARDS: &[Reference] = &[Reference::new("evaluations", "trip_record_id", "evaluation(s)")];

const SELECT_JOINED: &str = r#"
    SELECT t.*,
           v.plate_number AS vehicle_plate,
           d.name AS driver_name,
           c.name AS customer_name,
           i.name AS item_name
    FROM trip_records t
    JOIN vehicles v ON v.id = t.vehicle_id
    JOIN drivers d ON d.id = t.driver_id
    JOIN customers c ON c.id = t.customer_id
    LEFT JOIN items i ON i.id = t.item_id
    WHERE 1=1"#;

pub struct TripRecords<'c> {
    db: &'c mut SqliteConnection,
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &TripRecordFilter) {
    if let Some(ref search) = filter.search {
        push_search(
            query,
            &[
                "LOWER(COALESCE(t.origin, ''))",
                "LOWER(COALESCE(t.destination, ''))",
                "LOWER(c.name)",
                "LOWER(v.plate_number)",
            ],
            search,
        );
    }
    if let Some(vehicle_id) = filter.vehicle_id {
        query.push(" AND t.vehicle_id = ");
        query.push_bind(vehicle_id);
    }
    if let Some(driver_id) = filter.driver_id {
        query.push(" AND t.driver_id = ");
        query.push_bind(driver_id);
    }
    if let Some(customer_id) = filter.customer_id {
        query.push(" AND t.customer_id = ");
        query.push_bind(customer_id);
    }
    if let Some(from) = filter.from {
        query.push(" AND t.trip_date >= ");
        query.push_bind(from);
    }
    if let Some(to) = filter.to {
        query.push(" AND t.trip_date <= ");
        query.push_bind(to);
    }
}

#[async_trait::async_trait]
impl<'c> Repository for TripRecords<'c> {
    type CreateRequest = TripRecordCreateDBRequest;
    type UpdateRequest = TripRecordUpdateDBRequest;
    type Response = TripRecordDBResponse;
    type Id = TripRecordId;
    type Filter = TripRecordFilter;

    #[instrument(skip(self, request), fields(vehicle_id = request.vehicle_id, trip_date = %request.trip_date), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id: TripRecordId = sqlx::query_scalar(
            r#"
            INSERT INTO trip_records (
                trip_date, vehicle_id, driver_id, customer_id, item_id, origin, destination,
                distance_km, distance_rate, fuel_expense, toll_expense, other_expense, allowance, notes
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(request.trip_date)
        .bind(request.vehicle_id)
        .bind(request.driver_id)
        .bind(request.customer_id)
        .bind(request.item_id)
        .bind(&request.origin)
        .bind(&request.destination)
        .bind(request.distance_km)
        .bind(request.distance_rate)
        .bind(request.fuel_expense)
        .bind(request.toll_expense)
        .bind(request.other_expense)
        .bind(request.allowance)
        .bind(&request.notes)
        .fetch_one(&mut *self.db)
        .await?;

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let mut query = QueryBuilder::<Sqlite>::new(SELECT_JOINED);
        query.push(" AND t.id = ");
        query.push_bind(id);
        let trip = query.build_query_as::<TripRecordDBResponse>().fetch_optional(&mut *self.db).await?;
        Ok(trip)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(SELECT_JOINED);
        push_filters(&mut query, filter);
        query.push(" ORDER BY t.trip_date DESC, t.id DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);
        Ok(query.build_query_as::<TripRecordDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new(
            r#"
            SELECT COUNT(*)
            FROM trip_records t
            JOIN vehicles v ON v.id = t.vehicle_id
            JOIN customers c ON c.id = t.customer_id
            WHERE 1=1"#,
        );
        push_filters(&mut query, filter);
        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        ensure_unreferenced(self.db, "trip record", id, DELETE_GUARDS).await?;
        let result = sqlx::query("DELETE FROM trip_records WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let result = sqlx::query(
            r#"
            UPDATE trip_records SET
                trip_date = COALESCE(?, trip_date),
                vehicle_id = COALESCE(?, vehicle_id),
                driver_id = COALESCE(?, driver_id),
                customer_id = COALESCE(?, customer_id),
                item_id = CASE WHEN ? THEN ? ELSE item_id END,
                origin = CASE WHEN ? THEN ? ELSE origin END,
                destination = CASE WHEN ? THEN ? ELSE destination END,
                distance_km = COALESCE(?, distance_km),
                distance_rate = COALESCE(?, distance_rate),
                fuel_expense = COALESCE(?, fuel_expense),
                toll_expense = COALESCE(?, toll_expense),
                other_expense = COALESCE(?, other_expense),
                allowance = COALESCE(?, allowance),
                notes = CASE WHEN ? THEN ? ELSE notes END,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            "#,
        )
        .bind(request.trip_date)
        .bind(request.vehicle_id)
        .bind(request.driver_id)
        .bind(request.customer_id)
        .bind(request.item_id.is_some())
        .bind(request.item_id.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.origin.is_some())
        .bind(request.origin.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.destination.is_some())
        .bind(request.destination.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.distance_km)
        .bind(request.distance_rate)
        .bind(request.fuel_expense)
        .bind(request.toll_expense)
        .bind(request.other_expense)
        .bind(request.allowance)
        .bind(request.notes.is_some())
        .bind(request.notes.as_ref().and_then(|inner| inner.as_ref()))
        .bind(id)
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }
}

impl<'c> TripRecords<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Every trip matching the filter, ignoring pagination, oldest first. Used by reports.
    #[instrument(skip(self, filter), err)]
    pub async fn list_all(&mut self, filter: &TripRecordFilter) -> Result<Vec<TripRecordDBResponse>> {
        let mut query = QueryBuilder::new(SELECT_JOINED);
        push_filters(&mut query, filter);
        query.push(" ORDER BY t.trip_date ASC, t.id ASC");
        Ok(query.build_query_as::<TripRecordDBResponse>().fetch_all(&mut *self.db).await?)
    }
}
