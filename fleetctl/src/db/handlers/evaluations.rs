//! Database repository for subcontractor evaluations.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{Repository, push_search},
    models::evaluations::{EvaluationCreateDBRequest, EvaluationDBResponse, EvaluationUpdateDBRequest},
};
use crate::types::{EvaluationId, SubcontractorId, VehicleId};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

#[derive(Debug, Clone, Default)]
pub struct EvaluationFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub subcontractor_id: Option<SubcontractorId>,
    pub vehicle_id: Option<VehicleId>,
    /// Calendar month, `YYYY-MM`
    pub month: Option<String>,
}

impl EvaluationFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

const SELECT_JOINED: &str = r#"
    SELECT e.*,
           s.name AS subcontractor_name,
           v.plate_number AS vehicle_plate,
           d.name AS driver_name
    FROM evaluations e
    JOIN subcontractors s ON s.id = e.subcontractor_id
    JOIN vehicles v ON v.id = e.vehicle_id
    LEFT JOIN drivers d ON d.id = e.driver_id
    WHERE 1=1"#;

pub struct Evaluations<'c> {
    db: &'c mut SqliteConnection,
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &EvaluationFilter) {
    if let Some(ref search) = filter.search {
        push_search(query, &["LOWER(COALESCE(e.remarks, ''))", "LOWER(v.plate_number)", "LOWER(s.name)"], search);
    }
    if let Some(subcontractor_id) = filter.subcontractor_id {
        query.push(" AND e.subcontractor_id = ");
        query.push_bind(subcontractor_id);
    }
    if let Some(vehicle_id) = filter.vehicle_id {
        query.push(" AND e.vehicle_id = ");
        query.push_bind(vehicle_id);
    }
    if let Some(ref month) = filter.month {
        query.push(" AND substr(e.evaluation_date, 1, 7) = ");
        query.push_bind(month.clone());
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Evaluations<'c> {
    type CreateRequest = EvaluationCreateDBRequest;
    type UpdateRequest = EvaluationUpdateDBRequest;
    type Response = EvaluationDBResponse;
    type Id = EvaluationId;
    type Filter = EvaluationFilter;

    #[instrument(skip(self, request), fields(vehicle_id = request.vehicle_id, evaluation_date = %request.evaluation_date), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id: EvaluationId = sqlx::query_scalar(
            r#"
            INSERT INTO evaluations (
                evaluation_date, subcontractor_id, vehicle_id, driver_id, trip_record_id,
                driver_cooperation, vehicle_condition, damage_found, damage_value, remarks
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(request.evaluation_date)
        .bind(request.subcontractor_id)
        .bind(request.vehicle_id)
        .bind(request.driver_id)
        .bind(request.trip_record_id)
        .bind(request.driver_cooperation)
        .bind(request.vehicle_condition)
        .bind(request.damage_found)
        .bind(request.damage_value)
        .bind(&request.remarks)
        .fetch_one(&mut *self.db)
        .await?;

        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let mut query = QueryBuilder::<Sqlite>::new(SELECT_JOINED);
        query.push(" AND e.id = ");
        query.push_bind(id);
        Ok(query.build_query_as::<EvaluationDBResponse>().fetch_optional(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new(SELECT_JOINED);
        push_filters(&mut query, filter);
        query.push(" ORDER BY e.evaluation_date DESC, e.id DESC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);
        Ok(query.build_query_as::<EvaluationDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new(
            r#"
            SELECT COUNT(*)
            FROM evaluations e
            JOIN subcontractors s ON s.id = e.subcontractor_id
            JOIN vehicles v ON v.id = e.vehicle_id
            WHERE 1=1"#,
        );
        push_filters(&mut query, filter);
        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM evaluations WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let result = sqlx::query(
            r#"
            UPDATE evaluations SET
                evaluation_date = COALESCE(?, evaluation_date),
                subcontractor_id = COALESCE(?, subcontractor_id),
                vehicle_id = COALESCE(?, vehicle_id),
                driver_id = CASE WHEN ? THEN ? ELSE driver_id END,
                trip_record_id = CASE WHEN ? THEN ? ELSE trip_record_id END,
                driver_cooperation = COALESCE(?, driver_cooperation),
                vehicle_condition = COALESCE(?, vehicle_condition),
                damage_found = COALESCE(?, damage_found),
                damage_value = COALESCE(?, damage_value),
                remarks = CASE WHEN ? THEN ? ELSE remarks END,
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            "#,
        )
        .bind(request.evaluation_date)
        .bind(request.subcontractor_id)
        .bind(request.vehicle_id)
        .bind(request.driver_id.is_some())
        .bind(request.driver_id.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.trip_record_id.is_some())
        .bind(request.trip_record_id.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.driver_cooperation)
        .bind(request.vehicle_condition)
        .bind(request.damage_found)
        .bind(request.damage_value)
        .bind(request.remarks.is_some())
        .bind(request.remarks.as_ref().and_then(|inner| inner.as_ref()))
        .bind(id)
        .execute(&mut *self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::NotFound);
        }
        self.get_by_id(id).await?.ok_or(DbError::NotFound)
    }
}

impl<'c> Evaluations<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Every evaluation in `month` (`YYYY-MM`), for scoring.
    ///
    /// Not filtered by subcontractor: damage rules look at the whole vehicle-month.
    #[instrument(skip(self), err)]
    pub async fn list_for_month(&mut self, month: &str) -> Result<Vec<EvaluationDBResponse>> {
        let mut query = QueryBuilder::<Sqlite>::new(SELECT_JOINED);
        query.push(" AND substr(e.evaluation_date, 1, 7) = ");
        query.push_bind(month.to_string());
        query.push(" ORDER BY e.vehicle_id ASC, e.evaluation_date ASC, e.id ASC");
        Ok(query.build_query_as::<EvaluationDBResponse>().fetch_all(&mut *self.db).await?)
    }
}
