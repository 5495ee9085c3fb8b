//! Database repository for subcontractors.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{Reference, Repository, ensure_unreferenced, push_search},
    models::subcontractors::{SubcontractorCreateDBRequest, SubcontractorDBResponse, SubcontractorUpdateDBRequest},
};
use crate::types::SubcontractorId;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

#[derive(Debug, Clone, Default)]
pub struct SubcontractorFilter {
    pub skip: i64,
    pub limit: i64,
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

impl SubcontractorFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

const DELETE_GUARDS: &[Reference] = &[
    Reference::new("drivers", "subcontractor_id", "driver(s)"),
    Reference::new("vehicles", "subcontractor_id", "vehicle(s)"),
    Reference::new("evaluations", "subcontractor_id", "evaluation(s)"),
];

pub struct Subcontractors<'c> {
    db: &'c mut SqliteConnection,
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &SubcontractorFilter) {
    if let Some(ref search) = filter.search {
        push_search(query, &["LOWER(code)", "LOWER(name)", "LOWER(COALESCE(contact_name, ''))"], search);
    }
    if let Some(is_active) = filter.is_active {
        query.push(" AND is_active = ");
        query.push_bind(is_active);
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Subcontractors<'c> {
    type CreateRequest = SubcontractorCreateDBRequest;
    type UpdateRequest = SubcontractorUpdateDBRequest;
    type Response = SubcontractorDBResponse;
    type Id = SubcontractorId;
    type Filter = SubcontractorFilter;

    #[instrument(skip(self, request), fields(code = %request.code), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let subcontractor = sqlx::query_as::<_, SubcontractorDBResponse>(
            "INSERT INTO subcontractors (code, name, contact_name, phone, is_active) VALUES (?, ?, ?, ?, ?) RETURNING *",
        )
        .bind(&request.code)
        .bind(&request.name)
        .bind(&request.contact_name)
        .bind(&request.phone)
        .bind(request.is_active)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(subcontractor)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let subcontractor = sqlx::query_as::<_, SubcontractorDBResponse>("SELECT * FROM subcontractors WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(subcontractor)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM subcontractors WHERE 1=1");
        push_filters(&mut query, filter);
        query.push(" ORDER BY code ASC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);
        Ok(query.build_query_as::<SubcontractorDBResponse>().fetch_all(&mut *self.db).await?)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM subcontractors WHERE 1=1");
        push_filters(&mut query, filter);
        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        ensure_unreferenced(self.db, "subcontractor", id, DELETE_GUARDS).await?;
        let result = sqlx::query("DELETE FROM subcontractors WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let subcontractor = sqlx::query_as::<_, SubcontractorDBResponse>(
            r#"
            UPDATE subcontractors SET
                code = COALESCE(?, code),
                name = COALESCE(?, name),
                contact_name = CASE WHEN ? THEN ? ELSE contact_name END,
                phone = CASE WHEN ? THEN ? ELSE phone END,
                is_active = COALESCE(?, is_active),
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&request.code)
        .bind(&request.name)
        .bind(request.contact_name.is_some())
        .bind(request.contact_name.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.phone.is_some())
        .bind(request.phone.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.is_active)
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;
        Ok(subcontractor)
    }
}

impl<'c> Subcontractors<'c> {
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
    async fn test_delete_unreferenced_subcontractor(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Subcontractors::new(&mut conn);
        let created = repo
            .create(&SubcontractorCreateDBRequest {
                code: "SUB09".to_string(),
                name: "Spare Carrier".to_string(),
                contact_name: None,
                phone: None,
                is_active: true,
            })
            .await
            .unwrap();

        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.get_by_id(created.id).await.unwrap().is_none());
        assert!(!repo.delete(created.id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_refused_while_drivers_and_vehicles_reference_it(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let mut conn = pool.acquire().await.unwrap();
        let err = Subcontractors::new(&mut conn).delete(fixtures.subcontractor_id).await.unwrap_err();
        let message = err.to_string();
        assert!(message.contains("1 driver(s)"), "{message}");
        assert!(message.contains("1 vehicle(s)"), "{message}");
        assert!(!message.contains("evaluation"), "{message}");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_search_matches_contact_name(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Subcontractors::new(&mut conn);
        repo.create(&SubcontractorCreateDBRequest {
            code: "SUB01".to_string(),
            name: "Northline".to_string(),
            contact_name: Some("Priya Raman".to_string()),
            phone: None,
            is_active: true,
        })
        .await
        .unwrap();

        let filter = SubcontractorFilter {
            search: Some("raman".to_string()),
            ..SubcontractorFilter::new(0, 10)
        };
        assert_eq!(repo.count(&filter).await.unwrap(), 1);
    }
}
