//! Database repository for customers.

use std::collections::HashSet;

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::{Reference, Repository, ensure_unreferenced, push_search},
    models::customers::{CustomerCreateDBRequest, CustomerDBResponse, CustomerUpdateDBRequest},
};
use crate::types::CustomerId;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use tracing::instrument;

/// Filter for listing customers
#[derive(Debug, Clone, Default)]
pub struct CustomerFilter {
    pub skip: i64,
    pub limit: i64,
    /// Case-insensitive substring match on code, name, address or phone
    pub search: Option<String>,
    pub is_active: Option<bool>,
}

impl CustomerFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            skip,
            limit,
            ..Default::default()
        }
    }
}

const DELETE_GUARDS: &[Reference] = &[Reference::new("trip_records", "customer_id", "trip record(s)")];

pub struct Customers<'c> {
    db: &'c mut SqliteConnection,
}

fn push_filters(query: &mut QueryBuilder<'_, Sqlite>, filter: &CustomerFilter) {
    if let Some(ref search) = filter.search {
        push_search(
            query,
            &[
                "LOWER(code)",
                "LOWER(name)",
                "LOWER(COALESCE(address, ''))",
                "COALESCE(phone, '')",
            ],
            search,
        );
    }
    if let Some(is_active) = filter.is_active {
        query.push(" AND is_active = ");
        query.push_bind(is_active);
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Customers<'c> {
    type CreateRequest = CustomerCreateDBRequest;
    type UpdateRequest = CustomerUpdateDBRequest;
    type Response = CustomerDBResponse;
    type Id = CustomerId;
    type Filter = CustomerFilter;

    #[instrument(skip(self, request), fields(code = %request.code), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let customer = sqlx::query_as::<_, CustomerDBResponse>(
            r#"
            INSERT INTO customers (code, name, address, phone, tax_id, latitude, longitude, distance_km, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&request.code)
        .bind(&request.name)
        .bind(&request.address)
        .bind(&request.phone)
        .bind(&request.tax_id)
        .bind(request.latitude)
        .bind(request.longitude)
        .bind(request.distance_km)
        .bind(request.is_active)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(customer)
    }

    #[instrument(skip(self), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let customer = sqlx::query_as::<_, CustomerDBResponse>("SELECT * FROM customers WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(customer)
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = QueryBuilder::new("SELECT * FROM customers WHERE 1=1");
        push_filters(&mut query, filter);
        query.push(" ORDER BY code ASC LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let customers = query.build_query_as::<CustomerDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(customers)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &Self::Filter) -> Result<i64> {
        let mut query = QueryBuilder::new("SELECT COUNT(*) FROM customers WHERE 1=1");
        push_filters(&mut query, filter);
        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }

    #[instrument(skip(self), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        ensure_unreferenced(self.db, "customer", id, DELETE_GUARDS).await?;
        let result = sqlx::query("DELETE FROM customers WHERE id = ?").bind(id).execute(&mut *self.db).await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let customer = sqlx::query_as::<_, CustomerDBResponse>(
            r#"
            UPDATE customers SET
                code = COALESCE(?, code),
                name = COALESCE(?, name),
                address = CASE WHEN ? THEN ? ELSE address END,
                phone = CASE WHEN ? THEN ? ELSE phone END,
                tax_id = CASE WHEN ? THEN ? ELSE tax_id END,
                latitude = CASE WHEN ? THEN ? ELSE latitude END,
                longitude = CASE WHEN ? THEN ? ELSE longitude END,
                distance_km = CASE WHEN ? THEN ? ELSE distance_km END,
                is_active = COALESCE(?, is_active),
                updated_at = strftime('%Y-%m-%dT%H:%M:%fZ', 'now')
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&request.code)
        .bind(&request.name)
        .bind(request.address.is_some())
        .bind(request.address.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.phone.is_some())
        .bind(request.phone.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.tax_id.is_some())
        .bind(request.tax_id.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.latitude.is_some())
        .bind(request.latitude.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.longitude.is_some())
        .bind(request.longitude.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.distance_km.is_some())
        .bind(request.distance_km.as_ref().and_then(|inner| inner.as_ref()))
        .bind(request.is_active)
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(customer)
    }
}

impl<'c> Customers<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), err)]
    pub async fn get_by_code(&mut self, code: &str) -> Result<Option<CustomerDBResponse>> {
        let customer = sqlx::query_as::<_, CustomerDBResponse>("SELECT * FROM customers WHERE code = ?")
            .bind(code)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(customer)
    }

    /// Return the subset of `codes` that already exist.
    #[instrument(skip(self, codes), fields(count = codes.len()), err)]
    pub async fn existing_codes(&mut self, codes: &[String]) -> Result<HashSet<String>> {
        if codes.is_empty() {
            return Ok(HashSet::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new("SELECT code FROM customers WHERE code IN (");
        let mut separated = query.separated(", ");
        for code in codes {
            separated.push_bind(code);
        }
        separated.push_unseparated(")");

        let rows: Vec<(String,)> = query.build_query_as().fetch_all(&mut *self.db).await?;
        Ok(rows.into_iter().map(|(code,)| code).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::handlers::{TripRecords, Vehicles};
    use crate::test_utils::*;
    use sqlx::SqlitePool;

    fn customer(code: &str, name: &str) -> CustomerCreateDBRequest {
        CustomerCreateDBRequest {
            code: code.to_string(),
            name: name.to_string(),
            address: Some("12 Harbour Road".to_string()),
            phone: None,
            tax_id: None,
            latitude: None,
            longitude: None,
            distance_km: Some(42.5),
            is_active: true,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_get_customer(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Customers::new(&mut conn);

        let created = repo.create(&customer("C001", "Acme Freight")).await.unwrap();
        assert_eq!(created.code, "C001");
        assert!(created.is_active);

        let fetched = repo.get_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Acme Freight");
        assert_eq!(fetched.distance_km, Some(42.5));

        let by_code = repo.get_by_code("C001").await.unwrap().unwrap();
        assert_eq!(by_code.id, created.id);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_code_is_unique_violation(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Customers::new(&mut conn);

        repo.create(&customer("C001", "First")).await.unwrap();
        let err = repo.create(&customer("C001", "Second")).await.unwrap_err();

        match err {
            DbError::UniqueViolation { table, column, .. } => {
                assert_eq!(table.as_deref(), Some("customers"));
                assert_eq!(column.as_deref(), Some("code"));
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_search_and_status(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Customers::new(&mut conn);

        repo.create(&customer("C001", "Acme Freight")).await.unwrap();
        repo.create(&customer("C002", "Blue Harbour Co")).await.unwrap();
        let mut inactive = customer("C003", "Acme Storage");
        inactive.is_active = false;
        repo.create(&inactive).await.unwrap();

        let filter = CustomerFilter {
            search: Some("ACME".to_string()),
            ..CustomerFilter::new(0, 10)
        };
        assert_eq!(repo.list(&filter).await.unwrap().len(), 2);
        assert_eq!(repo.count(&filter).await.unwrap(), 2);

        let filter = CustomerFilter {
            search: Some("acme".to_string()),
            is_active: Some(true),
            ..CustomerFilter::new(0, 10)
        };
        let active = repo.list(&filter).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].code, "C001");

        // Pagination respects ordering by code
        let page = repo.list(&CustomerFilter::new(1, 1)).await.unwrap();
        assert_eq!(page[0].code, "C002");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_keeps_unspecified_fields(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Customers::new(&mut conn);
        let created = repo.create(&customer("C001", "Acme")).await.unwrap();

        let updated = repo
            .update(
                created.id,
                &CustomerUpdateDBRequest {
                    name: Some("Acme Logistics".to_string()),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Acme Logistics");
        assert!(!updated.is_active);
        assert_eq!(updated.address.as_deref(), Some("12 Harbour Road"));

        let missing = repo.update(9999, &CustomerUpdateDBRequest::default()).await;
        assert!(matches!(missing, Err(DbError::NotFound)));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_existing_codes(pool: SqlitePool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Customers::new(&mut conn);
        repo.create(&customer("C001", "One")).await.unwrap();
        repo.create(&customer("C002", "Two")).await.unwrap();

        let existing = repo
            .existing_codes(&["C001".to_string(), "C009".to_string(), "C002".to_string()])
            .await
            .unwrap();
        assert_eq!(existing.len(), 2);
        assert!(existing.contains("C001"));
        assert!(!existing.contains("C009"));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_delete_refused_while_trips_reference_customer(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let mut conn = pool.acquire().await.unwrap();

        TripRecords::new(&mut conn)
            .create(&trip_request(&fixtures, "2026-03-02"))
            .await
            .unwrap();

        let err = Customers::new(&mut conn).delete(fixtures.customer_id).await.unwrap_err();
        assert!(matches!(err, DbError::ProtectedEntity { .. }));
        assert!(err.to_string().contains("1 trip record(s)"));

        // The vehicle is still there too; nothing was removed
        assert!(Vehicles::new(&mut conn).get_by_id(fixtures.vehicle_id).await.unwrap().is_some());
        assert!(Customers::new(&mut conn).get_by_id(fixtures.customer_id).await.unwrap().is_some());
    }
}
