use crate::{
    AppState,
    api::models::{
        customers::{
            BulkDeleteRequest, BulkDeleteResponse, BulkRowError, CustomerCreate, CustomerResponse, CustomerUpdate, ListCustomersQuery,
        },
        imports::{CustomerImportRequest, ImportSummary},
        pagination::PaginatedResponse,
    },
    db::{
        handlers::{Customers, Repository, customers::CustomerFilter},
        models::customers::{CustomerCreateDBRequest, CustomerUpdateDBRequest},
    },
    errors::{Error, Result},
    imports::{Enrichment, import_customers as run_import},
    types::CustomerId,
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};

use super::missing_as_not_found;

#[utoipa::path(
    get,
    path = "/customers",
    tag = "customers",
    summary = "List customers",
    description = "List customers with pagination, search and an active-flag filter.",
    params(ListCustomersQuery),
    responses(
        (status = 200, description = "Paginated list of customers", body = PaginatedResponse<CustomerResponse>),
        (status = 400, description = "Invalid query parameters"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn list_customers(
    State(state): State<AppState>,
    Query(query): Query<ListCustomersQuery>,
) -> Result<Json<PaginatedResponse<CustomerResponse>>> {
    let (skip, limit) = query.pagination.params();
    let filter = CustomerFilter {
        search: query.search.clone(),
        is_active: query.status.unwrap_or_default().is_active(),
        ..CustomerFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Customers::new(&mut conn);
    let total = repo.count(&filter).await?;
    let customers = repo.list(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        customers.into_iter().map(CustomerResponse::from).collect(),
        total,
        &query.pagination,
    )))
}

#[utoipa::path(
    get,
    path = "/customers/{id}",
    tag = "customers",
    summary = "Get customer",
    params(("id" = i64, Path, description = "Customer ID")),
    responses(
        (status = 200, description = "Customer details", body = CustomerResponse),
        (status = 404, description = "Customer not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn get_customer(State(state): State<AppState>, Path(id): Path<CustomerId>) -> Result<Json<CustomerResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Customers::new(&mut conn);
    match repo.get_by_id(id).await? {
        Some(customer) => Ok(Json(customer.into())),
        None => Err(Error::not_found("Customer", id)),
    }
}

#[utoipa::path(
    post,
    path = "/customers",
    tag = "customers",
    summary = "Create customer",
    request_body = CustomerCreate,
    responses(
        (status = 201, description = "Customer created", body = CustomerResponse),
        (status = 400, description = "Invalid request"),
        (status = 409, description = "Customer code already exists"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(request): Json<CustomerCreate>,
) -> Result<(StatusCode, Json<CustomerResponse>)> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Customers::new(&mut conn);
    let customer = repo.create(&CustomerCreateDBRequest::from(request)).await?;
    Ok((StatusCode::CREATED, Json(customer.into())))
}

#[utoipa::path(
    put,
    path = "/customers/{id}",
    tag = "customers",
    summary = "Update customer",
    description = "Update a customer. Absent fields are left unchanged and `null` clears an optional field; PATCH behaves the same way.",
    params(("id" = i64, Path, description = "Customer ID")),
    request_body = CustomerUpdate,
    responses(
        (status = 200, description = "Customer updated", body = CustomerResponse),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Customer code already exists"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
    Json(request): Json<CustomerUpdate>,
) -> Result<Json<CustomerResponse>> {
    request.validate()?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Customers::new(&mut conn);
    let customer = repo
        .update(id, &CustomerUpdateDBRequest::from(request))
        .await
        .map_err(missing_as_not_found("Customer", id))?;
    Ok(Json(customer.into()))
}

#[utoipa::path(
    delete,
    path = "/customers/{id}",
    tag = "customers",
    summary = "Delete customer",
    params(("id" = i64, Path, description = "Customer ID")),
    responses(
        (status = 204, description = "Customer deleted"),
        (status = 404, description = "Customer not found"),
        (status = 409, description = "Customer is referenced by trip records"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn delete_customer(State(state): State<AppState>, Path(id): Path<CustomerId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Customers::new(&mut conn);
    if repo.delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Customer", id))
    }
}

#[utoipa::path(
    post,
    path = "/customers/bulk-delete",
    tag = "customers",
    summary = "Delete several customers",
    description = "Delete each listed customer independently and report the outcome per row.",
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Per-row outcome", body = BulkDeleteResponse),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn bulk_delete_customers(
    State(state): State<AppState>,
    Json(request): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Customers::new(&mut conn);

    let mut response = BulkDeleteResponse::default();
    for id in request.ids {
        let outcome = match repo.delete(id).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(Error::not_found("Customer", id)),
            Err(e) => Err(Error::Database(e)),
        };
        match outcome {
            Ok(()) => response.succeeded += 1,
            Err(e) => {
                response.failed += 1;
                response.errors.push(BulkRowError {
                    key: id.to_string(),
                    message: e.user_message(),
                });
            }
        }
    }

    tracing::info!(succeeded = response.succeeded, failed = response.failed, "Bulk customer delete finished");
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/customers/import",
    tag = "customers",
    summary = "Import customers from the legacy system",
    description = "Copy legacy customers in an inclusive code range into the customer table. Existing codes are skipped. \
                   With `geocode`, addresses are geocoded and the driving distance from the depot is stored.",
    request_body = CustomerImportRequest,
    responses(
        (status = 200, description = "Import tally", body = ImportSummary),
        (status = 400, description = "Blank or inverted code range"),
        (status = 502, description = "Legacy system unavailable"),
        (status = 503, description = "Legacy system not configured"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn import_customers(State(state): State<AppState>, Json(request): Json<CustomerImportRequest>) -> Result<Json<ImportSummary>> {
    let source = state.legacy.clone().ok_or_else(|| Error::ServiceUnavailable {
        service: "Legacy master-data system".to_string(),
    })?;

    let enrichment = match (&state.mapping, &state.config.mapping) {
        (Some(provider), Some(mapping)) if request.geocode => Some(Enrichment {
            provider: provider.as_ref(),
            depot: mapping.depot,
        }),
        _ => {
            if request.geocode {
                tracing::warn!("Geocoding requested but no mapping provider is configured");
            }
            None
        }
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let summary = run_import(&mut conn, source.as_ref(), enrichment.as_ref(), &request.from_code, &request.to_code).await?;
    Ok(Json(summary))
}
