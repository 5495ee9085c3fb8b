//! PDF report downloads.

use crate::{
    AppState,
    api::{
        handlers::evaluations::month_summaries,
        models::{
            evaluations::{MonthQuery, parse_month},
            reports::ReportRangeQuery,
            trip_records::check_date_range,
        },
    },
    db::handlers::{FuelRecords, TripRecords, fuel_records::FuelRecordFilter, trip_records::TripRecordFilter},
    errors::{Error, Result},
    reports::{self, Report},
};
use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};

/// Render off the async runtime and wrap the bytes as an inline PDF download.
async fn pdf_response(report: Report, filename: String) -> Result<Response> {
    let bytes = tokio::task::spawn_blocking(move || reports::render(&report))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("render report: {e}"),
        })??;

    tracing::debug!(%filename, size = bytes.len(), "Rendered report");
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, format!("inline; filename=\"{filename}\"")),
        ],
        bytes,
    )
        .into_response())
}

#[utoipa::path(
    get,
    path = "/reports/evaluations.pdf",
    tag = "reports",
    summary = "Monthly evaluation report",
    params(MonthQuery),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 400, description = "Invalid month"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn evaluation_report(State(state): State<AppState>, Query(query): Query<MonthQuery>) -> Result<Response> {
    let month = parse_month(&query.month)?;
    let rules = &state.config.evaluation;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let summaries = month_summaries(&mut conn, &month, query.subcontractor_id, rules).await?;
    drop(conn);

    let report = reports::evaluation_report(&month, rules.max_total(), &summaries);
    pdf_response(report, format!("evaluations-{month}.pdf")).await
}

#[utoipa::path(
    get,
    path = "/reports/fuel.pdf",
    tag = "reports",
    summary = "Fuel report",
    params(ReportRangeQuery),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 400, description = "Invalid date range"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn fuel_report(State(state): State<AppState>, Query(query): Query<ReportRangeQuery>) -> Result<Response> {
    check_date_range(query.from, query.to)?;
    let filter = FuelRecordFilter {
        vehicle_id: query.vehicle_id,
        from: query.from,
        to: query.to,
        ..Default::default()
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let records = FuelRecords::new(&mut conn).list_all(&filter).await?;
    drop(conn);

    pdf_response(reports::fuel_report(query.from, query.to, &records), "fuel-report.pdf".to_string()).await
}

#[utoipa::path(
    get,
    path = "/reports/trips.pdf",
    tag = "reports",
    summary = "Trip report",
    params(ReportRangeQuery),
    responses(
        (status = 200, description = "PDF document", content_type = "application/pdf"),
        (status = 400, description = "Invalid date range"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn trip_report(State(state): State<AppState>, Query(query): Query<ReportRangeQuery>) -> Result<Response> {
    check_date_range(query.from, query.to)?;
    let filter = TripRecordFilter {
        vehicle_id: query.vehicle_id,
        from: query.from,
        to: query.to,
        ..Default::default()
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let trips = TripRecords::new(&mut conn).list_all(&filter).await?;
    drop(conn);

    pdf_response(reports::trip_report(query.from, query.to, &trips), "trip-report.pdf".to_string()).await
}
