use std::collections::HashMap;

use crate::{
    AppState,
    api::models::{
        evaluations::{
            EvaluationCreate, EvaluationResponse, EvaluationScoresResponse, EvaluationSummaryResponse, EvaluationUpdate,
            ListEvaluationsQuery, MonthQuery, parse_month,
        },
        pagination::PaginatedResponse,
    },
    db::{
        handlers::{Evaluations, Repository, evaluations::EvaluationFilter},
        models::evaluations::{EvaluationCreateDBRequest, EvaluationUpdateDBRequest},
    },
    errors::{Error, Result},
    scoring::{ScoringInput, ScoringRules, monthly_summaries, score_trips},
    types::{EvaluationId, SubcontractorId},
};
use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
};
use sqlx::SqliteConnection;

use super::missing_as_not_found;

/// Score a month and return per-vehicle summaries with display names.
///
/// The whole month is scored before `subcontractor_id` is applied, so damage on a vehicle
/// counts against it whichever subcontractor's evaluation recorded it.
pub(crate) async fn month_summaries(
    conn: &mut SqliteConnection,
    month: &str,
    subcontractor_id: Option<SubcontractorId>,
    rules: &ScoringRules,
) -> Result<Vec<EvaluationSummaryResponse>> {
    let rows = Evaluations::new(conn).list_for_month(month).await?;
    let inputs: Vec<ScoringInput> = rows.iter().map(ScoringInput::from).collect();

    let subcontractor_names: HashMap<_, _> = rows.iter().map(|r| (r.subcontractor_id, r.subcontractor_name.as_str())).collect();
    let plates: HashMap<_, _> = rows.iter().map(|r| (r.vehicle_id, r.vehicle_plate.as_str())).collect();

    Ok(monthly_summaries(&inputs, rules)
        .into_iter()
        .filter(|s| subcontractor_id.is_none_or(|id| s.subcontractor_id == id))
        .map(|s| {
            let name = subcontractor_names.get(&s.subcontractor_id).copied().unwrap_or_default().to_string();
            let plate = plates.get(&s.vehicle_id).copied().unwrap_or_default().to_string();
            EvaluationSummaryResponse::new(s, name, plate)
        })
        .collect())
}

#[utoipa::path(
    get,
    path = "/evaluations",
    tag = "evaluations",
    summary = "List evaluations",
    params(ListEvaluationsQuery),
    responses(
        (status = 200, description = "Paginated list of evaluations", body = PaginatedResponse<EvaluationResponse>),
        (status = 400, description = "Invalid month"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn list_evaluations(
    State(state): State<AppState>,
    Query(query): Query<ListEvaluationsQuery>,
) -> Result<Json<PaginatedResponse<EvaluationResponse>>> {
    let month = query.month.as_deref().map(parse_month).transpose()?;

    let (skip, limit) = query.pagination.params();
    let filter = EvaluationFilter {
        search: query.search.clone(),
        subcontractor_id: query.subcontractor_id,
        vehicle_id: query.vehicle_id,
        month,
        ..EvaluationFilter::new(skip, limit)
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Evaluations::new(&mut conn);
    let total = repo.count(&filter).await?;
    let evaluations = repo.list(&filter).await?;

    Ok(Json(PaginatedResponse::new(
        evaluations.into_iter().map(Into::into).collect(),
        total,
        &query.pagination,
    )))
}

#[utoipa::path(
    get,
    path = "/evaluations/{id}",
    tag = "evaluations",
    summary = "Get evaluation",
    params(("id" = i64, Path, description = "Evaluation ID")),
    responses(
        (status = 200, description = "Evaluation details", body = EvaluationResponse),
        (status = 404, description = "Evaluation not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn get_evaluation(State(state): State<AppState>, Path(id): Path<EvaluationId>) -> Result<Json<EvaluationResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let evaluation = Evaluations::new(&mut conn)
        .get_by_id(id)
        .await?
        .ok_or_else(|| Error::not_found("Evaluation", id))?;
    Ok(Json(evaluation.into()))
}

#[utoipa::path(
    post,
    path = "/evaluations",
    tag = "evaluations",
    summary = "Record an evaluation",
    description = "Entered scores must lie within the configured maxima for their component.",
    request_body = EvaluationCreate,
    responses(
        (status = 201, description = "Evaluation recorded", body = EvaluationResponse),
        (status = 400, description = "Score out of range or unknown reference"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn create_evaluation(
    State(state): State<AppState>,
    Json(request): Json<EvaluationCreate>,
) -> Result<(StatusCode, Json<EvaluationResponse>)> {
    request.validate(&state.config.evaluation)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let evaluation = Evaluations::new(&mut conn)
        .create(&EvaluationCreateDBRequest::from(request))
        .await?;
    Ok((StatusCode::CREATED, Json(evaluation.into())))
}

#[utoipa::path(
    put,
    path = "/evaluations/{id}",
    tag = "evaluations",
    summary = "Update evaluation",
    params(("id" = i64, Path, description = "Evaluation ID")),
    request_body = EvaluationUpdate,
    responses(
        (status = 200, description = "Evaluation updated", body = EvaluationResponse),
        (status = 400, description = "Score out of range"),
        (status = 404, description = "Evaluation not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn update_evaluation(
    State(state): State<AppState>,
    Path(id): Path<EvaluationId>,
    Json(request): Json<EvaluationUpdate>,
) -> Result<Json<EvaluationResponse>> {
    request.validate(&state.config.evaluation)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let evaluation = Evaluations::new(&mut conn)
        .update(id, &EvaluationUpdateDBRequest::from(request))
        .await
        .map_err(missing_as_not_found("Evaluation", id))?;
    Ok(Json(evaluation.into()))
}

#[utoipa::path(
    delete,
    path = "/evaluations/{id}",
    tag = "evaluations",
    summary = "Delete evaluation",
    params(("id" = i64, Path, description = "Evaluation ID")),
    responses(
        (status = 204, description = "Evaluation deleted"),
        (status = 404, description = "Evaluation not found"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn delete_evaluation(State(state): State<AppState>, Path(id): Path<EvaluationId>) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    if Evaluations::new(&mut conn).delete(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Evaluation", id))
    }
}

#[utoipa::path(
    get,
    path = "/evaluations/summary",
    tag = "evaluations",
    summary = "Monthly evaluation summary",
    description = "Per subcontractor and vehicle: trip count, total and average score, damage incidents and grade.",
    params(MonthQuery),
    responses(
        (status = 200, description = "Monthly summaries", body = Vec<EvaluationSummaryResponse>),
        (status = 400, description = "Invalid month"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn evaluation_summary(
    State(state): State<AppState>,
    Query(query): Query<MonthQuery>,
) -> Result<Json<Vec<EvaluationSummaryResponse>>> {
    let month = parse_month(&query.month)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let summaries = month_summaries(&mut conn, &month, query.subcontractor_id, &state.config.evaluation).await?;
    Ok(Json(summaries))
}

#[utoipa::path(
    get,
    path = "/evaluations/scores",
    tag = "evaluations",
    summary = "Per-trip scores for a month",
    params(MonthQuery),
    responses(
        (status = 200, description = "Scores for every evaluation in the month", body = EvaluationScoresResponse),
        (status = 400, description = "Invalid month"),
    ),
)]
#[tracing::instrument(skip_all)]
pub async fn evaluation_scores(State(state): State<AppState>, Query(query): Query<MonthQuery>) -> Result<Json<EvaluationScoresResponse>> {
    let month = parse_month(&query.month)?;
    let rules = &state.config.evaluation;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let rows = Evaluations::new(&mut conn).list_for_month(&month).await?;
    let inputs: Vec<ScoringInput> = rows.iter().map(ScoringInput::from).collect();

    let scores = score_trips(&inputs, rules)
        .into_iter()
        .filter(|s| query.subcontractor_id.is_none_or(|id| s.subcontractor_id == id))
        .collect();

    Ok(Json(EvaluationScoresResponse {
        month,
        max_total: rules.max_total(),
        scores,
    }))
}

#[cfg(test)]
mod tests {
    use crate::{
        api::models::evaluations::{EvaluationResponse, EvaluationScoresResponse, EvaluationSummaryResponse},
        db::handlers::{Evaluations, Repository, TripRecords},
        scoring::Grade,
        test_utils::*,
    };
    use axum::http::StatusCode;
    use serde_json::json;
    use sqlx::SqlitePool;

    async fn seed_march(pool: &SqlitePool) -> Fixtures {
        let fixtures = seed_fleet(pool).await;
        let mut conn = pool.acquire().await.unwrap();
        for (date, damage) in [("2026-03-03", Some(500.0)), ("2026-03-10", None)] {
            let trip = TripRecords::new(&mut conn).create(&trip_request(&fixtures, date)).await.unwrap();
            let mut request = evaluation_request(&fixtures, date, damage);
            request.trip_record_id = Some(trip.id);
            Evaluations::new(&mut conn).create(&request).await.unwrap();
        }
        // Different month, must not be counted
        Evaluations::new(&mut conn)
            .create(&evaluation_request(&fixtures, "2026-04-01", Some(20_000.0)))
            .await
            .unwrap();
        fixtures
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_score_out_of_range_is_rejected(pool: SqlitePool) {
        let fixtures = seed_fleet(&pool).await;
        let app = create_test_app(pool).await;

        let response = app
            .post("/admin/api/v1/evaluations")
            .json(&json!({
                "evaluation_date": "2026-03-03",
                "subcontractor_id": fixtures.subcontractor_id,
                "vehicle_id": fixtures.vehicle_id,
                "driver_cooperation": 36,
                "vehicle_condition": 30
            }))
            .await;
        response.assert_status_bad_request();

        let response = app
            .post("/admin/api/v1/evaluations")
            .json(&json!({
                "evaluation_date": "2026-03-03",
                "subcontractor_id": fixtures.subcontractor_id,
                "vehicle_id": fixtures.vehicle_id,
                "driver_cooperation": 35,
                "vehicle_condition": 0
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let evaluation: EvaluationResponse = response.json();
        assert_eq!(evaluation.subcontractor_name, "Northline Haulage");
        assert!(!evaluation.damage_found);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_monthly_summary(pool: SqlitePool) {
        let fixtures = seed_march(&pool).await;
        let app = create_test_app(pool).await;

        let response = app.get("/admin/api/v1/evaluations/summary?month=2026-03").await;
        response.assert_status_ok();
        let summaries: Vec<EvaluationSummaryResponse> = response.json();
        assert_eq!(summaries.len(), 1);

        let summary = &summaries[0];
        assert_eq!(summary.vehicle_id, fixtures.vehicle_id);
        assert_eq!(summary.vehicle_plate, "KX-1001");
        assert_eq!(summary.subcontractor_name, "Northline Haulage");
        assert_eq!(summary.trip_count, 2);
        assert_eq!(summary.incidents, 1);
        assert_eq!(summary.total_damage, 500.0);
        // One minor incident: 30 + 30 + 15 and 30 + 30 + 30
        assert_eq!(summary.total_score, 165);
        assert_eq!(summary.average_score, 82.5);
        assert_eq!(summary.grade, Grade::Pass);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_summary_filters_by_subcontractor(pool: SqlitePool) {
        let fixtures = seed_march(&pool).await;
        let app = create_test_app(pool).await;

        let summaries: Vec<EvaluationSummaryResponse> = app
            .get(&format!(
                "/admin/api/v1/evaluations/summary?month=2026-03&subcontractor_id={}",
                fixtures.subcontractor_id + 1
            ))
            .await
            .json();
        assert!(summaries.is_empty());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_heavy_damage_zeroes_the_month(pool: SqlitePool) {
        let fixtures = seed_march(&pool).await;
        let app = create_test_app(pool).await;

        let response = app.get("/admin/api/v1/evaluations/scores?month=2026-04").await;
        response.assert_status_ok();
        let scores: EvaluationScoresResponse = response.json();
        assert_eq!(scores.max_total, 100);
        assert_eq!(scores.scores.len(), 1);
        assert_eq!(scores.scores[0].vehicle_id, fixtures.vehicle_id);
        assert_eq!(scores.scores[0].damage_score, 0);
        assert_eq!(scores.scores[0].total_score, 60);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_invalid_month_is_rejected(pool: SqlitePool) {
        let app = create_test_app(pool).await;
        app.get("/admin/api/v1/evaluations/summary?month=2026-13")
            .await
            .assert_status_bad_request();
        app.get("/admin/api/v1/evaluations?month=March").await.assert_status_bad_request();
    }
}
