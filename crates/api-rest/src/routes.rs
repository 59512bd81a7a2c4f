//! HTTP handlers, router assembly and the OpenAPI document.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::dto::*;
use crate::error::ApiError;
use triage_core::{
    ArrivalPath, CheckIn, NewAssessment, TriageEngine, TriageError, VisitCorrection, VisitStatus,
};

/// Application state shared across REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: TriageEngine,
}

impl AppState {
    pub fn new(engine: TriageEngine) -> Self {
        Self { engine }
    }
}

type ApiResult<T> = Result<T, ApiError>;

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        check_in,
        get_visit,
        record_vitals,
        record_assessment,
        list_assessments,
        latest_assessment,
        transition_visit,
        correct_visit,
        audit_history,
        time_to_triage,
        ews_distribution,
        active_census,
    ),
    components(schemas(
        HealthRes,
        ErrorRes,
        CheckInReq,
        VisitRes,
        VitalsReq,
        VitalsRes,
        AssessmentReq,
        AssessmentRes,
        AssessmentListRes,
        TransitionReq,
        CorrectionReq,
        AuditEntryRes,
        AuditHistoryRes,
        TimeToTriageRes,
        LevelShareRes,
        EwsDistributionRes,
        StatusBreakdownRes,
        ArrivalPathBreakdownRes,
        CensusRes,
    ))
)]
pub struct ApiDoc;

/// Build the REST router over a triage engine.
///
/// Serves the Swagger UI at `/swagger-ui` and the OpenAPI document at
/// `/api-docs/openapi.json`.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/visits", post(check_in))
        .route("/visits/:id", get(get_visit).patch(correct_visit))
        .route("/visits/:id/vitals", post(record_vitals))
        .route(
            "/visits/:id/assessments",
            get(list_assessments).post(record_assessment),
        )
        .route("/visits/:id/assessments/latest", get(latest_assessment))
        .route("/visits/:id/transitions", post(transition_visit))
        .route("/visits/:id/audit", get(audit_history))
        .route("/analytics/time-to-triage", get(time_to_triage))
        .route("/analytics/ews-distribution", get(ews_distribution))
        .route("/analytics/census", get(active_census))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Liveness probe. Does not touch the store.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "Triage REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/visits",
    request_body = CheckInReq,
    responses(
        (status = 201, description = "Visit created in WAITING", body = VisitRes),
        (status = 400, description = "Invalid input", body = ErrorRes),
        (status = 503, description = "Store unavailable", body = ErrorRes)
    )
)]
/// Check a patient in at the front desk.
///
/// # Errors
/// Returns `400 Bad Request` if the patient reference is blank or the arrival path is unknown.
#[axum::debug_handler]
async fn check_in(
    State(state): State<AppState>,
    Json(req): Json<CheckInReq>,
) -> ApiResult<(StatusCode, Json<VisitRes>)> {
    let arrival_path = req
        .arrival_path
        .parse::<ArrivalPath>()
        .map_err(TriageError::from)?;

    let visit = state
        .engine
        .intake
        .check_in(CheckIn {
            patient_ref: req.patient_ref,
            arrival_path,
            notes: req.notes,
            arrived_at: req.arrived_at,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(visit.into())))
}

#[utoipa::path(
    get,
    path = "/visits/{id}",
    params(("id" = Uuid, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Visit", body = VisitRes),
        (status = 404, description = "Unknown visit", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn get_visit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<VisitRes>> {
    let visit = state.engine.intake.get_visit(id).await?;
    Ok(Json(visit.into()))
}

#[utoipa::path(
    post,
    path = "/visits/{id}/vitals",
    params(("id" = Uuid, Path, description = "Visit id")),
    request_body = VitalsReq,
    responses(
        (status = 201, description = "Vitals recorded", body = VitalsRes),
        (status = 400, description = "Empty or implausible reading", body = ErrorRes),
        (status = 404, description = "Unknown visit", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn record_vitals(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<VitalsReq>,
) -> ApiResult<(StatusCode, Json<VitalsRes>)> {
    let record = state
        .engine
        .intake
        .record_vitals(id, req.vitals(), &req.recorded_by)
        .await?;
    Ok((StatusCode::CREATED, Json(record.into())))
}

#[utoipa::path(
    post,
    path = "/visits/{id}/assessments",
    params(("id" = Uuid, Path, description = "Visit id")),
    request_body = AssessmentReq,
    responses(
        (status = 201, description = "Assessment appended", body = AssessmentRes),
        (status = 400, description = "Invalid input", body = ErrorRes),
        (status = 404, description = "Unknown visit", body = ErrorRes)
    )
)]
/// Append an EWS assessment. Assessments are never edited; a correction is a new record.
#[axum::debug_handler]
async fn record_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AssessmentReq>,
) -> ApiResult<(StatusCode, Json<AssessmentRes>)> {
    let new = NewAssessment::parse(
        &req.assessment_type,
        req.score,
        &req.level,
        req.flags,
        &req.created_by,
    )?;
    let assessment = state.engine.assessments.record_assessment(id, new).await?;
    Ok((StatusCode::CREATED, Json(assessment.into())))
}

#[utoipa::path(
    get,
    path = "/visits/{id}/assessments",
    params(("id" = Uuid, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Assessments, highest precedence first", body = AssessmentListRes),
        (status = 404, description = "Unknown visit or no assessments", body = ErrorRes)
    )
)]
/// List assessments, VERIFIED before PROVISIONAL and newest first within each type.
///
/// # Errors
/// Returns `404 Not Found` when the visit has no assessments yet.
#[axum::debug_handler]
async fn list_assessments(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AssessmentListRes>> {
    let assessments = state.engine.assessments.list_assessments(id).await?;
    if assessments.is_empty() {
        return Err(TriageError::NotFound("assessment").into());
    }
    Ok(Json(AssessmentListRes {
        assessments: assessments.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/visits/{id}/assessments/latest",
    params(("id" = Uuid, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Most relevant assessment", body = AssessmentRes),
        (status = 404, description = "Unknown visit or no assessments", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn latest_assessment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AssessmentRes>> {
    let latest = state
        .engine
        .assessments
        .latest_assessment(id)
        .await?
        .ok_or(TriageError::NotFound("assessment"))?;
    Ok(Json(latest.into()))
}

#[utoipa::path(
    post,
    path = "/visits/{id}/transitions",
    params(("id" = Uuid, Path, description = "Visit id")),
    request_body = TransitionReq,
    responses(
        (status = 200, description = "Visit after the transition", body = VisitRes),
        (status = 400, description = "Unknown target status or blank actor", body = ErrorRes),
        (status = 404, description = "Unknown visit", body = ErrorRes),
        (status = 409, description = "Transition not allowed or visit already triaged", body = ErrorRes)
    )
)]
/// Apply a guarded status transition.
#[axum::debug_handler]
async fn transition_visit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<TransitionReq>,
) -> ApiResult<Json<VisitRes>> {
    let target = req.target.parse::<VisitStatus>().map_err(TriageError::from)?;
    let visit = state.engine.visits.transition(id, target, &req.actor).await?;
    Ok(Json(visit.into()))
}

#[utoipa::path(
    patch,
    path = "/visits/{id}",
    params(("id" = Uuid, Path, description = "Visit id")),
    request_body = CorrectionReq,
    responses(
        (status = 200, description = "Visit after the correction", body = VisitRes),
        (status = 400, description = "Nothing to correct or invalid input", body = ErrorRes),
        (status = 404, description = "Unknown visit", body = ErrorRes)
    )
)]
/// Registrar correction of status and/or notes. The transition guard is not applied.
#[axum::debug_handler]
async fn correct_visit(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<CorrectionReq>,
) -> ApiResult<Json<VisitRes>> {
    let status = req
        .status
        .as_deref()
        .map(str::parse::<VisitStatus>)
        .transpose()
        .map_err(TriageError::from)?;

    let correction = VisitCorrection {
        status,
        notes: req.notes,
    };
    let visit = state
        .engine
        .visits
        .force_set(id, correction, &req.actor)
        .await?;
    Ok(Json(visit.into()))
}

#[utoipa::path(
    get,
    path = "/visits/{id}/audit",
    params(("id" = Uuid, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Audit trail, oldest first", body = AuditHistoryRes),
        (status = 404, description = "Unknown visit", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn audit_history(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<AuditHistoryRes>> {
    state.engine.intake.get_visit(id).await?;
    let entries = state.engine.audit.history(&id.to_string()).await?;
    Ok(Json(AuditHistoryRes {
        entries: entries.into_iter().map(Into::into).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/analytics/time-to-triage",
    responses(
        (status = 200, description = "Arrival to first vitals, in whole minutes", body = TimeToTriageRes),
        (status = 503, description = "Store unavailable", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn time_to_triage(State(state): State<AppState>) -> ApiResult<Json<TimeToTriageRes>> {
    let stats = state.engine.analytics.time_to_triage().await?;
    Ok(Json(stats.into()))
}

#[utoipa::path(
    get,
    path = "/analytics/ews-distribution",
    responses(
        (status = 200, description = "Latest EWS level per visit in the window", body = EwsDistributionRes),
        (status = 503, description = "Store unavailable", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn ews_distribution(State(state): State<AppState>) -> ApiResult<Json<EwsDistributionRes>> {
    let dist = state.engine.analytics.ews_distribution().await?;
    Ok(Json(dist.into()))
}

#[utoipa::path(
    get,
    path = "/analytics/census",
    responses(
        (status = 200, description = "Active visits by status and arrival path", body = CensusRes),
        (status = 503, description = "Store unavailable", body = ErrorRes)
    )
)]
#[axum::debug_handler]
async fn active_census(State(state): State<AppState>) -> ApiResult<Json<CensusRes>> {
    let census = state.engine.analytics.active_census().await?;
    Ok(Json(census.into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;
    use triage_core::{CoreConfig, InMemoryVisitStore};

    fn app() -> Router {
        let cfg = Arc::new(
            CoreConfig::new(
                Duration::from_secs(2),
                chrono::Duration::hours(24),
                "test-ed".into(),
            )
            .expect("valid config"),
        );
        let engine = TriageEngine::new(cfg, Arc::new(InMemoryVisitStore::new()));
        router(AppState::new(engine))
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };

        let response = app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body")
            .to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("json body")
        };
        (status, value)
    }

    async fn check_in_walk_in(app: &Router) -> String {
        let (status, body) = send(
            app,
            Method::POST,
            "/visits",
            Some(json!({ "patient_ref": "pt-100", "arrival_path": "WALK_IN" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().expect("visit id").to_string()
    }

    #[tokio::test]
    async fn health_reports_alive() {
        let app = app();
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn check_in_creates_waiting_visit() {
        let app = app();
        let id = check_in_walk_in(&app).await;

        let (status, body) = send(&app, Method::GET, &format!("/visits/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "WAITING");
        assert_eq!(body["arrival_path"], "WALK_IN");
        assert_eq!(body["external_encounter_id"], Value::Null);
    }

    #[tokio::test]
    async fn check_in_rejects_unknown_arrival_path() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::POST,
            "/visits",
            Some(json!({ "patient_ref": "pt-100", "arrival_path": "HELICOPTER" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn check_in_rejects_future_arrival_time() {
        let app = app();
        let arrived_at = chrono::Utc::now() + chrono::Duration::days(3);
        let (status, body) = send(
            &app,
            Method::POST,
            "/visits",
            Some(json!({
                "patient_ref": "pt-101",
                "arrival_path": "EMS",
                "arrived_at": arrived_at,
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "INVALID_INPUT");

        let (_, census) = send(&app, Method::GET, "/analytics/census", None).await;
        assert_eq!(census["total"], 0);
    }

    #[tokio::test]
    async fn unknown_visit_is_404_with_generic_message() {
        let app = app();
        let (status, body) = send(
            &app,
            Method::GET,
            &format!("/visits/{}", Uuid::new_v4()),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["kind"], "NOT_FOUND");
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn assessment_list_is_404_until_one_is_recorded() {
        let app = app();
        let id = check_in_walk_in(&app).await;
        let uri = format!("/visits/{id}/assessments");

        let (status, _) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        for (kind, level) in [("VERIFIED", "MODERATE"), ("PROVISIONAL", "CRITICAL")] {
            let (status, _) = send(
                &app,
                Method::POST,
                &uri,
                Some(json!({
                    "assessment_type": kind,
                    "score": 5,
                    "level": level,
                    "created_by": "rn-1"
                })),
            )
            .await;
            assert_eq!(status, StatusCode::CREATED);
        }

        let (status, body) = send(&app, Method::GET, &uri, None).await;
        assert_eq!(status, StatusCode::OK);
        let list = body["assessments"].as_array().expect("array");
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["assessment_type"], "VERIFIED");

        let (status, latest) = send(&app, Method::GET, &format!("{uri}/latest"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(latest["level"], "MODERATE");
    }

    #[tokio::test]
    async fn negative_score_is_rejected() {
        let app = app();
        let id = check_in_walk_in(&app).await;
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/visits/{id}/assessments"),
            Some(json!({
                "assessment_type": "PROVISIONAL",
                "score": -1,
                "level": "LOW",
                "created_by": "rn-1"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn second_triage_completion_conflicts() {
        let app = app();
        let id = check_in_walk_in(&app).await;
        let uri = format!("/visits/{id}/transitions");
        let body = json!({ "target": "IN_TRIAGE", "actor": "rn-1" });

        let (status, visit) = send(&app, Method::POST, &uri, Some(body.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(visit["status"], "IN_TRIAGE");

        let (status, err) = send(&app, Method::POST, &uri, Some(body)).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["kind"], "ALREADY_TRIAGED");
    }

    #[tokio::test]
    async fn transition_out_of_terminal_status_conflicts() {
        let app = app();
        let id = check_in_walk_in(&app).await;
        let uri = format!("/visits/{id}/transitions");

        let (status, _) = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({ "target": "LEFT_WITHOUT_BEING_SEEN", "actor": "clerk-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, err) = send(
            &app,
            Method::POST,
            &uri,
            Some(json!({ "target": "ROOMED", "actor": "rn-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(err["kind"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn correction_writes_audit_entries() {
        let app = app();
        let id = check_in_walk_in(&app).await;

        let (status, visit) = send(
            &app,
            Method::PATCH,
            &format!("/visits/{id}"),
            Some(json!({ "status": "ROOMED", "notes": "bay 4", "actor": "reg-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(visit["status"], "ROOMED");
        assert_eq!(visit["notes"], "bay 4");

        let (status, audit) = send(&app, Method::GET, &format!("/visits/{id}/audit"), None).await;
        assert_eq!(status, StatusCode::OK);
        let entries = audit["entries"].as_array().expect("array");
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e["actor"] == "reg-1"));
    }

    #[tokio::test]
    async fn empty_correction_is_bad_request() {
        let app = app();
        let id = check_in_walk_in(&app).await;
        let (status, _) = send(
            &app,
            Method::PATCH,
            &format!("/visits/{id}"),
            Some(json!({ "actor": "reg-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn vitals_feed_time_to_triage_and_census() {
        let app = app();
        let id = check_in_walk_in(&app).await;

        let (status, _) = send(
            &app,
            Method::POST,
            &format!("/visits/{id}/vitals"),
            Some(json!({ "recorded_by": "rn-1", "heart_rate": 88, "spo2": 97 })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, stats) = send(&app, Method::GET, "/analytics/time-to-triage", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["count"], 1);

        let (status, census) = send(&app, Method::GET, "/analytics/census", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(census["total"], 1);
        assert_eq!(census["by_status"]["waiting"], 1);
        assert_eq!(census["by_arrival_path"]["walk_in"], 1);
    }

    #[tokio::test]
    async fn empty_vitals_are_rejected() {
        let app = app();
        let id = check_in_walk_in(&app).await;
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/visits/{id}/vitals"),
            Some(json!({ "recorded_by": "rn-1" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn ews_distribution_lists_every_level() {
        let app = app();
        let (status, dist) = send(&app, Method::GET, "/analytics/ews-distribution", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dist["total"], 0);
        assert_eq!(dist["levels"].as_array().expect("array").len(), 4);
    }

    #[test]
    fn dependency_failures_map_to_503() {
        use crate::error::status_for;
        use triage_core::ErrorKind;

        assert_eq!(status_for(ErrorKind::DependencyFailure), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(status_for(ErrorKind::AlreadyTriaged), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::InvalidInput), StatusCode::BAD_REQUEST);
    }
}
