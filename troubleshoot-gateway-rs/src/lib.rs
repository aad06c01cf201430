// troubleshoot-gateway-rs/src/lib.rs
//
// HTTP surface of the troubleshooting backend. Routes are thin adapters
// over the scenario pipeline and the two stores; every collaborator is
// built once in main and shared through `AppState`.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use once_cell::sync::Lazy;
use scenario_store::{FeedbackRecord, FeedbackSubmission, StoreError, Stores};
use scenario_validation::Scenario;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod pipeline;
pub mod validation;

pub use pipeline::{query_from_body, PipelineError, ScenarioPipeline};
pub use validation::{ApiError, ErrorResponse, MAX_PAYLOAD_SIZE};

use validation::{
    envelope_payload_too_large, parse_json_body, payload_limit_config, require_json_content_type,
};

static START_TIME: Lazy<Instant> = Lazy::new(Instant::now);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    service_name: String,
    pipeline: Arc<ScenarioPipeline>,
    stores: Stores,
}

impl AppState {
    pub fn new(service_name: impl Into<String>, pipeline: Arc<ScenarioPipeline>, stores: Stores) -> Self {
        Lazy::force(&START_TIME);
        Self {
            service_name: service_name.into(),
            pipeline,
            stores,
        }
    }
}

/// Landing page parameters passed through from the launching LMS link
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct UserParams {
    pub id: Option<String>,
    pub email: Option<String>,
    pub lang: Option<String>,
    #[serde(rename(deserialize = "number", serialize = "phone_number"))]
    pub phone_number: Option<String>,
    pub name: Option<String>,
    pub institution: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LandingPage {
    #[serde(rename = "userParams")]
    pub user_params: UserParams,
}

#[derive(Debug, Deserialize)]
pub struct TroubleshootParams {
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TroubleshootPage {
    pub scenario: Scenario,
}

#[derive(Debug, Deserialize)]
pub struct ScenarioLookupParams {
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FeedbackResponse {
    pub success: bool,
    pub data: Vec<FeedbackRecord>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub service_name: String,
    pub uptime_seconds: u64,
    pub status: String,
    pub storage_healthy: bool,
    pub model_configured: bool,
}

/// Create the Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(landing_handler))
        .route("/health", get(health_handler))
        .route("/troubleshoot", get(troubleshoot_handler))
        .route("/api/text_response", post(text_response_handler))
        .route("/api/feedback_saving", post(feedback_saving_handler))
        .route("/api/scenarios", get(scenario_by_title_handler))
        .route("/api/scenarios/:id", get(scenario_by_id_handler))
        .layer(middleware::from_fn(require_json_content_type))
        .layer(payload_limit_config())
        .layer(middleware::from_fn(envelope_payload_too_large))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET / - echo the launch parameters for the landing page
async fn landing_handler(Query(user_params): Query<UserParams>) -> Json<LandingPage> {
    Json(LandingPage { user_params })
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let storage_healthy =
        state.stores.scenarios.is_healthy().await && state.stores.feedback.is_healthy().await;
    let model_configured = state.pipeline.model_configured();

    let status = match (storage_healthy, model_configured) {
        (true, true) => "SERVING",
        (true, false) => "DEGRADED",
        (false, _) => "CRITICAL",
    };

    Json(HealthResponse {
        healthy: storage_healthy,
        service_name: state.service_name.clone(),
        uptime_seconds: START_TIME.elapsed().as_secs(),
        status: status.to_string(),
        storage_healthy,
        model_configured,
    })
}

/// POST /api/text_response - generate a scenario for `{query}`
async fn text_response_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Scenario>, ApiError> {
    let payload = parse_json_body(&body)?;
    let query = query_from_body(&payload)?;
    let scenario = state.pipeline.generate(query).await?;
    Ok(Json(scenario))
}

/// GET /troubleshoot?q= - page data for the troubleshooting view
async fn troubleshoot_handler(
    State(state): State<AppState>,
    Query(params): Query<TroubleshootParams>,
) -> Result<Json<TroubleshootPage>, ApiError> {
    let query = params
        .q
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("No query provided", None))?;

    let scenario = state.pipeline.generate(&query).await.map_err(|e| {
        let cause = ApiError::from(e);
        ApiError::internal("Failed to fetch scenario", Some(cause.to_string()))
    })?;

    Ok(Json(TroubleshootPage { scenario }))
}

/// POST /api/feedback_saving
async fn feedback_saving_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<FeedbackResponse>, ApiError> {
    let payload = parse_json_body(&body)?;
    let submission: FeedbackSubmission = serde_json::from_value(payload)
        .map_err(|e| ApiError::bad_request("Failed to process feedback", Some(e.to_string())))?;

    let record = state.stores.feedback.save(submission).await.map_err(|e| match e {
        StoreError::InvalidRating(_) => ApiError::bad_request(e.to_string(), None),
        other => ApiError::internal("Failed to save feedback", Some(other.to_string())),
    })?;

    tracing::info!("Saved feedback {} (rating {})", record.id, record.rating);
    Ok(Json(FeedbackResponse {
        success: true,
        data: vec![record],
    }))
}

/// GET /api/scenarios/:id
async fn scenario_by_id_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Scenario>, ApiError> {
    let id: i64 = id
        .parse()
        .map_err(|_| ApiError::bad_request("Invalid scenario id", Some(format!("{:?} is not an integer", id))))?;
    let scenario = state.stores.scenarios.lookup_by_id(id).await?;
    Ok(Json(scenario))
}

/// GET /api/scenarios?title=
async fn scenario_by_title_handler(
    State(state): State<AppState>,
    Query(params): Query<ScenarioLookupParams>,
) -> Result<Json<Scenario>, ApiError> {
    let title = params
        .title
        .ok_or_else(|| ApiError::bad_request("No title provided", None))?;
    let scenario = state.stores.scenarios.lookup_by_title(&title).await?;
    Ok(Json(scenario))
}
