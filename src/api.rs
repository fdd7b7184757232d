//! HTTP handlers
//!
//! Every response, success or failure, is wrapped in [`ApiResponse`].

use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info};

use crate::config::TripMazerConfig;
use crate::models::TravelSearchParams;
use crate::planner::{TripOptimizationAgent, TripPlan};
use crate::tools::{HotelSearch, RestaurantQuery, ToolInfo, TravelSearchReport, tool_catalog};
use crate::{TripMazerError, VERSION};

const SERVICE_NAME: &str = "TripMazer";
const MIN_QUERY_LEN: usize = 5;

#[derive(Clone)]
pub struct AppState {
    agent: Arc<TripOptimizationAgent>,
    config: Arc<TripMazerConfig>,
}

impl AppState {
    pub fn new(agent: TripOptimizationAgent, config: TripMazerConfig) -> Self {
        Self {
            agent: Arc::new(agent),
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: String,
    pub execution_time_ms: Option<u64>,
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

fn ok<T: Serialize>(data: T, started: Option<Instant>) -> Json<ApiResponse<T>> {
    Json(ApiResponse {
        success: true,
        data: Some(data),
        error: None,
        timestamp: Utc::now().to_rfc3339(),
        execution_time_ms: started.map(elapsed_ms),
    })
}

#[derive(Debug)]
pub enum ApiError {
    Validation(String),
    Internal(String),
}

impl From<TripMazerError> for ApiError {
    fn from(e: TripMazerError) -> Self {
        match e {
            TripMazerError::Validation { message } => ApiError::Validation(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Validation(message) => (StatusCode::UNPROCESSABLE_ENTITY, message),
            ApiError::Internal(message) => {
                error!("Request failed: {message}");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };
        let body = ApiResponse::<Value> {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now().to_rfc3339(),
            execution_time_ms: None,
        };
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

fn require_query(query: &str, min_len: usize) -> Result<&str, ApiError> {
    let query = query.trim();
    if query.chars().count() < min_len {
        return Err(ApiError::Validation(format!(
            "query must be at least {min_len} characters"
        )));
    }
    Ok(query)
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct AccommodationRequest {
    pub query: String,
    #[serde(default)]
    pub hotel_search: Option<HotelSearch>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ToolResponse {
    pub tool: String,
    pub result: String,
}

impl ToolResponse {
    fn new(tool: &str, result: String) -> Self {
        Self {
            tool: tool.to_string(),
            result,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthInfo {
    pub status: String,
    pub service: String,
    pub version: String,
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct AgentInfo {
    pub agent_name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub tools: &'static [ToolInfo],
    pub main_endpoint: &'static str,
    pub features: [&'static str; 5],
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/optimized_trip_planner", post(plan_trip))
        .route("/tools/accommodation", post(accommodation))
        .route("/tools/itinerary", post(itinerary))
        .route("/tools/restaurants", post(restaurants))
        .route("/tools/travel", post(travel))
        .route("/tools/travel/search", post(travel_search))
        .route("/agent/info", get(agent_info))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthInfo>> {
    ok(
        HealthInfo {
            status: "healthy".to_string(),
            service: SERVICE_NAME.to_string(),
            version: VERSION.to_string(),
            environment: state.config.server.environment.clone(),
        },
        None,
    )
}

async fn plan_trip(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<TripPlan> {
    let started = Instant::now();
    let Json(request) = payload?;
    let query = require_query(&request.query, MIN_QUERY_LEN)?;

    info!("Planning trip");
    let plan = state.agent.plan_trip(query).await;
    Ok(ok(plan, Some(started)))
}

async fn accommodation(
    State(state): State<AppState>,
    payload: Result<Json<AccommodationRequest>, JsonRejection>,
) -> ApiResult<ToolResponse> {
    let started = Instant::now();
    let Json(request) = payload?;
    let query = require_query(&request.query, 1)?;

    let result = state
        .agent
        .tools()
        .accommodation
        .search(query, request.hotel_search.as_ref())
        .await?;
    Ok(ok(ToolResponse::new("accommodation", result), Some(started)))
}

async fn itinerary(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<ToolResponse> {
    let started = Instant::now();
    let Json(request) = payload?;
    let query = require_query(&request.query, 1)?;

    let result = state.agent.tools().itinerary.plan(query).await?;
    Ok(ok(ToolResponse::new("itinerary", result), Some(started)))
}

async fn restaurants(
    State(state): State<AppState>,
    payload: Result<Json<RestaurantQuery>, JsonRejection>,
) -> ApiResult<ToolResponse> {
    let started = Instant::now();
    let Json(query) = payload?;
    if query.itinerary_details.trim().is_empty() && query.location.trim().is_empty() {
        return Err(ApiError::Validation(
            "either itinerary_details or location is required".to_string(),
        ));
    }

    let result = state.agent.tools().restaurants.search(&query).await?;
    Ok(ok(ToolResponse::new("restaurants", result), Some(started)))
}

async fn travel(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> ApiResult<ToolResponse> {
    let started = Instant::now();
    let Json(request) = payload?;
    let query = require_query(&request.query, 1)?;

    let result = state.agent.tools().travel.optimize(query).await?;
    Ok(ok(ToolResponse::new("travel", result), Some(started)))
}

async fn travel_search(
    State(state): State<AppState>,
    payload: Result<Json<TravelSearchParams>, JsonRejection>,
) -> ApiResult<TravelSearchReport> {
    let started = Instant::now();
    let Json(params) = payload?;

    let report = state.agent.tools().travel.search(&params).await?;
    Ok(ok(report, Some(started)))
}

async fn agent_info() -> Json<ApiResponse<AgentInfo>> {
    ok(
        AgentInfo {
            agent_name: "TripMazer Trip Optimization Agent",
            version: VERSION,
            description: "Budget-aware trip planning that routes a request through accommodation, itinerary, restaurant and travel tools",
            tools: tool_catalog(),
            main_endpoint: "/optimized_trip_planner",
            features: [
                "LLM preference extraction with keyword fallback",
                "Priority-weighted budget allocation",
                "Sequential tool execution with per-tool error capture",
                "Live hotel and flight data via SerpAPI",
                "Markdown trip report with budget summary",
            ],
        },
        None,
    )
}
