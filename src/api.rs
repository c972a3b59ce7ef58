//! REST API Server for the priority engine
//!
//! Exposes the ranking coordinator over HTTP

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::coordinator::RankingCoordinator;
use crate::error::RankingError;

/// =============================
/// Request Models
/// =============================

#[derive(Debug, Default, Deserialize)]
pub struct PriorityQuery {
    /// RFC 3339 timestamp to rank at; defaults to the current time.
    pub now: Option<String>,
}

/// =============================
/// Response Wrapper
/// =============================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse {
    pub success: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<String>,
    pub timestamp: String,
}

impl ApiResponse {
    pub fn success<T: Serialize>(data: T) -> Self {
        Self {
            success: true,
            data: serde_json::to_value(data).ok(),
            error: None,
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

/// =============================
/// API State
/// =============================

#[derive(Clone)]
pub struct ApiState {
    pub coordinator: Arc<RankingCoordinator>,
}

/// =============================
/// Health Endpoint
/// =============================

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339()
    }))
}

/// =============================
/// Priority Endpoint
/// =============================

async fn advisor_priorities(
    State(state): State<ApiState>,
    Path(advisor_id): Path<String>,
    Query(query): Query<PriorityQuery>,
) -> (StatusCode, Json<ApiResponse>) {
    let Ok(advisor_id) = Uuid::parse_str(advisor_id.trim()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(format!("Invalid advisor id: {}", advisor_id))),
        );
    };

    let now = match query.now.as_deref().map(DateTime::parse_from_rfc3339) {
        None => Utc::now(),
        Some(Ok(at)) => at.with_timezone(&Utc),
        Some(Err(e)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(format!("Invalid 'now' timestamp: {}", e))),
            );
        }
    };

    info!(advisor_id = %advisor_id, "Received priority request");

    match state.coordinator.rank(advisor_id, now).await {
        Ok(ranking) => (StatusCode::OK, Json(ApiResponse::success(ranking))),
        Err(e @ RankingError::Roster(_)) => {
            warn!(advisor_id = %advisor_id, error = %e, "Priority request failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::error(format!("Ranking failed: {}", e))),
            )
        }
        Err(e) => {
            warn!(advisor_id = %advisor_id, error = %e, "Priority request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(format!("Ranking failed: {}", e))),
            )
        }
    }
}

/// =============================
/// Router
/// =============================

pub fn create_router(coordinator: Arc<RankingCoordinator>) -> Router {
    let state = ApiState { coordinator };

    Router::new()
        .route("/health", get(health))
        .route(
            "/api/v1/advisors/:advisor_id/priorities",
            get(advisor_priorities),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// =============================
/// Server Startup
/// =============================

pub async fn start_server(
    coordinator: Arc<RankingCoordinator>,
    port: u16,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let router = create_router(coordinator);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;

    info!("API Server listening on http://0.0.0.0:{}", port);

    axum::serve(listener, router).await?;

    Ok(())
}
