use axum::{extract::State, routing::get, Json, Router};
use crate::models::{AppState, HealthResponse};
use tracing::warn;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health_check))
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.orchestrator.executor().ping().await {
        Ok(()) => "connected".to_string(),
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            "unavailable".to_string()
        }
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        database,
        cache: state.orchestrator.cache_backend().to_string(),
    })
}
