//! API Routes
//!
//! - `POST /api/pergunta` - Answer a natural-language question over the ERP tables
//! - `GET /api/health` - Health check

pub mod health;
pub mod pergunta;

use axum::Router;
use crate::models::AppState;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    Router::new()
        .merge(pergunta::router())
        .merge(health::router())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
