// Protheus SQL Agent - natural-language questions answered with SQL over ERP tables

pub mod config;
pub mod types;
pub mod models;
pub mod cache;
pub mod embeddings;
pub mod llm;
pub mod agents;
pub mod db;
pub mod table;
pub mod orchestrator;
pub mod routes;
pub mod middleware;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
pub use orchestrator::{Answer, Orchestrator};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
