//! Delivery Orchestrator
//!
//! HTTP control plane for delivery pipelines: pipeline CRUD, triggering
//! simulated runs and following their progress, with optional GitHub Actions
//! dispatch.

pub mod api;
pub mod config;
pub mod execution;
pub mod github;
pub mod repository;
pub mod service;
pub mod state;

pub use config::Config;
pub use state::AppState;

/// Serves the API on an already bound listener
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> std::io::Result<()> {
    axum::serve(listener, api::create_router(state)).await
}
