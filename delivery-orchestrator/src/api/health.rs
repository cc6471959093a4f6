//! Health Check API Handler
//!
//! Simple health check endpoint for monitoring.

use axum::{Json, extract::State};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub title: String,
    pub version: String,
}

/// GET /health
/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        title: state.config.api_title.clone(),
        version: state.config.api_version.clone(),
    })
}
