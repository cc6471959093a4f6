//! Run API Handlers
//!
//! HTTP endpoints for triggering pipelines and following their runs.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use delivery_core::domain::run::Run;
use delivery_core::dto::run::TriggerResponse;
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::service::run_service;
use crate::state::AppState;

/// POST /pipelines/{id}/trigger
/// Start a new run; poll GET /runs/{id} for its progress
pub async fn trigger_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<TriggerResponse>)> {
    tracing::info!("Triggering pipeline: {}", id);

    let response = run_service::trigger_pipeline(&state, id).await?;

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// GET /runs/{id}
/// Get run details, including logs so far
pub async fn get_run(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<Json<Run>> {
    tracing::debug!("Getting run: {}", id);

    let run = run_service::get_run(&state, id).await?;

    Ok(Json(run))
}

/// GET /pipelines/{id}/runs
/// List all runs of a pipeline
pub async fn list_runs_by_pipeline(
    State(state): State<AppState>,
    Path(pipeline_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Run>>> {
    tracing::debug!("Listing runs for pipeline: {}", pipeline_id);

    let runs = run_service::list_runs_by_pipeline(&state, pipeline_id).await?;

    Ok(Json(runs))
}
