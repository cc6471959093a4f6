//! Pipeline API Handlers
//!
//! HTTP endpoints for pipeline management.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
};
use delivery_core::domain::pipeline::Pipeline;
use delivery_core::dto::pipeline::CreatePipeline;
use uuid::Uuid;

use crate::api::error::ApiResult;
use crate::service::pipeline_service;
use crate::state::AppState;

/// POST /pipelines
/// Create a new pipeline
pub async fn create_pipeline(
    State(state): State<AppState>,
    payload: Result<Json<CreatePipeline>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Pipeline>)> {
    let Json(req) = payload?;
    tracing::info!("Creating pipeline: {}", req.name);

    let pipeline = pipeline_service::create_pipeline(&state, req).await?;

    Ok((StatusCode::CREATED, Json(pipeline)))
}

/// GET /pipelines
/// List all pipelines
pub async fn list_pipelines(State(state): State<AppState>) -> ApiResult<Json<Vec<Pipeline>>> {
    tracing::debug!("Listing all pipelines");

    let pipelines = pipeline_service::list_pipelines(&state).await?;

    Ok(Json(pipelines))
}

/// GET /pipelines/{id}
/// Get pipeline by ID
pub async fn get_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Pipeline>> {
    tracing::debug!("Getting pipeline: {}", id);

    let pipeline = pipeline_service::get_pipeline(&state, id).await?;

    Ok(Json(pipeline))
}

/// PUT /pipelines/{id}
/// Replace a pipeline's definition
pub async fn update_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    payload: Result<Json<CreatePipeline>, JsonRejection>,
) -> ApiResult<Json<Pipeline>> {
    let Json(req) = payload?;
    tracing::info!("Updating pipeline: {}", id);

    let pipeline = pipeline_service::update_pipeline(&state, id, req).await?;

    Ok(Json(pipeline))
}

/// DELETE /pipelines/{id}
/// Delete a pipeline
pub async fn delete_pipeline(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    tracing::info!("Deleting pipeline: {}", id);

    pipeline_service::delete_pipeline(&state, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
