//! Pipeline Service
//!
//! Business logic for pipeline management.

use delivery_core::domain::pipeline::Pipeline;
use delivery_core::dto::pipeline::CreatePipeline;
use delivery_core::error::ValidationError;
use std::sync::Arc;
use uuid::Uuid;

use crate::github;
use crate::repository::pipeline_repository;
use crate::state::AppState;

/// Service error type
#[derive(Debug)]
pub enum PipelineError {
    NotFound(Uuid),
    ValidationError(ValidationError),
}

impl From<ValidationError> for PipelineError {
    fn from(err: ValidationError) -> Self {
        PipelineError::ValidationError(err)
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Create a new pipeline
///
/// With GitHub integration enabled, the matching workflow is provisioned in
/// the background; that never affects the outcome of the creation.
pub async fn create_pipeline(state: &AppState, req: CreatePipeline) -> Result<Pipeline> {
    let pipeline = pipeline_repository::create(&state.store, Pipeline::create(req)?);

    tracing::info!("Pipeline created: {} ({})", pipeline.name, pipeline.id);

    if let Some(dispatcher) = &state.dispatcher {
        if state.config.github.auto_create_workflow {
            let dispatcher = Arc::clone(dispatcher);
            let pipeline = pipeline.clone();
            tokio::spawn(async move {
                github::provision_for_pipeline(dispatcher.as_ref(), &pipeline).await;
            });
        } else {
            tracing::info!("GitHub workflow auto-creation is disabled");
        }
    }

    Ok(pipeline)
}

/// Get a pipeline by ID
pub async fn get_pipeline(state: &AppState, id: Uuid) -> Result<Pipeline> {
    pipeline_repository::find_by_id(&state.store, id).ok_or(PipelineError::NotFound(id))
}

/// List all pipelines
pub async fn list_pipelines(state: &AppState) -> Result<Vec<Pipeline>> {
    Ok(pipeline_repository::list_all(&state.store))
}

/// Replace a pipeline's definition, keeping its id and creation time
pub async fn update_pipeline(state: &AppState, id: Uuid, req: CreatePipeline) -> Result<Pipeline> {
    let existing = get_pipeline(state, id).await?;
    let replacement = existing.replaced_by(req)?;

    let updated = pipeline_repository::update(&state.store, replacement)
        .ok_or(PipelineError::NotFound(id))?;

    tracing::info!("Pipeline updated: {} ({})", updated.name, updated.id);

    Ok(updated)
}

/// Delete a pipeline
///
/// Runs of the pipeline are kept and stay readable.
pub async fn delete_pipeline(state: &AppState, id: Uuid) -> Result<()> {
    if !pipeline_repository::delete(&state.store, id) {
        return Err(PipelineError::NotFound(id));
    }

    tracing::info!("Pipeline deleted: {}", id);

    Ok(())
}
