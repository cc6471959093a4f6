//! Run Service
//!
//! Business logic for triggering pipelines and reading runs.

use delivery_core::domain::run::Run;
use delivery_core::dto::run::TriggerResponse;
use delivery_core::error::ValidationError;
use uuid::Uuid;

use crate::execution::RunExecutor;
use crate::github;
use crate::repository::{pipeline_repository, run_repository};
use crate::state::AppState;

/// Service error type
#[derive(Debug)]
pub enum RunError {
    NotFound(Uuid),
    PipelineNotFound(Uuid),
    ValidationError(ValidationError),
}

impl From<ValidationError> for RunError {
    fn from(err: ValidationError) -> Self {
        RunError::ValidationError(err)
    }
}

pub type Result<T> = std::result::Result<T, RunError>;

/// Trigger a new run of a pipeline
///
/// The run is stored as `pending` and executed on a background task; this
/// returns as soon as it has been handed off. GitHub dispatch happens on that
/// task too, ahead of the first step. A pipeline the executor would refuse
/// (no steps) is rejected before any run is created.
pub async fn trigger_pipeline(state: &AppState, pipeline_id: Uuid) -> Result<TriggerResponse> {
    let pipeline = pipeline_repository::find_by_id(&state.store, pipeline_id)
        .ok_or(RunError::PipelineNotFound(pipeline_id))?;

    let run = Run::new(pipeline.id);
    RunExecutor::validate(&pipeline, &run)?;

    let run = run_repository::create(&state.store, run);

    tracing::info!(
        "Run {} triggered for pipeline '{}' ({})",
        run.id,
        pipeline.name,
        pipeline.id
    );

    let response = TriggerResponse {
        run_id: run.id,
        status: run.status,
    };
    let settings = &state.config.github;
    tracing::debug!(
        owner = ?settings.owner,
        repo = ?settings.repo,
        workflow = %settings.workflow,
        git_ref = %settings.git_ref,
        enabled = settings.enabled(),
        "GitHub integration settings"
    );

    // GitHub calls run on the background task, ahead of the first step
    match state.dispatcher.clone() {
        Some(dispatcher) => {
            let target = pipeline.clone();
            state.executor.spawn_after(pipeline, run, async move {
                github::dispatch_for_run(dispatcher.as_ref(), &target).await
            });
        }
        None => {
            state.executor.spawn(pipeline, run);
        }
    }

    Ok(response)
}

/// Get a run by ID
pub async fn get_run(state: &AppState, id: Uuid) -> Result<Run> {
    run_repository::find_by_id(&state.store, id).ok_or(RunError::NotFound(id))
}

/// List the runs of a pipeline, oldest first
///
/// Runs of deleted pipelines are still listed.
pub async fn list_runs_by_pipeline(state: &AppState, pipeline_id: Uuid) -> Result<Vec<Run>> {
    Ok(run_repository::find_by_pipeline(&state.store, pipeline_id))
}
