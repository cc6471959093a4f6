//! Validation errors for domain construction

use thiserror::Error;

/// Reasons a pipeline, step or run is rejected before it can exist.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Pipeline name cannot be empty")]
    EmptyPipelineName,

    #[error("Pipeline name is too long (max {max} characters)")]
    PipelineNameTooLong { max: usize },

    #[error("Invalid repository URL '{url}': {reason}")]
    InvalidRepoUrl { url: String, reason: String },

    #[error("Branch cannot be empty")]
    EmptyBranch,

    #[error("Step name cannot be empty")]
    EmptyStepName,

    #[error("Unknown step type '{0}' (expected one of: run, build, deploy)")]
    UnknownStepType(String),

    #[error("`command` is required for step type 'run'")]
    MissingCommand,

    #[error("`dockerfile` and `ecr_repo` are required for step type 'build'")]
    MissingBuildTarget,

    #[error("`manifest` is required for step type 'deploy'")]
    MissingManifest,

    #[error("timeout_seconds must be between {min} and {max}, got {value}")]
    TimeoutOutOfRange { value: i64, min: u32, max: u32 },

    #[error("Pipeline {0} has no steps to execute")]
    NoSteps(uuid::Uuid),

    #[error("{0} id cannot be empty")]
    MissingId(&'static str),
}

pub type Result<T> = std::result::Result<T, ValidationError>;
