//! Service Module
//!
//! Business logic layer for the orchestrator.
//! Services orchestrate between repositories, the run executor and the GitHub
//! collaborator.

pub mod pipeline;
pub mod run;

// Re-export for convenience
pub use pipeline as pipeline_service;
pub use run as run_service;
