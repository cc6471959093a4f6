//! Run DTOs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::run::RunStatus;

/// Response to a trigger request
///
/// The run keeps executing after this is returned; poll the run for progress.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerResponse {
    pub run_id: Uuid,
    pub status: RunStatus,
}
