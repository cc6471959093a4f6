//! Run domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One execution of a pipeline
///
/// Created `Pending` when a pipeline is triggered, then mutated only by the
/// executor until it reaches a terminal status. `logs` is append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub id: Uuid,
    /// Weak reference: the pipeline may be deleted while its runs remain
    pub pipeline_id: Uuid,
    pub status: RunStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Zero-based index of the step currently (or last) executing
    pub current_step: Option<usize>,
    pub logs: Vec<String>,
}

impl Run {
    pub fn new(pipeline_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            pipeline_id,
            status: RunStatus::Pending,
            started_at: None,
            finished_at: None,
            current_step: None,
            logs: Vec::new(),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Run execution status
///
/// `Cancelled` is part of the vocabulary, but nothing currently cancels a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Succeeded | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Pending => write!(f, "pending"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Succeeded => write!(f, "succeeded"),
            RunStatus::Failed => write!(f, "failed"),
            RunStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}
