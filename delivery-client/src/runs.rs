//! Run-related API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use delivery_core::domain::run::Run;
use delivery_core::dto::run::TriggerResponse;
use uuid::Uuid;

impl OrchestratorClient {
    // =============================================================================
    // Runs
    // =============================================================================

    /// Trigger a new run of a pipeline
    ///
    /// Returns as soon as the run is accepted; poll [`get_run`](Self::get_run)
    /// to follow it.
    pub async fn trigger_pipeline(&self, pipeline_id: Uuid) -> Result<TriggerResponse> {
        let url = format!("{}/pipelines/{}/trigger", self.base_url, pipeline_id);
        let response = self.client.post(&url).send().await?;

        self.handle_response(response).await
    }

    /// Get a run by ID, including its logs so far
    pub async fn get_run(&self, run_id: Uuid) -> Result<Run> {
        let url = format!("{}/runs/{}", self.base_url, run_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// List the runs of a pipeline, oldest first
    pub async fn list_runs_by_pipeline(&self, pipeline_id: Uuid) -> Result<Vec<Run>> {
        let url = format!("{}/pipelines/{}/runs", self.base_url, pipeline_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }
}
