//! Pipeline-related API endpoints

use crate::OrchestratorClient;
use crate::error::Result;
use delivery_core::domain::pipeline::Pipeline;
use delivery_core::dto::pipeline::CreatePipeline;
use uuid::Uuid;

impl OrchestratorClient {
    // =============================================================================
    // Pipeline Management
    // =============================================================================

    /// Create a new pipeline
    pub async fn create_pipeline(&self, req: &CreatePipeline) -> Result<Pipeline> {
        let url = format!("{}/pipelines", self.base_url);
        let response = self.client.post(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// List all pipelines, oldest first
    pub async fn list_pipelines(&self) -> Result<Vec<Pipeline>> {
        let url = format!("{}/pipelines", self.base_url);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Get a pipeline by ID
    pub async fn get_pipeline(&self, pipeline_id: Uuid) -> Result<Pipeline> {
        let url = format!("{}/pipelines/{}", self.base_url, pipeline_id);
        let response = self.client.get(&url).send().await?;

        self.handle_response(response).await
    }

    /// Replace a pipeline's definition
    ///
    /// The pipeline keeps its id and creation time.
    pub async fn update_pipeline(&self, pipeline_id: Uuid, req: &CreatePipeline) -> Result<Pipeline> {
        let url = format!("{}/pipelines/{}", self.base_url, pipeline_id);
        let response = self.client.put(&url).json(req).send().await?;

        self.handle_response(response).await
    }

    /// Delete a pipeline
    pub async fn delete_pipeline(&self, pipeline_id: Uuid) -> Result<()> {
        let url = format!("{}/pipelines/{}", self.base_url, pipeline_id);
        let response = self.client.delete(&url).send().await?;

        self.handle_empty_response(response).await
    }
}
