//! Shared application state

use std::sync::Arc;

use crate::config::Config;
use crate::execution::RunExecutor;
use crate::github::{GitHubClient, GitHubError, WorkflowDispatcher};
use crate::repository::Store;

/// State handed to every request handler
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub executor: Arc<RunExecutor>,
    /// Present only when a GitHub token is configured
    pub dispatcher: Option<Arc<dyn WorkflowDispatcher>>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires a fresh store, the step simulator and the GitHub client
    pub fn new(config: Config) -> Result<Self, GitHubError> {
        let dispatcher = GitHubClient::from_config(&config.github)?
            .map(|client| Arc::new(client) as Arc<dyn WorkflowDispatcher>);
        Ok(Self::with_dispatcher(config, dispatcher))
    }

    /// Like [`AppState::new`] with an explicit GitHub collaborator
    pub fn with_dispatcher(
        config: Config,
        dispatcher: Option<Arc<dyn WorkflowDispatcher>>,
    ) -> Self {
        let store = Store::new();
        let executor = Arc::new(RunExecutor::simulated(
            store.clone(),
            config.step_time_unit,
        ));

        Self {
            store,
            executor,
            dispatcher,
            config: Arc::new(config),
        }
    }
}
