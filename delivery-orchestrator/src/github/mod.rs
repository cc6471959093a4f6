//! GitHub Actions integration
//!
//! Optional collaborator used when a token is configured. Pipeline creation
//! provisions a `workflow_dispatch` workflow in the pipeline's repository,
//! and triggering a pipeline dispatches that workflow before the simulated
//! run starts. Nothing in here ever fails a request: problems end up as run
//! log lines or `warn` traces.

pub mod client;
pub mod workflow;

use async_trait::async_trait;
use delivery_core::domain::pipeline::Pipeline;
use serde_json::{Value as JsonValue, json};
use thiserror::Error;
use tracing::{info, warn};
use url::Url;

pub use client::GitHubClient;
pub use workflow::workflow_file_name;

/// Errors from the GitHub REST API
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("GitHub request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Authentication failed: check the GitHub token")]
    Authentication,

    #[error("GitHub resource not found: {0}")]
    NotFound(String),

    #[error("GitHub rate limit exceeded or access forbidden")]
    RateLimited,

    #[error("GitHub API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("GitHub token contains characters not allowed in a header")]
    InvalidToken,
}

/// Operations the orchestrator needs from GitHub
#[async_trait]
pub trait WorkflowDispatcher: Send + Sync {
    /// Whether `.github/workflows/<workflow>` exists on `git_ref`
    async fn workflow_exists(
        &self,
        owner: &str,
        repo: &str,
        workflow: &str,
        git_ref: &str,
    ) -> Result<bool, GitHubError>;

    /// Fires a `workflow_dispatch` event and returns the response status
    ///
    /// 204 means GitHub accepted the dispatch.
    async fn dispatch_workflow(
        &self,
        owner: &str,
        repo: &str,
        workflow: &str,
        git_ref: &str,
        inputs: &JsonValue,
    ) -> Result<u16, GitHubError>;

    /// Commits the pipeline's workflow to its repository through a merged PR
    async fn provision_workflow(
        &self,
        owner: &str,
        repo: &str,
        pipeline: &Pipeline,
    ) -> Result<(), GitHubError>;
}

/// Where a repository URL points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoLocation {
    GitHub { owner: String, repo: String },
    /// A github.com URL without an owner/repo path
    MalformedGitHub,
    Elsewhere,
}

/// Classifies a repository URL, extracting owner and repo for github.com
pub fn parse_github_repo(url: &Url) -> RepoLocation {
    if url.host_str() != Some("github.com") {
        return RepoLocation::Elsewhere;
    }

    let mut segments = url
        .path_segments()
        .into_iter()
        .flatten()
        .filter(|segment| !segment.is_empty());

    match (segments.next(), segments.next()) {
        (Some(owner), Some(repo)) => {
            let repo = repo.strip_suffix(".git").unwrap_or(repo);
            if repo.is_empty() {
                return RepoLocation::MalformedGitHub;
            }
            RepoLocation::GitHub {
                owner: owner.to_string(),
                repo: repo.to_string(),
            }
        }
        _ => RepoLocation::MalformedGitHub,
    }
}

/// Dispatches the pipeline's workflow and returns the lines to log on the run
pub async fn dispatch_for_run(
    dispatcher: &dyn WorkflowDispatcher,
    pipeline: &Pipeline,
) -> Vec<String> {
    let (owner, repo) = match parse_github_repo(&pipeline.repo_url) {
        RepoLocation::GitHub { owner, repo } => (owner, repo),
        RepoLocation::MalformedGitHub => {
            return vec![format!(
                "Invalid GitHub repository URL format: {}",
                pipeline.repo_url
            )];
        }
        RepoLocation::Elsewhere => {
            return vec![format!(
                "Repository is not on GitHub: {}",
                pipeline.repo_url
            )];
        }
    };

    let workflow = workflow_file_name(pipeline.id);
    let mut lines = Vec::new();

    let result = async {
        if !dispatcher
            .workflow_exists(&owner, &repo, &workflow, &pipeline.branch)
            .await?
        {
            lines.push(format!(
                "GitHub Actions workflow not found in {owner}/{repo} - create pipeline first to generate workflow"
            ));
            return Ok(());
        }

        lines.push(format!(
            "GitHub Actions workflow found in {owner}/{repo}, triggering..."
        ));

        let inputs = json!({
            "pipeline_id": pipeline.id.to_string(),
            "repo_url": pipeline.repo_url.as_str(),
            "branch": pipeline.branch,
            "environment": "staging",
        });
        let status = dispatcher
            .dispatch_workflow(&owner, &repo, &workflow, &pipeline.branch, &inputs)
            .await?;

        if status == 204 {
            lines.push("GitHub Actions workflow triggered successfully".to_string());
        } else {
            lines.push(format!(
                "GitHub Actions workflow trigger returned status code {status}"
            ));
        }
        Ok::<(), GitHubError>(())
    }
    .await;

    if let Err(e) = result {
        warn!("GitHub integration failed for pipeline {}: {}", pipeline.id, e);
        lines.push(format!("GitHub integration error: {e}"));
    }

    lines
}

/// Provisions the pipeline's workflow, logging the outcome
pub async fn provision_for_pipeline(dispatcher: &dyn WorkflowDispatcher, pipeline: &Pipeline) {
    let (owner, repo) = match parse_github_repo(&pipeline.repo_url) {
        RepoLocation::GitHub { owner, repo } => (owner, repo),
        RepoLocation::MalformedGitHub => {
            warn!("Invalid GitHub repository URL format: {}", pipeline.repo_url);
            return;
        }
        RepoLocation::Elsewhere => {
            warn!("Repository is not on GitHub: {}", pipeline.repo_url);
            return;
        }
    };

    info!(
        "Creating GitHub workflow {} for pipeline {} in {}/{} (branch {}, {} steps)",
        workflow_file_name(pipeline.id),
        pipeline.id,
        owner,
        repo,
        pipeline.branch,
        pipeline.steps.len()
    );

    match dispatcher.provision_workflow(&owner, &repo, pipeline).await {
        Ok(()) => info!(
            "GitHub Actions workflow created and merged for pipeline {} in {}/{}",
            pipeline.id, owner, repo
        ),
        Err(e) => warn!(
            "Failed to create/merge GitHub Actions workflow for pipeline {}: {}",
            pipeline.id, e
        ),
    }
}
