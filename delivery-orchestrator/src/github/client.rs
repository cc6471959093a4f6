//! GitHub REST client
//!
//! Thin reqwest wrapper with the headers GitHub expects, a bounded timeout
//! and retry with exponential backoff on transport errors and 5xx responses.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use delivery_core::domain::pipeline::Pipeline;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Client, Method, Response, StatusCode};
use serde::Deserialize;
use serde_json::{Value as JsonValue, json};
use std::time::Duration;
use tracing::{debug, warn};

use super::workflow::{provisioning_branch, render_workflow, workflow_file_name};
use super::{GitHubError, WorkflowDispatcher};
use crate::config::GitHubConfig;

const USER_AGENT: &str = "cicd-pipelines-api";
const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
const MAX_ATTEMPTS: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Authenticated GitHub REST API client
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: String,
    max_attempts: u32,
    initial_backoff: Duration,
}

#[derive(Deserialize)]
struct GitRef {
    object: GitObject,
}

#[derive(Deserialize)]
struct GitObject {
    sha: String,
}

#[derive(Deserialize)]
struct PullRequest {
    number: u64,
}

impl GitHubClient {
    pub fn new(api_url: impl Into<String>, token: &str) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        let mut auth = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| GitHubError::InvalidToken)?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let api_url = api_url.into();
        Ok(Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            max_attempts: MAX_ATTEMPTS,
            initial_backoff: INITIAL_BACKOFF,
        })
    }

    /// Builds a client from configuration; `None` when no token is set
    pub fn from_config(config: &GitHubConfig) -> Result<Option<Self>, GitHubError> {
        config
            .token
            .as_deref()
            .map(|token| Self::new(&config.api_url, token))
            .transpose()
    }

    /// Overrides the retry policy
    pub fn with_backoff(mut self, max_attempts: u32, initial_backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Sends a request, retrying transport errors and 5xx responses
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&JsonValue>,
    ) -> Result<Response, GitHubError> {
        let url = format!("{}{}", self.api_url, path);
        let mut delay = self.initial_backoff;
        let mut attempt = 1;

        loop {
            let mut request = self.http.request(method.clone(), &url);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Ok(response) if response.status().is_server_error() && attempt < self.max_attempts => {
                    warn!(
                        "GitHub {} {} returned {} (attempt {}/{}), retrying in {:?}",
                        method,
                        path,
                        response.status(),
                        attempt,
                        self.max_attempts,
                        delay
                    );
                }
                Ok(response) => {
                    debug!("GitHub {} {} -> {}", method, path, response.status());
                    return Ok(response);
                }
                Err(e) if attempt < self.max_attempts => {
                    warn!(
                        "GitHub {} {} failed (attempt {}/{}): {}, retrying in {:?}",
                        method, path, attempt, self.max_attempts, e, delay
                    );
                }
                Err(e) => return Err(e.into()),
            }

            tokio::time::sleep(delay).await;
            delay *= 2;
            attempt += 1;
        }
    }

    /// Maps unsuccessful responses onto [`GitHubError`]
    async fn check(response: Response) -> Result<Response, GitHubError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let url = response.url().path().to_string();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(match status {
            StatusCode::UNAUTHORIZED => GitHubError::Authentication,
            StatusCode::NOT_FOUND => GitHubError::NotFound(url),
            StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => GitHubError::RateLimited,
            _ => GitHubError::Api {
                status: status.as_u16(),
                message,
            },
        })
    }

    async fn branch_head(&self, owner: &str, repo: &str, branch: &str) -> Result<String, GitHubError> {
        let path = format!("/repos/{owner}/{repo}/git/ref/heads/{branch}");
        let response = Self::check(self.send(Method::GET, &path, &[], None).await?).await?;
        let git_ref: GitRef = response.json().await?;
        Ok(git_ref.object.sha)
    }

    async fn create_branch(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        sha: &str,
    ) -> Result<(), GitHubError> {
        let path = format!("/repos/{owner}/{repo}/git/refs");
        let body = json!({ "ref": format!("refs/heads/{branch}"), "sha": sha });
        let response = self.send(Method::POST, &path, &[], Some(&body)).await?;

        // 422: the branch is left over from an earlier attempt
        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            debug!("Branch {} already exists in {}/{}", branch, owner, repo);
            return Ok(());
        }
        Self::check(response).await?;
        Ok(())
    }

    async fn commit_file(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
        file_path: &str,
        content: &str,
        message: &str,
    ) -> Result<(), GitHubError> {
        let path = format!("/repos/{owner}/{repo}/contents/{file_path}");
        let body = json!({
            "message": message,
            "content": BASE64.encode(content),
            "branch": branch,
        });
        Self::check(self.send(Method::PUT, &path, &[], Some(&body)).await?).await?;
        Ok(())
    }

    async fn open_pull_request(
        &self,
        owner: &str,
        repo: &str,
        base: &str,
        head: &str,
        title: &str,
        body: &str,
    ) -> Result<u64, GitHubError> {
        let path = format!("/repos/{owner}/{repo}/pulls");
        let payload = json!({ "title": title, "head": head, "base": base, "body": body });
        let response =
            Self::check(self.send(Method::POST, &path, &[], Some(&payload)).await?).await?;
        let pr: PullRequest = response.json().await?;
        Ok(pr.number)
    }

    async fn merge_pull_request(&self, owner: &str, repo: &str, number: u64) -> Result<(), GitHubError> {
        let path = format!("/repos/{owner}/{repo}/pulls/{number}/merge");
        let body = json!({ "merge_method": "squash" });
        Self::check(self.send(Method::PUT, &path, &[], Some(&body)).await?).await?;
        Ok(())
    }
}

#[async_trait]
impl WorkflowDispatcher for GitHubClient {
    async fn workflow_exists(
        &self,
        owner: &str,
        repo: &str,
        workflow: &str,
        git_ref: &str,
    ) -> Result<bool, GitHubError> {
        let path = format!("/repos/{owner}/{repo}/contents/.github/workflows/{workflow}");
        let response = self
            .send(Method::GET, &path, &[("ref", git_ref)], None)
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::check(response).await?;
        Ok(true)
    }

    async fn dispatch_workflow(
        &self,
        owner: &str,
        repo: &str,
        workflow: &str,
        git_ref: &str,
        inputs: &JsonValue,
    ) -> Result<u16, GitHubError> {
        let path = format!("/repos/{owner}/{repo}/actions/workflows/{workflow}/dispatches");
        let body = json!({ "ref": git_ref, "inputs": inputs });
        let response = self.send(Method::POST, &path, &[], Some(&body)).await?;
        Ok(response.status().as_u16())
    }

    async fn provision_workflow(
        &self,
        owner: &str,
        repo: &str,
        pipeline: &Pipeline,
    ) -> Result<(), GitHubError> {
        let workflow = workflow_file_name(pipeline.id);
        let branch = provisioning_branch(pipeline.id);

        let sha = self.branch_head(owner, repo, &pipeline.branch).await?;
        self.create_branch(owner, repo, &branch, &sha).await?;
        self.commit_file(
            owner,
            repo,
            &branch,
            &format!(".github/workflows/{workflow}"),
            &render_workflow(pipeline),
            &format!("Add delivery workflow for pipeline {}", pipeline.name),
        )
        .await?;

        let number = self
            .open_pull_request(
                owner,
                repo,
                &pipeline.branch,
                &branch,
                &format!("Add delivery workflow: {}", pipeline.name),
                &format!(
                    "Adds `{workflow}` so pipeline `{}` can dispatch GitHub Actions runs.",
                    pipeline.id
                ),
            )
            .await?;
        self.merge_pull_request(owner, repo, number).await
    }
}
