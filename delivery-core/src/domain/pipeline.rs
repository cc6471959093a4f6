//! Pipeline domain types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

use crate::dto::pipeline::{CreatePipeline, StepDefinition};
use crate::error::{Result, ValidationError};

pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_TIMEOUT_SECONDS: u32 = 300;
pub const MIN_TIMEOUT_SECONDS: u32 = 1;
pub const MAX_TIMEOUT_SECONDS: u32 = 3600;

const MAX_NAME_LENGTH: usize = 255;

/// Pipeline definition
///
/// A named, ordered list of steps bound to a source repository. The order of
/// `steps` is the execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: Uuid,
    pub name: String,
    pub repo_url: Url,
    pub branch: String,
    pub steps: Vec<Step>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pipeline {
    /// Build a brand new pipeline from a create request
    ///
    /// Assigns a fresh id and stamps both timestamps with the current time.
    pub fn create(req: CreatePipeline) -> Result<Self> {
        let now = Utc::now();
        Self::from_request(Uuid::new_v4(), req, now, now)
    }

    /// Build the full replacement for this pipeline from an update request
    ///
    /// The id and `created_at` are carried over; `updated_at` is refreshed here
    /// and again by the store when the replacement is written.
    pub fn replaced_by(&self, req: CreatePipeline) -> Result<Self> {
        Self::from_request(self.id, req, self.created_at, Utc::now())
    }

    fn from_request(
        id: Uuid,
        req: CreatePipeline,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyPipelineName);
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(ValidationError::PipelineNameTooLong {
                max: MAX_NAME_LENGTH,
            });
        }

        let branch = req.branch.trim();
        if branch.is_empty() {
            return Err(ValidationError::EmptyBranch);
        }

        Ok(Self {
            id,
            name: name.to_string(),
            repo_url: parse_repo_url(&req.repo_url)?,
            branch: branch.to_string(),
            steps: req.steps,
            created_at,
            updated_at,
        })
    }
}

/// Parse a repository URL, accepting only absolute http(s) URLs with a host
pub fn parse_repo_url(raw: &str) -> Result<Url> {
    let invalid = |reason: &str| ValidationError::InvalidRepoUrl {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(&e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(invalid("missing host"));
    }

    Ok(url)
}

/// Kind of work a step performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepType {
    Run,
    Build,
    Deploy,
}

impl fmt::Display for StepType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepType::Run => write!(f, "run"),
            StepType::Build => write!(f, "build"),
            StepType::Deploy => write!(f, "deploy"),
        }
    }
}

impl FromStr for StepType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "run" => Ok(StepType::Run),
            "build" => Ok(StepType::Build),
            "deploy" => Ok(StepType::Deploy),
            other => Err(ValidationError::UnknownStepType(other.to_string())),
        }
    }
}

/// Type-specific payload of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepAction {
    /// Execute a shell command
    Run { command: String },
    /// Build a Docker image and push it to an ECR repository
    Build { dockerfile: String, ecr_repo: String },
    /// Apply a Kubernetes manifest
    Deploy { manifest: String },
}

impl StepAction {
    pub fn step_type(&self) -> StepType {
        match self {
            StepAction::Run { .. } => StepType::Run,
            StepAction::Build { .. } => StepType::Build,
            StepAction::Deploy { .. } => StepType::Deploy,
        }
    }
}

/// One unit of pipeline work
///
/// Steps can only be obtained through the validating constructors or by
/// deserializing a [`StepDefinition`], so a step of type `build` always carries
/// a Dockerfile and a target repository, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StepDefinition", into = "StepDefinition")]
pub struct Step {
    name: String,
    action: StepAction,
    timeout_seconds: u32,
    continue_on_error: bool,
}

impl Step {
    pub fn run(name: impl Into<String>, command: impl Into<String>) -> Result<Self> {
        Self::new(
            name.into(),
            StepAction::Run {
                command: command.into(),
            },
        )
    }

    pub fn build(
        name: impl Into<String>,
        dockerfile: impl Into<String>,
        ecr_repo: impl Into<String>,
    ) -> Result<Self> {
        Self::new(
            name.into(),
            StepAction::Build {
                dockerfile: dockerfile.into(),
                ecr_repo: ecr_repo.into(),
            },
        )
    }

    pub fn deploy(name: impl Into<String>, manifest: impl Into<String>) -> Result<Self> {
        Self::new(
            name.into(),
            StepAction::Deploy {
                manifest: manifest.into(),
            },
        )
    }

    /// Validate and assemble a step with default timeout and error policy
    pub fn new(name: String, action: StepAction) -> Result<Self> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyStepName);
        }

        let blank = |s: &str| s.trim().is_empty();
        match &action {
            StepAction::Run { command } if blank(command) => {
                return Err(ValidationError::MissingCommand);
            }
            StepAction::Build {
                dockerfile,
                ecr_repo,
            } if blank(dockerfile) || blank(ecr_repo) => {
                return Err(ValidationError::MissingBuildTarget);
            }
            StepAction::Deploy { manifest } if blank(manifest) => {
                return Err(ValidationError::MissingManifest);
            }
            _ => {}
        }

        Ok(Self {
            name,
            action,
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            continue_on_error: false,
        })
    }

    /// Set the step timeout, bounded to [1, 3600] seconds
    pub fn with_timeout(mut self, seconds: i64) -> Result<Self> {
        let min = i64::from(MIN_TIMEOUT_SECONDS);
        let max = i64::from(MAX_TIMEOUT_SECONDS);
        if !(min..=max).contains(&seconds) {
            return Err(ValidationError::TimeoutOutOfRange {
                value: seconds,
                min: MIN_TIMEOUT_SECONDS,
                max: MAX_TIMEOUT_SECONDS,
            });
        }
        self.timeout_seconds = seconds as u32;
        Ok(self)
    }

    pub fn with_continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn action(&self) -> &StepAction {
        &self.action
    }

    pub fn step_type(&self) -> StepType {
        self.action.step_type()
    }

    /// Stored with the step; the simulator does not enforce it
    pub fn timeout_seconds(&self) -> u32 {
        self.timeout_seconds
    }

    /// Stored with the step; a failing step always aborts its run
    pub fn continue_on_error(&self) -> bool {
        self.continue_on_error
    }
}

impl TryFrom<StepDefinition> for Step {
    type Error = ValidationError;

    fn try_from(def: StepDefinition) -> Result<Self> {
        let present = |field: Option<String>| field.filter(|v| !v.trim().is_empty());

        let action = match def.step_type.parse::<StepType>()? {
            StepType::Run => StepAction::Run {
                command: present(def.command).ok_or(ValidationError::MissingCommand)?,
            },
            StepType::Build => match (present(def.dockerfile), present(def.ecr_repo)) {
                (Some(dockerfile), Some(ecr_repo)) => StepAction::Build {
                    dockerfile,
                    ecr_repo,
                },
                _ => return Err(ValidationError::MissingBuildTarget),
            },
            StepType::Deploy => StepAction::Deploy {
                manifest: present(def.manifest).ok_or(ValidationError::MissingManifest)?,
            },
        };

        Ok(Step::new(def.name, action)?
            .with_timeout(def.timeout_seconds)?
            .with_continue_on_error(def.continue_on_error))
    }
}

impl From<Step> for StepDefinition {
    fn from(step: Step) -> Self {
        let mut def = StepDefinition {
            name: step.name,
            step_type: step.action.step_type().to_string(),
            command: None,
            dockerfile: None,
            ecr_repo: None,
            manifest: None,
            timeout_seconds: i64::from(step.timeout_seconds),
            continue_on_error: step.continue_on_error,
        };

        match step.action {
            StepAction::Run { command } => def.command = Some(command),
            StepAction::Build {
                dockerfile,
                ecr_repo,
            } => {
                def.dockerfile = Some(dockerfile);
                def.ecr_repo = Some(ecr_repo);
            }
            StepAction::Deploy { manifest } => def.manifest = Some(manifest),
        }

        def
    }
}
