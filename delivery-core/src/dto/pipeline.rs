//! Pipeline DTOs

use serde::{Deserialize, Serialize};

use crate::domain::pipeline::{DEFAULT_BRANCH, DEFAULT_TIMEOUT_SECONDS, Step};

/// Request to create a pipeline, or to fully replace an existing one
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePipeline {
    pub name: String,
    pub repo_url: String,
    #[serde(default = "default_branch")]
    pub branch: String,
    pub steps: Vec<Step>,
}

/// Wire shape of a step
///
/// All type-specific fields are optional here; converting into a
/// [`Step`] checks that the ones required by `type` are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub step_type: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub dockerfile: Option<String>,
    #[serde(default)]
    pub ecr_repo: Option<String>,
    #[serde(default)]
    pub manifest: Option<String>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: i64,
    #[serde(default)]
    pub continue_on_error: bool,
}

fn default_branch() -> String {
    DEFAULT_BRANCH.to_string()
}

fn default_timeout_seconds() -> i64 {
    i64::from(DEFAULT_TIMEOUT_SECONDS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_create_pipeline_branch_defaults_to_main() {
        let req: CreatePipeline = serde_json::from_value(json!({
            "name": "web",
            "repo_url": "https://github.com/example/web",
            "steps": [{"name": "lint", "type": "run", "command": "make lint"}]
        }))
        .unwrap();

        assert_eq!(req.branch, "main");
        assert_eq!(req.steps.len(), 1);
    }

    #[test]
    fn test_create_pipeline_with_invalid_step_fails() {
        let result = serde_json::from_value::<CreatePipeline>(json!({
            "name": "web",
            "repo_url": "https://github.com/example/web",
            "steps": [{"name": "bad", "type": "run"}]
        }));

        assert!(result.is_err());
    }
}
