//! Workflow generation
//!
//! Renders a GitHub Actions workflow that mirrors a pipeline's steps. The
//! generated jobs only echo what they would do, like the simulator.

use delivery_core::domain::pipeline::{Pipeline, Step, StepAction};
use std::fmt::Write;
use uuid::Uuid;

/// File name of the workflow generated for a pipeline
pub fn workflow_file_name(pipeline_id: Uuid) -> String {
    format!("pipeline-{pipeline_id}.yml")
}

/// Branch the workflow is committed to before being merged
pub fn provisioning_branch(pipeline_id: Uuid) -> String {
    format!("delivery/pipeline-{pipeline_id}")
}

/// Renders the complete workflow file for `pipeline`
pub fn render_workflow(pipeline: &Pipeline) -> String {
    let steps = if pipeline.steps.is_empty() {
        default_steps()
    } else {
        render_steps(&pipeline.steps)
    };

    format!(
        r#"name: Pipeline {id}

on:
  workflow_dispatch:
    inputs:
      pipeline_id:
        description: "Delivery pipeline id"
        required: true
      repo_url:
        description: "Repository URL"
        required: false
      branch:
        description: "Branch to build"
        required: false
        default: {branch}
      environment:
        description: "Target environment"
        required: false
        default: "staging"

jobs:
  pipeline:
    name: {name}
    runs-on: ubuntu-latest
    steps:
      - name: Checkout
        uses: actions/checkout@v4
{steps}"#,
        id = pipeline.id,
        branch = quote(&pipeline.branch),
        name = quote(&pipeline.name),
        steps = steps,
    )
}

fn render_steps(steps: &[Step]) -> String {
    let mut out = String::new();
    for step in steps {
        let command = match step.action() {
            StepAction::Run { command } => command.clone(),
            StepAction::Build {
                dockerfile,
                ecr_repo,
            } => format!("echo \"Building {dockerfile} and pushing to {ecr_repo}\""),
            StepAction::Deploy { manifest } => format!("echo \"Applying {manifest}\""),
        };
        push_step(&mut out, step.name(), &command);
    }
    out
}

/// Placeholder jobs for a pipeline without steps
fn default_steps() -> String {
    let mut out = String::new();
    push_step(&mut out, "Simulate build step", "echo \"Building...\"");
    push_step(&mut out, "Simulate test step", "echo \"Testing...\"");
    push_step(&mut out, "Simulate deploy step", "echo \"Deploying...\"");
    out
}

fn push_step(out: &mut String, name: &str, command: &str) {
    // Writing to a String cannot fail
    let _ = writeln!(out, "      - name: {}", quote(name));
    let _ = writeln!(out, "        run: {}", quote(command));
}

/// Double-quoted YAML scalar
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use delivery_core::dto::pipeline::CreatePipeline;

    fn pipeline(steps: Vec<Step>) -> Pipeline {
        Pipeline::create(CreatePipeline {
            name: "web".to_string(),
            repo_url: "https://github.com/acme/web".to_string(),
            branch: "main".to_string(),
            steps,
        })
        .unwrap()
    }

    #[test]
    fn test_workflow_from_pipeline_steps() {
        let pipeline = pipeline(vec![
            Step::build("Build App", "./Dockerfile", "my-repo").unwrap(),
            Step::deploy("Deploy", "./k8s/deploy.yaml").unwrap(),
            Step::run("Run Tests", "npm test").unwrap(),
        ]);

        let content = render_workflow(&pipeline);

        assert!(content.starts_with(&format!("name: Pipeline {}", pipeline.id)));
        assert!(content.contains("workflow_dispatch"));
        assert!(content.contains("- name: \"Build App\""));
        assert!(content.contains("./k8s/deploy.yaml"));
        assert!(content.contains("run: \"npm test\""));
        assert!(!content.contains("Simulate build step"));
    }

    #[test]
    fn test_workflow_without_steps_uses_defaults() {
        let content = render_workflow(&pipeline(vec![]));

        assert!(content.contains("Simulate build step"));
        assert!(content.contains("Simulate test step"));
        assert!(content.contains("Simulate deploy step"));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote(r#"echo "hi""#), r#""echo \"hi\"""#);
        assert_eq!(quote("a\\b\nc"), r#""a\\b\nc""#);
    }

    #[test]
    fn test_names() {
        let id = Uuid::nil();
        assert_eq!(
            workflow_file_name(id),
            "pipeline-00000000-0000-0000-0000-000000000000.yml"
        );
        assert_eq!(
            provisioning_branch(id),
            "delivery/pipeline-00000000-0000-0000-0000-000000000000"
        );
    }
}
