//! Pipeline command handlers
//!
//! Handles all pipeline-related CLI commands including creation from a
//! JSON definition, listing, viewing, replacement, deletion and triggering.

use anyhow::{Context, Result};
use clap::Subcommand;
use colored::*;
use delivery_client::OrchestratorClient;
use delivery_core::domain::pipeline::{Pipeline, Step, StepAction};
use delivery_core::dto::pipeline::CreatePipeline;
use std::path::Path;
use std::time::Duration;

use crate::commands::run::{follow_run, print_run_summary};
use crate::config::Config;
use crate::id_resolver::resolve_pipeline_id;
use crate::types::IdOrPrefix;

/// Pipeline subcommands
#[derive(Subcommand)]
pub enum PipelineCommands {
    /// Create a new pipeline from a JSON definition
    Create {
        /// Path to the pipeline JSON file
        file: String,
    },
    /// List all pipelines
    List,
    /// Get pipeline details
    Get {
        /// Pipeline ID or unambiguous prefix
        id: String,
    },
    /// Replace a pipeline with a new JSON definition
    Update {
        /// Pipeline ID or unambiguous prefix
        id: String,

        /// Path to the pipeline JSON file
        file: String,
    },
    /// Delete a pipeline
    Delete {
        /// Pipeline ID or unambiguous prefix
        id: String,
    },
    /// Trigger a new run of a pipeline
    Trigger {
        /// Pipeline ID or unambiguous prefix
        id: String,

        /// Follow the run until it finishes
        #[arg(short, long)]
        watch: bool,

        /// Polling interval in seconds when following
        #[arg(short, long, default_value = "1")]
        interval: u64,
    },
    /// List the runs of a pipeline
    Runs {
        /// Pipeline ID or unambiguous prefix
        id: String,
    },
}

/// Handle pipeline commands
///
/// Routes pipeline subcommands to their respective handlers.
pub async fn handle_pipeline_command(command: PipelineCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        PipelineCommands::Create { file } => create_pipeline(&client, &file).await,
        PipelineCommands::List => list_pipelines(&client).await,
        PipelineCommands::Get { id } => get_pipeline(&client, &id).await,
        PipelineCommands::Update { id, file } => update_pipeline(&client, &id, &file).await,
        PipelineCommands::Delete { id } => delete_pipeline(&client, &id).await,
        PipelineCommands::Trigger {
            id,
            watch,
            interval,
        } => trigger_pipeline(&client, &id, watch, Duration::from_secs(interval.max(1))).await,
        PipelineCommands::Runs { id } => list_runs(&client, &id).await,
    }
}

/// Read and parse a pipeline definition file
///
/// Step validation happens while parsing, so malformed steps are reported
/// before anything is sent.
fn read_pipeline_file(path: impl AsRef<Path>) -> Result<CreatePipeline> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read pipeline file: {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Invalid pipeline definition in {}", path.display()))
}

/// Create a new pipeline from a JSON file
async fn create_pipeline(client: &OrchestratorClient, file: &str) -> Result<()> {
    let req = read_pipeline_file(file)?;

    let pipeline = client.create_pipeline(&req).await?;

    println!("{}", "✓ Pipeline created successfully!".green().bold());
    println!("  ID:     {}", pipeline.id.to_string().cyan());
    println!("  Name:   {}", pipeline.name.bold());
    println!("  Steps:  {}", step_names(&pipeline).dimmed());

    Ok(())
}

/// List all pipelines
async fn list_pipelines(client: &OrchestratorClient) -> Result<()> {
    let pipelines = client.list_pipelines().await?;

    if pipelines.is_empty() {
        println!("{}", "No pipelines found.".yellow());
    } else {
        println!(
            "{}",
            format!("Found {} pipeline(s):", pipelines.len()).bold()
        );
        println!();
        for pipeline in pipelines {
            print_pipeline_summary(&pipeline);
        }
    }

    Ok(())
}

/// Get and display a single pipeline
async fn get_pipeline(client: &OrchestratorClient, id: &str) -> Result<()> {
    let uuid = resolve_pipeline_id(client, &IdOrPrefix::parse(id)).await?;

    let pipeline = client.get_pipeline(uuid).await?;

    print_pipeline_details(&pipeline);

    Ok(())
}

/// Replace a pipeline definition
async fn update_pipeline(client: &OrchestratorClient, id: &str, file: &str) -> Result<()> {
    let req = read_pipeline_file(file)?;
    let uuid = resolve_pipeline_id(client, &IdOrPrefix::parse(id)).await?;

    let pipeline = client.update_pipeline(uuid, &req).await?;

    println!("{}", "✓ Pipeline updated successfully!".green().bold());
    println!("  ID:     {}", pipeline.id.to_string().cyan());
    println!("  Name:   {}", pipeline.name.bold());
    println!("  Steps:  {}", step_names(&pipeline).dimmed());

    Ok(())
}

/// Delete a pipeline
async fn delete_pipeline(client: &OrchestratorClient, id: &str) -> Result<()> {
    let uuid = resolve_pipeline_id(client, &IdOrPrefix::parse(id)).await?;

    client.delete_pipeline(uuid).await?;

    println!(
        "{}",
        format!("✓ Pipeline {} deleted successfully!", uuid)
            .green()
            .bold()
    );

    Ok(())
}

/// Trigger a run, optionally following it to completion
async fn trigger_pipeline(
    client: &OrchestratorClient,
    id: &str,
    watch: bool,
    interval: Duration,
) -> Result<()> {
    let uuid = resolve_pipeline_id(client, &IdOrPrefix::parse(id)).await?;

    let triggered = client.trigger_pipeline(uuid).await?;

    println!(
        "Triggered run: {} (status {})",
        triggered.run_id.to_string().cyan(),
        triggered.status.to_string().yellow()
    );

    if watch {
        follow_run(client, triggered.run_id, interval).await?;
    }

    Ok(())
}

/// List the runs of a pipeline
async fn list_runs(client: &OrchestratorClient, id: &str) -> Result<()> {
    let uuid = resolve_pipeline_id(client, &IdOrPrefix::parse(id)).await?;

    let runs = client.list_runs_by_pipeline(uuid).await?;

    if runs.is_empty() {
        println!("{}", "No runs found for this pipeline.".yellow());
    } else {
        println!("{}", format!("Found {} run(s):", runs.len()).bold());
        println!();
        for run in runs {
            print_run_summary(&run);
        }
    }

    Ok(())
}

fn step_names(pipeline: &Pipeline) -> String {
    if pipeline.steps.is_empty() {
        return "(none)".to_string();
    }
    pipeline
        .steps
        .iter()
        .map(Step::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Print a pipeline summary
fn print_pipeline_summary(pipeline: &Pipeline) {
    println!("  {} {}", "▸".cyan(), pipeline.name.bold());
    println!("    ID:      {}", pipeline.id.to_string().dimmed());
    println!(
        "    Repo:    {} @ {}",
        pipeline.repo_url.as_str().dimmed(),
        pipeline.branch.dimmed()
    );
    println!(
        "    Created: {}",
        pipeline
            .created_at
            .format("%Y-%m-%d %H:%M:%S")
            .to_string()
            .dimmed()
    );
    println!();
}

/// Print detailed pipeline information
fn print_pipeline_details(pipeline: &Pipeline) {
    println!("{}", "Pipeline Details:".bold());
    println!("  ID:          {}", pipeline.id.to_string().cyan());
    println!("  Name:        {}", pipeline.name.bold());
    println!("  Repository:  {}", pipeline.repo_url);
    println!("  Branch:      {}", pipeline.branch);
    println!(
        "  Created:     {}",
        pipeline.created_at.format("%Y-%m-%d %H:%M:%S")
    );
    println!(
        "  Updated:     {}",
        pipeline.updated_at.format("%Y-%m-%d %H:%M:%S")
    );

    println!("\n{}", "Steps:".bold());
    println!("{}", "─".repeat(80).dimmed());
    for (index, step) in pipeline.steps.iter().enumerate() {
        println!(
            "  {}. {} [{}] {}",
            index + 1,
            step.name().bold(),
            step.step_type().to_string().cyan(),
            describe_action(step.action()).dimmed()
        );
    }
    println!("{}", "─".repeat(80).dimmed());
}

fn describe_action(action: &StepAction) -> String {
    match action {
        StepAction::Run { command } => command.clone(),
        StepAction::Build {
            dockerfile,
            ecr_repo,
        } => format!("{} -> {}", dockerfile, ecr_repo),
        StepAction::Deploy { manifest } => manifest.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn write_temp(content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!("delivery-{}.json", Uuid::new_v4()));
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_pipeline_file() {
        let path = write_temp(
            r#"{
                "name": "web",
                "repo_url": "https://github.com/example/web",
                "steps": [
                    {"name": "test", "type": "run", "command": "make test"},
                    {"name": "image", "type": "build", "dockerfile": "Dockerfile", "ecr_repo": "web"}
                ]
            }"#,
        );

        let req = read_pipeline_file(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(req.name, "web");
        assert_eq!(req.branch, "main");
        assert_eq!(req.steps.len(), 2);
        assert_eq!(
            describe_action(req.steps[1].action()),
            "Dockerfile -> web"
        );
    }

    #[test]
    fn test_read_pipeline_file_rejects_incomplete_step() {
        let path = write_temp(
            r#"{"name": "web", "repo_url": "https://github.com/example/web",
                "steps": [{"name": "ship", "type": "deploy"}]}"#,
        );

        let err = read_pipeline_file(&path).unwrap_err();
        std::fs::remove_file(&path).unwrap();

        assert!(err.to_string().starts_with("Invalid pipeline definition"));
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_pipeline_file("/nonexistent/pipeline.json").unwrap_err();
        assert!(err.to_string().contains("Failed to read pipeline file"));
    }
}
