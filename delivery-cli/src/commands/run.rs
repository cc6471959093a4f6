//! Run command handlers
//!
//! Inspects runs and follows them while they execute.

use anyhow::Result;
use clap::Subcommand;
use colored::*;
use delivery_client::OrchestratorClient;
use delivery_core::domain::run::{Run, RunStatus};
use std::time::Duration;
use uuid::Uuid;

use crate::config::Config;
use crate::id_resolver::resolve_run_id;
use crate::types::IdOrPrefix;

/// Run subcommands
#[derive(Subcommand)]
pub enum RunCommands {
    /// Get run details and logs
    Get {
        /// Run ID (a prefix needs --pipeline)
        id: String,

        /// Pipeline ID or prefix used to resolve a run ID prefix
        #[arg(short, long)]
        pipeline: Option<String>,
    },
    /// Follow a run, printing new log lines until it finishes
    Watch {
        /// Run ID (a prefix needs --pipeline)
        id: String,

        /// Pipeline ID or prefix used to resolve a run ID prefix
        #[arg(short, long)]
        pipeline: Option<String>,

        /// Polling interval in seconds
        #[arg(short, long, default_value = "1")]
        interval: u64,
    },
}

/// Handle run commands
pub async fn handle_run_command(command: RunCommands, config: &Config) -> Result<()> {
    let client = config.client()?;

    match command {
        RunCommands::Get { id, pipeline } => {
            let uuid = resolve(&client, &id, pipeline.as_deref()).await?;
            let run = client.get_run(uuid).await?;
            print_run_details(&run);
            Ok(())
        }
        RunCommands::Watch {
            id,
            pipeline,
            interval,
        } => {
            let uuid = resolve(&client, &id, pipeline.as_deref()).await?;
            follow_run(&client, uuid, Duration::from_secs(interval.max(1))).await
        }
    }
}

async fn resolve(client: &OrchestratorClient, id: &str, pipeline: Option<&str>) -> Result<Uuid> {
    let pipeline = pipeline.map(IdOrPrefix::parse);
    resolve_run_id(client, &IdOrPrefix::parse(id), pipeline.as_ref()).await
}

/// Poll a run, printing only log lines not printed yet, until it is terminal
pub async fn follow_run(client: &OrchestratorClient, run_id: Uuid, interval: Duration) -> Result<()> {
    let mut printed = 0;

    loop {
        let run = client.get_run(run_id).await?;

        for line in unseen_lines(&run, printed) {
            println!("{}", line);
        }
        printed = run.logs.len();

        if run.is_terminal() {
            println!(
                "Run finished with status: {}",
                colored_status(run.status).bold()
            );
            return Ok(());
        }

        tokio::time::sleep(interval).await;
    }
}

/// Log lines past the first `printed` ones
fn unseen_lines(run: &Run, printed: usize) -> &[String] {
    run.logs.get(printed..).unwrap_or_default()
}

fn colored_status(status: RunStatus) -> ColoredString {
    let text = status.to_string();
    match status {
        RunStatus::Succeeded => text.green(),
        RunStatus::Failed => text.red(),
        RunStatus::Cancelled => text.dimmed(),
        RunStatus::Pending | RunStatus::Running => text.yellow(),
    }
}

/// Print a run summary
pub fn print_run_summary(run: &Run) {
    println!("  {} {}", "▸".cyan(), run.id.to_string().bold());
    println!("    Status:  {}", colored_status(run.status));
    if let Some(started_at) = run.started_at {
        println!(
            "    Started: {}",
            started_at
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed()
        );
    }
    println!();
}

/// Print detailed run information
fn print_run_details(run: &Run) {
    println!("{}", "Run Details:".bold());
    println!("  ID:          {}", run.id.to_string().cyan());
    println!("  Pipeline ID: {}", run.pipeline_id.to_string().dimmed());
    println!("  Status:      {}", colored_status(run.status));
    if let Some(step) = run.current_step {
        println!("  Step:        {}", step);
    }
    if let Some(started_at) = run.started_at {
        println!("  Started:     {}", started_at.format("%Y-%m-%d %H:%M:%S"));
    }
    if let Some(finished_at) = run.finished_at {
        println!("  Finished:    {}", finished_at.format("%Y-%m-%d %H:%M:%S"));
    }

    println!("\n{}", "Logs:".bold());
    println!("{}", "─".repeat(80).dimmed());
    for line in &run.logs {
        println!("{}", line);
    }
    println!("{}", "─".repeat(80).dimmed());
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with_logs(lines: &[&str]) -> Run {
        let mut run = Run::new(Uuid::new_v4());
        run.logs = lines.iter().map(|l| l.to_string()).collect();
        run
    }

    #[test]
    fn test_unseen_lines() {
        let run = run_with_logs(&["a", "b", "c"]);

        assert_eq!(unseen_lines(&run, 0), ["a", "b", "c"]);
        assert_eq!(unseen_lines(&run, 2), ["c"]);
        assert!(unseen_lines(&run, 3).is_empty());
    }

    #[test]
    fn test_unseen_lines_past_end() {
        let run = run_with_logs(&["a"]);
        assert!(unseen_lines(&run, 5).is_empty());
    }
}
