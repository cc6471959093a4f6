//! Step simulator
//!
//! Stands in for real work: each step logs what it would do, sleeps for a
//! multiple of the configured time unit, then reports success. Nothing is
//! actually executed, built or deployed.

use async_trait::async_trait;
use delivery_core::domain::pipeline::{Step, StepAction};
use std::time::Duration;
use tracing::{debug, info};

use super::{ExecutionError, RunRecorder, StepExecutor};

pub struct SimulatedStepExecutor {
    time_unit: Duration,
}

impl SimulatedStepExecutor {
    pub fn new(time_unit: Duration) -> Self {
        Self { time_unit }
    }
}

#[async_trait]
impl StepExecutor for SimulatedStepExecutor {
    async fn execute_step(
        &self,
        recorder: &mut RunRecorder,
        step: &Step,
        index: usize,
    ) -> Result<(), ExecutionError> {
        recorder.set_current_step(index);
        recorder.log(format!(
            "[step {}] Starting '{}' of type '{}'",
            index + 1,
            step.name(),
            step.step_type()
        ))?;

        debug!("Run {}: executing step '{}'", recorder.run().id, step.name());

        match step.action() {
            StepAction::Run { command } => {
                recorder.log(format!("Running shell command: '{command}'"))?;
                tokio::time::sleep(self.time_unit).await;
                recorder.log("Command finished with exit code 0")?;
            }
            StepAction::Build {
                dockerfile,
                ecr_repo,
            } => {
                recorder.log(format!(
                    "Building Docker image from {dockerfile} and pushing to {ecr_repo}"
                ))?;
                tokio::time::sleep(self.time_unit * 3 / 2).await;
                recorder.log("Image built and pushed successfully")?;
                info!(
                    run_id = %recorder.run().id,
                    step = step.name(),
                    ecr_repo = %ecr_repo,
                    "build step complete"
                );
            }
            StepAction::Deploy { manifest } => {
                recorder.log(format!("Applying manifest {manifest} to cluster"))?;
                tokio::time::sleep(self.time_unit).await;
                recorder.log("Deployment applied")?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::{Store, run_repository};
    use delivery_core::domain::run::Run;
    use uuid::Uuid;

    async fn simulate(step: Step, index: usize) -> Run {
        let store = Store::new();
        let run = run_repository::create(&store, Run::new(Uuid::new_v4()));
        let mut recorder = RunRecorder::new(store.clone(), run.clone());

        SimulatedStepExecutor::new(Duration::from_millis(1))
            .execute_step(&mut recorder, &step, index)
            .await
            .unwrap();

        // Everything the recorder saw has been written back
        let stored = run_repository::find_by_id(&store, run.id).unwrap();
        assert_eq!(&stored, recorder.run());
        stored
    }

    #[tokio::test]
    async fn test_run_step_logs() {
        let run = simulate(Step::run("lint", "make lint").unwrap(), 0).await;

        assert_eq!(
            run.logs,
            vec![
                "[step 1] Starting 'lint' of type 'run'",
                "Running shell command: 'make lint'",
                "Command finished with exit code 0",
            ]
        );
        assert_eq!(run.current_step, Some(0));
    }

    #[tokio::test]
    async fn test_build_step_logs() {
        let step = Step::build("image", "./Dockerfile", "web-app").unwrap();
        let run = simulate(step, 1).await;

        assert_eq!(
            run.logs,
            vec![
                "[step 2] Starting 'image' of type 'build'",
                "Building Docker image from ./Dockerfile and pushing to web-app",
                "Image built and pushed successfully",
            ]
        );
        assert_eq!(run.current_step, Some(1));
    }

    #[tokio::test]
    async fn test_deploy_step_logs() {
        let run = simulate(Step::deploy("ship", "k8s/app.yaml").unwrap(), 2).await;

        assert_eq!(
            run.logs,
            vec![
                "[step 3] Starting 'ship' of type 'deploy'",
                "Applying manifest k8s/app.yaml to cluster",
                "Deployment applied",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_build_waits_longer_than_run() {
        let store = Store::new();
        let run = run_repository::create(&store, Run::new(Uuid::new_v4()));
        let mut recorder = RunRecorder::new(store, run);
        let simulator = SimulatedStepExecutor::new(Duration::from_secs(10));

        let start = tokio::time::Instant::now();
        simulator
            .execute_step(&mut recorder, &Step::run("t", "true").unwrap(), 0)
            .await
            .unwrap();
        let run_elapsed = start.elapsed();
        assert!(run_elapsed >= Duration::from_secs(10));

        let start = tokio::time::Instant::now();
        simulator
            .execute_step(&mut recorder, &Step::build("b", "Dockerfile", "r").unwrap(), 1)
            .await
            .unwrap();
        let build_elapsed = start.elapsed();
        assert!(build_elapsed >= Duration::from_secs(15));
        assert!(build_elapsed > run_elapsed);
    }
}
