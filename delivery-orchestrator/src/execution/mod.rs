//! Run execution
//!
//! Drives a triggered run through its pipeline's steps, one at a time, on a
//! detached tokio task. Every state change is written back through the store
//! so pollers see progress as it happens.

pub mod simulator;

use async_trait::async_trait;
use chrono::Utc;
use delivery_core::domain::pipeline::{Pipeline, Step};
use delivery_core::domain::run::{Run, RunStatus};
use delivery_core::error::ValidationError;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::repository::{Store, run_repository};

pub use simulator::SimulatedStepExecutor;

/// Failure while executing a step
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("{0}")]
    StepFailed(String),

    #[error("Run {0} is no longer in the store")]
    RunMissing(Uuid),
}

/// Performs the work of a single step
#[async_trait]
pub trait StepExecutor: Send + Sync {
    /// Executes `step`, the `index`-th (zero-based) step of the run
    ///
    /// Implementations report progress through `recorder`; an error aborts
    /// the whole run.
    async fn execute_step(
        &self,
        recorder: &mut RunRecorder,
        step: &Step,
        index: usize,
    ) -> Result<(), ExecutionError>;
}

/// Working copy of a run that persists itself on every change
pub struct RunRecorder {
    store: Store,
    run: Run,
}

impl RunRecorder {
    pub fn new(store: Store, run: Run) -> Self {
        Self { store, run }
    }

    pub fn run(&self) -> &Run {
        &self.run
    }

    pub fn into_run(self) -> Run {
        self.run
    }

    /// Marks `index` as the active step; never moves backwards
    pub fn set_current_step(&mut self, index: usize) {
        if self.run.current_step.is_none_or(|current| current < index) {
            self.run.current_step = Some(index);
        }
    }

    /// Appends a log line and writes the run back to the store
    pub fn log(&mut self, line: impl Into<String>) -> Result<(), ExecutionError> {
        self.run.logs.push(line.into());
        self.persist()
    }

    fn persist(&self) -> Result<(), ExecutionError> {
        run_repository::update(&self.store, self.run.clone())
            .map(|_| ())
            .ok_or(ExecutionError::RunMissing(self.run.id))
    }
}

/// Runs pipelines to completion
pub struct RunExecutor {
    store: Store,
    steps: Arc<dyn StepExecutor>,
}

impl RunExecutor {
    pub fn new(store: Store, steps: Arc<dyn StepExecutor>) -> Self {
        Self { store, steps }
    }

    /// Executor backed by the step simulator
    pub fn simulated(store: Store, time_unit: Duration) -> Self {
        Self::new(store, Arc::new(SimulatedStepExecutor::new(time_unit)))
    }

    /// Checks that `run` can be executed for `pipeline`
    pub fn validate(pipeline: &Pipeline, run: &Run) -> Result<(), ValidationError> {
        if pipeline.id.is_nil() {
            return Err(ValidationError::MissingId("Pipeline"));
        }
        if pipeline.steps.is_empty() {
            return Err(ValidationError::NoSteps(pipeline.id));
        }
        if run.id.is_nil() {
            return Err(ValidationError::MissingId("Run"));
        }
        if run.pipeline_id.is_nil() {
            return Err(ValidationError::MissingId("Run pipeline"));
        }
        Ok(())
    }

    /// Executes every step of `pipeline` for `run`
    ///
    /// Precondition failures are returned before the run is touched. Step
    /// failures are not errors here: they end the run as `failed` with an
    /// `ERROR:` log line, and the final run is returned.
    pub async fn execute(&self, pipeline: &Pipeline, run: Run) -> Result<Run, ValidationError> {
        Self::validate(pipeline, &run)?;

        let mut recorder = RunRecorder::new(self.store.clone(), run);
        recorder.run.status = RunStatus::Running;
        recorder.run.started_at = Some(Utc::now());
        if let Err(e) = recorder.persist() {
            warn!("Failed to persist start of run: {}", e);
        }

        info!(
            "Run {} started for pipeline '{}' ({} steps)",
            recorder.run.id,
            pipeline.name,
            pipeline.steps.len()
        );

        match self.execute_steps(&mut recorder, &pipeline.steps).await {
            Ok(()) => {
                recorder.run.status = RunStatus::Succeeded;
            }
            Err(e) => {
                error!("Run {} failed: {}", recorder.run.id, e);
                recorder.run.logs.push(format!("ERROR: {e}"));
                recorder.run.status = RunStatus::Failed;
            }
        }

        recorder.run.finished_at = Some(Utc::now());
        if let Err(e) = recorder.persist() {
            warn!("Failed to persist end of run: {}", e);
        }

        info!(
            "Run {} finished with status {}",
            recorder.run.id, recorder.run.status
        );

        Ok(recorder.into_run())
    }

    async fn execute_steps(
        &self,
        recorder: &mut RunRecorder,
        steps: &[Step],
    ) -> Result<(), ExecutionError> {
        for (index, step) in steps.iter().enumerate() {
            self.steps.execute_step(recorder, step, index).await?;
        }
        Ok(())
    }

    /// Executes the run on a background task and returns immediately
    pub fn spawn(self: &Arc<Self>, pipeline: Pipeline, run: Run) -> JoinHandle<()> {
        self.spawn_after(pipeline, run, std::future::ready(Vec::new()))
    }

    /// Like [`RunExecutor::spawn`], but first awaits `prelude` on the
    /// background task and appends the lines it yields to the run's logs
    pub fn spawn_after<F>(
        self: &Arc<Self>,
        pipeline: Pipeline,
        mut run: Run,
        prelude: F,
    ) -> JoinHandle<()>
    where
        F: Future<Output = Vec<String>> + Send + 'static,
    {
        let executor = Arc::clone(self);
        tokio::spawn(async move {
            let lines = prelude.await;
            if !lines.is_empty() {
                run.logs.extend(lines);
                if run_repository::update(&executor.store, run.clone()).is_none() {
                    warn!("Run {} vanished before it started", run.id);
                }
            }

            let run_id = run.id;
            if let Err(e) = executor.execute(&pipeline, run).await {
                error!("Run {} rejected: {}", run_id, e);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::pipeline_repository;
    use delivery_core::dto::pipeline::CreatePipeline;

    fn pipeline(steps: Vec<Step>) -> Pipeline {
        Pipeline::create(CreatePipeline {
            name: "web".to_string(),
            repo_url: "https://github.com/example/web".to_string(),
            branch: "main".to_string(),
            steps,
        })
        .unwrap()
    }

    fn three_steps() -> Vec<Step> {
        vec![
            Step::run("A", "echo a").unwrap(),
            Step::run("B", "echo b").unwrap(),
            Step::run("C", "echo c").unwrap(),
        ]
    }

    /// Fails on the step with the given name
    struct FailOn(&'static str);

    #[async_trait]
    impl StepExecutor for FailOn {
        async fn execute_step(
            &self,
            recorder: &mut RunRecorder,
            step: &Step,
            index: usize,
        ) -> Result<(), ExecutionError> {
            recorder.set_current_step(index);
            recorder.log(format!("start {}", step.name()))?;
            if step.name() == self.0 {
                return Err(ExecutionError::StepFailed(format!("{} exploded", step.name())));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_successful_run() {
        let store = Store::new();
        let pipeline = pipeline_repository::create(&store, pipeline(three_steps()));
        let run = run_repository::create(&store, Run::new(pipeline.id));
        let executor = RunExecutor::simulated(store.clone(), Duration::from_millis(1));

        let finished = executor.execute(&pipeline, run.clone()).await.unwrap();

        assert_eq!(finished.status, RunStatus::Succeeded);
        assert_eq!(finished.current_step, Some(2));
        assert!(finished.started_at.unwrap() <= finished.finished_at.unwrap());
        assert_eq!(run_repository::find_by_id(&store, run.id), Some(finished));
    }

    #[tokio::test]
    async fn test_failure_short_circuits() {
        let store = Store::new();
        let pipeline = pipeline(three_steps());
        let run = run_repository::create(&store, Run::new(pipeline.id));
        let executor = RunExecutor::new(store.clone(), Arc::new(FailOn("B")));

        let finished = executor.execute(&pipeline, run).await.unwrap();

        assert_eq!(finished.status, RunStatus::Failed);
        assert_eq!(
            finished.logs,
            vec!["start A", "start B", "ERROR: B exploded"]
        );
        assert_eq!(finished.current_step, Some(1));
        assert!(finished.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_preconditions_leave_run_untouched() {
        let store = Store::new();
        let executor = RunExecutor::simulated(store.clone(), Duration::from_millis(1));

        let empty = pipeline(vec![]);
        let run = run_repository::create(&store, Run::new(empty.id));
        let result = executor.execute(&empty, run.clone()).await;
        assert_eq!(result, Err(ValidationError::NoSteps(empty.id)));
        assert_eq!(run_repository::find_by_id(&store, run.id), Some(run));

        let good = pipeline(three_steps());
        let mut orphan = Run::new(good.id);
        orphan.pipeline_id = Uuid::nil();
        assert_eq!(
            executor.execute(&good, orphan).await,
            Err(ValidationError::MissingId("Run pipeline"))
        );

        let mut anonymous = good.clone();
        anonymous.id = Uuid::nil();
        assert_eq!(
            RunExecutor::validate(&anonymous, &Run::new(good.id)),
            Err(ValidationError::MissingId("Pipeline"))
        );
    }

    #[tokio::test]
    async fn test_spawn_runs_in_background() {
        let store = Store::new();
        let pipeline = pipeline(three_steps());
        let run = run_repository::create(&store, Run::new(pipeline.id));
        let executor = Arc::new(RunExecutor::simulated(
            store.clone(),
            Duration::from_millis(1),
        ));

        executor.spawn(pipeline, run.clone()).await.unwrap();

        let stored = run_repository::find_by_id(&store, run.id).unwrap();
        assert_eq!(stored.status, RunStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_spawn_after_logs_prelude_first() {
        let store = Store::new();
        let pipeline = pipeline(three_steps());
        let run = run_repository::create(&store, Run::new(pipeline.id));
        let executor = Arc::new(RunExecutor::new(store.clone(), Arc::new(FailOn("none"))));

        executor
            .spawn_after(pipeline, run.clone(), async {
                vec!["first".to_string(), "second".to_string()]
            })
            .await
            .unwrap();

        let stored = run_repository::find_by_id(&store, run.id).unwrap();
        assert_eq!(
            stored.logs,
            vec!["first", "second", "start A", "start B", "start C"]
        );
        assert_eq!(stored.status, RunStatus::Succeeded);
    }

    #[test]
    fn test_current_step_never_decreases() {
        let mut recorder = RunRecorder::new(Store::new(), Run::new(Uuid::new_v4()));
        recorder.set_current_step(2);
        recorder.set_current_step(1);
        assert_eq!(recorder.run().current_step, Some(2));
    }

    #[test]
    fn test_log_on_unstored_run_fails() {
        let run = Run::new(Uuid::new_v4());
        let mut recorder = RunRecorder::new(Store::new(), run.clone());
        assert!(matches!(
            recorder.log("hello"),
            Err(ExecutionError::RunMissing(id)) if id == run.id
        ));
        assert_eq!(recorder.into_run().logs, vec!["hello"]);
    }
}
