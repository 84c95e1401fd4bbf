use std::future::Future;
use std::pin::Pin;
use std::time::{Duration, Instant};

use crate::context::ExecutionContext;
use crate::error::{PipelineError, PipelineResult};
use crate::registry::StepRegistry;
use crate::runner::CommandRunner;
use crate::step::{StepEnv, StepStatus};
use crate::tool::ToolResolver;

type StepFuture<'a> = Pin<Box<dyn Future<Output = PipelineResult<()>> + Send + 'a>>;

#[derive(Debug, Clone)]
pub struct StepRecord {
    pub name: String,
    pub status: StepStatus,
    pub duration: Duration,
}

#[derive(Debug)]
pub struct PipelineReport {
    pub records: Vec<StepRecord>,
    failure: Option<PipelineError>,
}

impl PipelineReport {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn failure(&self) -> Option<&PipelineError> {
        self.failure.as_ref()
    }

    pub fn failed_step(&self) -> Option<&str> {
        self.records
            .iter()
            .find(|r| r.status == StepStatus::Failed)
            .map(|r| r.name.as_str())
    }

    /// The failure as shown to the user. When a prerequisite failed, the
    /// requested step it ran for leads the message.
    pub fn failure_message(&self) -> Option<String> {
        let err = self.failure.as_ref()?;
        match self.failed_step() {
            Some(step) if err.step() != Some(step) => Some(format!("{}: {}", step, err)),
            _ => Some(err.to_string()),
        }
    }

    pub fn into_result(self) -> PipelineResult<Vec<StepRecord>> {
        match self.failure {
            Some(err) => Err(err),
            None => Ok(self.records),
        }
    }
}

/// Runs requested steps one after another against a registry.
///
/// Each step first runs its prerequisites, every time it is reached; there
/// is no "already ran" bookkeeping across steps. The first failure stops the
/// invocation and nothing already done is rolled back.
pub struct Pipeline<'a> {
    registry: &'a StepRegistry,
    tools: &'a dyn ToolResolver,
    runner: &'a dyn CommandRunner,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        registry: &'a StepRegistry,
        tools: &'a dyn ToolResolver,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self {
            registry,
            tools,
            runner,
        }
    }

    pub async fn run<S: AsRef<str>>(&self, requested: &[S], ctx: &ExecutionContext) -> PipelineReport {
        let mut records: Vec<StepRecord> = requested
            .iter()
            .map(|name| StepRecord {
                name: name.as_ref().to_string(),
                status: StepStatus::Pending,
                duration: Duration::ZERO,
            })
            .collect();

        if let Err(err) = self.registry.check_requested(requested) {
            return PipelineReport {
                records,
                failure: Some(err),
            };
        }

        let mut failure = None;

        for record in records.iter_mut() {
            record.status = StepStatus::Running;
            let start = Instant::now();

            let result = self.execute(&record.name, ctx).await;
            record.duration = start.elapsed();

            match result {
                Ok(()) => record.status = StepStatus::Succeeded,
                Err(err) => {
                    record.status = StepStatus::Failed;
                    failure = Some(err);
                    break;
                }
            }
        }

        PipelineReport { records, failure }
    }

    fn execute<'b>(&'b self, name: &'b str, ctx: &'b ExecutionContext) -> StepFuture<'b> {
        Box::pin(async move {
            let step = self
                .registry
                .get(name)
                .ok_or_else(|| PipelineError::UnknownStep(name.to_string()))?;

            let derived;
            let ctx = match step.mode() {
                Some(mode) if mode != ctx.mode() => {
                    ctx.logger()
                        .debug(&format!("{} switches target to {}", name, mode));
                    derived = ctx.with_mode(mode);
                    &derived
                }
                _ => ctx,
            };

            for prerequisite in step.prerequisites() {
                self.execute(prerequisite, ctx).await?;
            }

            ctx.logger().debug(&format!("step {} ({})", name, ctx.mode()));
            let env = StepEnv::new(ctx, self.tools, self.runner);
            step.work()
                .execute(&env)
                .await
                .map_err(|err| err.in_step(name))
        })
    }
}
