use std::fmt;
use std::fs::File;
use std::path::Path;

use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::{PipelineError, PipelineResult};
use crate::mode::TargetMode;
use crate::paths::ProjectPaths;
use crate::runner::{CommandLine, CommandRunner, OutputRouting};
use crate::tool::{ResolvedTool, Tool, ToolResolver};

#[async_trait]
pub trait StepWork: Send + Sync {
    async fn execute(&self, env: &StepEnv<'_>) -> PipelineResult<()>;
}

pub struct NoWork;

#[async_trait]
impl StepWork for NoWork {
    async fn execute(&self, _env: &StepEnv<'_>) -> PipelineResult<()> {
        Ok(())
    }
}

pub struct StepEnv<'a> {
    ctx: &'a ExecutionContext,
    tools: &'a dyn ToolResolver,
    runner: &'a dyn CommandRunner,
}

impl<'a> StepEnv<'a> {
    pub fn new(
        ctx: &'a ExecutionContext,
        tools: &'a dyn ToolResolver,
        runner: &'a dyn CommandRunner,
    ) -> Self {
        Self { ctx, tools, runner }
    }

    pub fn ctx(&self) -> &ExecutionContext {
        self.ctx
    }

    pub fn paths(&self) -> &ProjectPaths {
        self.ctx.paths()
    }

    pub fn tools(&self) -> &dyn ToolResolver {
        self.tools
    }

    pub fn info(&self, message: &str) {
        self.ctx.logger().info(message);
    }

    pub async fn resolve(&self, tool: Tool) -> PipelineResult<ResolvedTool> {
        self.tools.resolve(self.ctx.catalog().spec(tool)).await
    }

    pub async fn run(&self, command: CommandLine) -> PipelineResult<()> {
        self.runner.run(&command, OutputRouting::Log).await
    }

    pub async fn run_routed(
        &self,
        command: CommandLine,
        routing: OutputRouting,
    ) -> PipelineResult<()> {
        self.runner.run(&command, routing).await
    }

    pub fn create_report(&self, path: &Path) -> PipelineResult<File> {
        File::create(path).map_err(|e| PipelineError::io("create", path, e))
    }
}

pub struct StepDescriptor {
    name: &'static str,
    help: &'static str,
    prerequisites: Vec<&'static str>,
    mode: Option<TargetMode>,
    work: Box<dyn StepWork>,
}

impl StepDescriptor {
    pub fn new(name: &'static str, help: &'static str, work: impl StepWork + 'static) -> Self {
        Self {
            name,
            help,
            prerequisites: Vec::new(),
            mode: None,
            work: Box::new(work),
        }
    }

    pub fn after<I>(mut self, prerequisites: I) -> Self
    where
        I: IntoIterator<Item = &'static str>,
    {
        self.prerequisites.extend(prerequisites);
        self
    }

    /// Forces the target mode for this step and its prerequisites.
    pub fn with_mode(mut self, mode: TargetMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn help(&self) -> &'static str {
        self.help
    }

    pub fn prerequisites(&self) -> &[&'static str] {
        &self.prerequisites
    }

    pub fn mode(&self) -> Option<TargetMode> {
        self.mode
    }

    pub fn work(&self) -> &dyn StepWork {
        self.work.as_ref()
    }
}

impl fmt::Debug for StepDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StepDescriptor")
            .field("name", &self.name)
            .field("prerequisites", &self.prerequisites)
            .field("mode", &self.mode)
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for StepStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepStatus::Pending => "pending",
            StepStatus::Running => "running",
            StepStatus::Succeeded => "succeeded",
            StepStatus::Failed => "failed",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let step = StepDescriptor::new("coverage", "collects coverage", NoWork)
            .after(["build"])
            .with_mode(TargetMode::Coverage);

        assert_eq!(step.name(), "coverage");
        assert_eq!(step.help(), "collects coverage");
        assert_eq!(step.prerequisites(), &["build"]);
        assert_eq!(step.mode(), Some(TargetMode::Coverage));
    }

    #[test]
    fn test_prerequisites_keep_order() {
        let step = StepDescriptor::new("all", "", NoWork)
            .after(["clean", "build"])
            .after(["test", "package"]);
        assert_eq!(step.prerequisites(), &["clean", "build", "test", "package"]);
    }

    #[test]
    fn test_status_display() {
        assert_eq!(StepStatus::Pending.to_string(), "pending");
        assert_eq!(StepStatus::Failed.to_string(), "failed");
    }
}
