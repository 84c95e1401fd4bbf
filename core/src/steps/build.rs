use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::runner::CommandLine;
use crate::step::{StepEnv, StepWork};
use crate::tool::Tool;

pub struct Build;

#[async_trait]
impl StepWork for Build {
    async fn execute(&self, env: &StepEnv<'_>) -> PipelineResult<()> {
        let make = env.resolve(Tool::Make).await?;

        env.info("Build project...");
        env.run(
            CommandLine::new(make.program(), env.paths().cmake())
                .arg(format!("-j{}", env.ctx().jobs()))
                .arg("install"),
        )
        .await
    }
}
