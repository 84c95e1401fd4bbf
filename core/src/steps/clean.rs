use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::paths;
use crate::step::{StepEnv, StepWork};

pub struct Clean;

#[async_trait]
impl StepWork for Clean {
    async fn execute(&self, env: &StepEnv<'_>) -> PipelineResult<()> {
        env.info("Clean project...");
        paths::remove_dir(&env.paths().cmake())?;
        paths::remove_dir(&env.paths().install())
    }
}
