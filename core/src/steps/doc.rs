use async_trait::async_trait;

use super::fetch_once;
use crate::error::PipelineResult;
use crate::paths;
use crate::runner::CommandLine;
use crate::step::{StepEnv, StepWork};
use crate::tool::Tool;

pub struct Doc;

#[async_trait]
impl StepWork for Doc {
    async fn execute(&self, env: &StepEnv<'_>) -> PipelineResult<()> {
        let doxygen = env.resolve(Tool::Doxygen).await?;
        let paths = env.paths();
        let doc = &env.ctx().config().doc;

        // doxygen picks plantuml.jar up from the download directory
        let plantuml = paths.download().join("plantuml.jar");
        fetch_once(env, &doc.plantuml_url, &plantuml).await?;

        env.info("Generate documentation...");
        paths::ensure_dir(&paths.documentation())?;
        env.run(
            CommandLine::new(doxygen.program(), paths.project())
                .path_arg(&paths.project().join(&doc.doxyfile)),
        )
        .await?;

        env.info(&format!(
            "Documentation was written to {}.",
            paths.documentation().display()
        ));
        Ok(())
    }
}
