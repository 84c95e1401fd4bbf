use async_trait::async_trait;

use crate::context::ExecutionContext;
use crate::error::PipelineResult;
use crate::paths;
use crate::runner::CommandLine;
use crate::step::{StepEnv, StepWork};
use crate::tool::{resolve_first, ResolvedTool, Tool};

pub struct Bootstrap;

#[async_trait]
impl StepWork for Bootstrap {
    async fn execute(&self, env: &StepEnv<'_>) -> PipelineResult<()> {
        let catalog = env.ctx().catalog();
        let compiler = resolve_first(
            env.tools(),
            "compiler",
            &[catalog.spec(Tool::Gcc), catalog.spec(Tool::Clang)],
        )
        .await?;
        let cmake = env.resolve(Tool::CMake).await?;

        env.info(&format!(
            "Bootstrap project for target {} using {}...",
            env.ctx().mode(),
            compiler.name
        ));
        paths::ensure_dir(&env.paths().cmake())?;
        env.run(configure_command(env.ctx(), &cmake)).await
    }
}

fn configure_command(ctx: &ExecutionContext, cmake: &ResolvedTool) -> CommandLine {
    let paths = ctx.paths();
    let minimal = if ctx.config().project.minimal { "ON" } else { "OFF" };

    CommandLine::new(cmake.program(), paths.cmake())
        .path_arg(paths.project())
        .arg(format!("-DCMAKE_INSTALL_PREFIX={}", paths.install().display()))
        .arg(format!("-DCMAKE_BUILD_TYPE={}", ctx.mode()))
        .arg(format!("-DMINIMAL={}", minimal))
        .arg(format!("-DLIBRARY_VERSION={}", ctx.library_version()))
}
