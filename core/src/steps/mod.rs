mod bootstrap;
mod build;
mod check;
mod clean;
mod coverage;
mod doc;
mod package;
mod publish;
mod update;

use std::path::Path;

pub use bootstrap::Bootstrap;
pub use build::Build;
pub use check::Check;
pub use clean::Clean;
pub use coverage::Coverage;
pub use doc::Doc;
pub use package::Package;
pub use publish::{render_template, Publish};
pub use test::Test;
pub use update::Update;

use crate::error::PipelineResult;
use crate::mode::TargetMode;
use crate::paths;
use crate::registry::{GraphError, StepRegistry};
use crate::runner::CommandLine;
use crate::step::{NoWork, StepDescriptor, StepEnv};
use crate::tool::Tool;

pub fn builtin_registry() -> Result<StepRegistry, GraphError> {
    let mut registry = StepRegistry::new();

    for step in [
        StepDescriptor::new("clean", "removes all built output", Clean),
        StepDescriptor::new("update", "generates new file lists", Update),
        StepDescriptor::new("bootstrap", "configures the build tree for the target", Bootstrap),
        StepDescriptor::new(
            "build",
            "compiles the target and installs it to the install path",
            Build,
        )
        .after(["bootstrap"]),
        StepDescriptor::new("test", "executes unit and integration tests", Test).after(["build"]),
        StepDescriptor::new("check", "generates reports of all checking tools", Check)
            .after(["build"]),
        StepDescriptor::new("coverage", "generates coverage reports", Coverage)
            .after(["build"])
            .with_mode(TargetMode::Coverage),
        StepDescriptor::new("doc", "generates documentation", Doc),
        StepDescriptor::new("package", "builds packages", Package).after(["test"]),
        StepDescriptor::new("publish", "uploads reports to the analysis server", Publish)
            .after(["clean", "coverage", "check"]),
        StepDescriptor::new("all", "builds all steps to make a package", NoWork)
            .after(["clean", "build", "test", "package"]),
    ] {
        registry.register(step)?;
    }

    registry.validate()?;
    Ok(registry)
}

pub(crate) async fn fetch_once(env: &StepEnv<'_>, url: &str, dest: &Path) -> PipelineResult<()> {
    if dest.is_file() {
        env.ctx()
            .logger()
            .debug(&format!("{} is cached", dest.display()));
        return Ok(());
    }

    let wget = env.resolve(Tool::Wget).await?;
    if let Some(parent) = dest.parent() {
        paths::ensure_dir(parent)?;
    }

    env.info(&format!("Download {}...", url));
    let command = CommandLine::new(wget.program(), env.paths().build())
        .args(["--tries=3", "--timeout=3", "-O"])
        .path_arg(dest)
        .arg(url);

    let result = env.run(command).await;
    if result.is_err() {
        match std::fs::remove_file(dest) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => {
                env.ctx().logger().warning(&format!(
                    "Could not remove partial download {}: {}",
                    dest.display(),
                    e
                ));
            }
            _ => {}
        }
    }
    result
}
