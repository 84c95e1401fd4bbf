use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::runner::CommandLine;
use crate::step::{StepEnv, StepWork};
use crate::tool::{ResolvedTool, Tool};

pub struct Package;

#[async_trait]
impl StepWork for Package {
    async fn execute(&self, env: &StepEnv<'_>) -> PipelineResult<()> {
        let tar = env.resolve(Tool::Tar).await?;
        let paths = env.paths();
        let name = paths.project_name();
        let version = env.ctx().library_version();

        env.info("Build packages...");

        let binary = paths.build().join(format!("{}-{}.tar.gz", name, version));
        env.run(
            archive(env, &tar)
                .arg("--directory")
                .path_arg(&paths.install())
                .arg("--file")
                .path_arg(&binary)
                .arg("."),
        )
        .await?;

        let build_dir = paths
            .build()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "build".to_string());
        let source = paths.build().join(format!("{}_src-{}.tar.gz", name, version));
        env.run(
            archive(env, &tar)
                .args(["--exclude=.git", "--exclude=.gitignore", "--exclude=*.user"])
                .arg(format!("--exclude=./{}", build_dir))
                .arg("--directory")
                .path_arg(paths.project())
                .arg("--file")
                .path_arg(&source)
                .arg("."),
        )
        .await
    }
}

fn archive(env: &StepEnv<'_>, tar: &ResolvedTool) -> CommandLine {
    CommandLine::new(tar.program(), env.paths().build()).args([
        "--create",
        "--gzip",
        "--owner=root",
        "--group=root",
        "--preserve-permissions",
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steps::testing::Fixture;

    #[tokio::test]
    async fn test_package_names_archives_after_project_and_version() {
        let mut config = crate::config::Config::default();
        config.project.name = "hutznohmd".to_string();
        let fixture = Fixture::with_config(config);
        let build = fixture.ctx.paths().build().to_path_buf();

        Package.execute(&fixture.env()).await.unwrap();

        let recorded = fixture.runner.recorded();
        assert_eq!(recorded.len(), 2);

        let binary = &recorded[0].command;
        assert!(binary
            .args
            .contains(&build.join("hutznohmd-0.0.1.tar.gz").display().to_string()));
        assert!(binary
            .args
            .contains(&fixture.ctx.paths().install().display().to_string()));

        let source = &recorded[1].command;
        assert!(source
            .args
            .contains(&build.join("hutznohmd_src-0.0.1.tar.gz").display().to_string()));
        assert!(source.args.contains(&"--exclude=./build".to_string()));
        assert_eq!(source.args.last().map(String::as_str), Some("."));
    }
}
