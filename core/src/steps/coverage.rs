use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::paths;
use crate::runner::CommandLine;
use crate::step::{StepEnv, StepWork};
use crate::tool::{ResolvedTool, Tool};

pub struct Coverage;

#[async_trait]
impl StepWork for Coverage {
    async fn execute(&self, env: &StepEnv<'_>) -> PipelineResult<()> {
        let gcovr = env.resolve(Tool::Gcovr).await?;
        let paths = env.paths();
        let unittest = paths.unittest_bin();
        let integrationtest = paths.integrationtest_bin();

        env.info("Generate coverage information...");
        paths::renew_dir(&paths.coverage())?;

        let sets: [(&str, &str, Vec<&PathBuf>); 3] = [
            ("unittest", "unittest's", vec![&unittest]),
            ("integrationtest", "integrationtest's", vec![&integrationtest]),
            ("overall", "overall", vec![&unittest, &integrationtest]),
        ];

        for (base, label, binaries) in sets {
            env.info(&format!("Collect {} coverage information...", label));
            for binary in binaries {
                env.run(CommandLine::new(binary.display().to_string(), paths.cmake()))
                    .await?;
            }
            collect(env, &gcovr, base).await?;
        }

        Ok(())
    }
}

// the txt run goes last: --delete resets the counters for the next set
async fn collect(env: &StepEnv<'_>, gcovr: &ResolvedTool, base: &str) -> PipelineResult<()> {
    for (format, extension) in [(Some("--xml"), "xml"), (Some("--html"), "html"), (None, "txt")] {
        env.run(gcovr_command(env, gcovr, base, format, extension))
            .await?;
    }
    Ok(())
}

fn gcovr_command(
    env: &StepEnv<'_>,
    gcovr: &ResolvedTool,
    base: &str,
    format: Option<&str>,
    extension: &str,
) -> CommandLine {
    let paths = env.paths();
    let output = paths.coverage().join(format!("{}.{}", base, extension));

    let mut command = CommandLine::new(gcovr.program(), paths.cmake());
    command = match format {
        Some(flag) => command.arg("--branches").arg(flag),
        None => command.arg("--delete").arg("--branches"),
    };

    command
        .arg(format!("--output={}", output.display()))
        .arg("--root")
        .path_arg(paths.project())
        .arg("--verbose")
}
