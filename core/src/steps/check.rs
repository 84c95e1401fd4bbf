use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::paths;
use crate::runner::{CommandLine, OutputRouting};
use crate::step::{StepEnv, StepWork};
use crate::tool::Tool;

pub struct Check;

#[async_trait]
impl StepWork for Check {
    async fn execute(&self, env: &StepEnv<'_>) -> PipelineResult<()> {
        let cppcheck = env.resolve(Tool::Cppcheck).await?;
        let valgrind = env.resolve(Tool::Valgrind).await?;
        let rats = env.resolve(Tool::Rats).await?;
        let vera = env.resolve(Tool::Vera).await?;

        let paths = env.paths();
        let reports = paths.reports();
        let src = paths.sources();
        let lib = src.join("lib");
        let cmake = paths.cmake();
        let unittest = paths.unittest_bin();

        paths::renew_dir(&reports)?;

        env.info("Run valgrind...");
        env.run(
            CommandLine::new(valgrind.program(), &cmake)
                .arg("--leak-check=full")
                .arg("--xml=yes")
                .arg(format!("--xml-file={}", reports.join("valgrind.xml").display()))
                .path_arg(&unittest),
        )
        .await?;

        env.info("Run unittest...");
        env.run(
            CommandLine::new(unittest.display().to_string(), &cmake).arg(format!(
                "--gtest_output=xml:{}",
                reports.join("unittest.xml").display()
            )),
        )
        .await?;

        env.info("Run cppcheck...");
        env.run(
            CommandLine::new(cppcheck.program(), paths.project())
                .args([
                    "--xml",
                    "--xml-version=2",
                    "--force",
                    "--language=c++",
                    "--platform=unix64",
                    "--enable=all",
                    "--std=c++11",
                    "--suppress=missingIncludeSystem",
                    "-DNDEBUG",
                ])
                .arg("-I")
                .path_arg(&lib)
                .arg("-I")
                .path_arg(&src.join("unittest"))
                .arg("-I")
                .path_arg(&src.join("integrationtest"))
                .arg(format!("--output-file={}", reports.join("cppcheck.xml").display()))
                .path_arg(&src),
        )
        .await?;

        env.info("Run rats...");
        let rats_report = env.create_report(&reports.join("rats.xml"))?;
        env.run_routed(
            CommandLine::new(rats.program(), paths.project())
                .args(["--xml", "--resultsonly", "-w", "3"])
                .path_arg(&src),
            OutputRouting::Split(rats_report),
        )
        .await?;

        env.info("Run vera++...");
        let mut vera_command = CommandLine::new(vera.program(), paths.project())
            .arg("--checkstyle-report")
            .path_arg(&reports.join("vera++.xml"));
        if lib.is_dir() {
            for source in paths::collect_sources(&lib, &["cpp", "hpp"])? {
                vera_command = vera_command.path_arg(&lib.join(source));
            }
        }
        env.run(vera_command).await?;

        env.info(&format!(
            "All report files were written to {}.",
            reports.display()
        ));
        Ok(())
    }
}
