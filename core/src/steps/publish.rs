use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use super::fetch_once;
use crate::context::ExecutionContext;
use crate::error::{PipelineError, PipelineResult};
use crate::runner::CommandLine;
use crate::step::{StepEnv, StepWork};
use crate::tool::Tool;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([_a-zA-Z][_a-zA-Z0-9]*)\}").unwrap());

const PROPERTIES_FILE: &str = "sonar.properties";
const RUNNER_JAR: &str = "sonar-runner.jar";
const RUNNER_MAIN: &str = "org.sonar.runner.Main";

pub struct Publish;

#[async_trait]
impl StepWork for Publish {
    async fn execute(&self, env: &StepEnv<'_>) -> PipelineResult<()> {
        let java = env.resolve(Tool::Java).await?;
        let ctx = env.ctx();
        let paths = env.paths();
        let publish = &ctx.config().publish;

        env.info("Generate sonar configuration...");
        let template_path = paths.project().join(&publish.template);
        let properties = paths.build().join(PROPERTIES_FILE);
        let template = std::fs::read_to_string(&template_path)
            .map_err(|e| PipelineError::io("read", &template_path, e))?;
        std::fs::write(&properties, render_template(&template, &variables(ctx)))
            .map_err(|e| PipelineError::io("write", &properties, e))?;

        let runner = paths.build().join(RUNNER_JAR);
        fetch_once(env, &publish.runner_url, &runner).await?;

        env.info("Upload analysis data...");
        env.run(runner_command(&java.program(), paths.project(), paths.build(), &runner, &properties))
            .await
    }
}

fn runner_command(
    java: &str,
    project: &Path,
    build: &Path,
    runner: &Path,
    properties: &Path,
) -> CommandLine {
    CommandLine::new(java, project)
        .arg("-classpath")
        .path_arg(runner)
        .arg(format!("-Drunner.home={}", build.display()))
        .arg(format!("-Dproject.home={}", project.display()))
        .arg(format!("-Dproject.settings={}", properties.display()))
        .arg(RUNNER_MAIN)
}

fn variables(ctx: &ExecutionContext) -> BTreeMap<String, String> {
    let paths = ctx.paths();
    let config = ctx.config();
    let publish = &config.publish;
    let relative = |dir: &Path| {
        dir.strip_prefix(paths.project())
            .unwrap_or(dir)
            .display()
            .to_string()
    };

    let mut vars = BTreeMap::new();
    vars.insert(
        "project_key".to_string(),
        publish.project_key.clone().unwrap_or_else(|| config.project.name.clone()),
    );
    vars.insert(
        "project_name".to_string(),
        publish.project_name.clone().unwrap_or_else(|| config.project.name.clone()),
    );
    vars.insert("project_path".to_string(), paths.project().display().to_string());
    vars.insert("build_path".to_string(), paths.build().display().to_string());
    vars.insert("coverage_path".to_string(), relative(&paths.coverage()));
    vars.insert("reports_path".to_string(), relative(&paths.reports()));
    vars.insert("version".to_string(), ctx.library_version().to_string());
    if let Some(server_url) = &publish.server_url {
        vars.insert("server_url".to_string(), server_url.clone());
    }

    vars.extend(publish.properties.clone());
    vars
}

pub fn render_template(template: &str, vars: &BTreeMap<String, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            vars.get(&caps[1]).cloned().unwrap_or_default()
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::steps::testing::Fixture;

    fn vars(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_template() {
        let vars = vars(&[("project_key", "hutznohmd"), ("version", "0.0.1")]);

        assert_eq!(
            render_template("sonar.projectKey=${project_key}\n", &vars),
            "sonar.projectKey=hutznohmd\n"
        );
        assert_eq!(
            render_template("${project_key}-${version}:${project_key}", &vars),
            "hutznohmd-0.0.1:hutznohmd"
        );
    }

    #[test]
    fn test_unknown_placeholder_renders_empty() {
        let vars = vars(&[]);
        assert_eq!(render_template("a=${missing};b", &vars), "a=;b");
    }

    #[test]
    fn test_non_placeholders_are_left_alone() {
        let vars = vars(&[("x", "1")]);
        assert_eq!(
            render_template("$x ${1x} ${x ${ x}", &vars),
            "$x ${1x} ${x ${ x}"
        );
    }

    #[tokio::test]
    async fn test_publish_renders_properties_and_runs_runner() {
        let mut config = Config::default();
        config.project.name = "hutznohmd".to_string();
        config.publish.server_url = Some("http://sonar.local:9000".to_string());
        config
            .publish
            .properties
            .insert("language".to_string(), "c++".to_string());
        let fixture = Fixture::with_config(config);
        let paths = fixture.ctx.paths();
        std::fs::create_dir_all(paths.build()).unwrap();
        std::fs::write(
            paths.project().join("sonar-cxx.template"),
            "sonar.projectKey=${project_key}\n\
             sonar.projectVersion=${version}\n\
             sonar.host.url=${server_url}\n\
             sonar.language=${language}\n\
             sonar.cxx.coverage.reportPath=${coverage_path}/unittest.xml\n\
             sonar.login=${login}\n",
        )
        .unwrap();

        Publish.execute(&fixture.env()).await.unwrap();

        let rendered = std::fs::read_to_string(paths.build().join(PROPERTIES_FILE)).unwrap();
        assert_eq!(
            rendered,
            "sonar.projectKey=hutznohmd\n\
             sonar.projectVersion=0.0.1\n\
             sonar.host.url=http://sonar.local:9000\n\
             sonar.language=c++\n\
             sonar.cxx.coverage.reportPath=build/coverage/unittest.xml\n\
             sonar.login=\n"
        );

        let recorded = fixture.runner.recorded();
        assert_eq!(recorded.len(), 2);
        assert!(recorded[0].command.program.ends_with("wget"));

        let run = &recorded[1].command;
        assert_eq!(run.program, "/opt/tools/java");
        assert_eq!(run.working_dir, paths.project());
        assert_eq!(run.args.last().map(String::as_str), Some(RUNNER_MAIN));
        assert!(run
            .args
            .contains(&format!("-Drunner.home={}", paths.build().display())));
    }

    #[tokio::test]
    async fn test_publish_without_template() {
        let fixture = Fixture::new();
        std::fs::create_dir_all(fixture.ctx.paths().build()).unwrap();

        let err = Publish.execute(&fixture.env()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Io { action: "read", .. }));
        assert!(fixture.runner.lines().is_empty());
    }
}
