pub mod catalog;

pub use catalog::{Tool, ToolCatalog};

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{PipelineError, PipelineResult};
use crate::locator::Locator;
use crate::logger::Logger;
use crate::version::{compare, Version, VersionCheck, VersionPattern};

#[derive(Debug, Clone)]
pub struct ToolSpec {
    names: Vec<String>,
    minimum: Version,
    query: Vec<String>,
    pattern: VersionPattern,
}

impl ToolSpec {
    pub fn new<I, S>(names: I, minimum: Version, pattern: VersionPattern) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
            minimum,
            query: vec!["--version".to_string()],
            pattern,
        }
    }

    pub fn with_query<I, S>(mut self, query: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.query = query.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_names(mut self, names: Vec<String>) -> Self {
        self.names = names;
        self
    }

    pub fn with_minimum(mut self, minimum: Version) -> Self {
        self.minimum = minimum;
        self
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn minimum(&self) -> &Version {
        &self.minimum
    }

    pub fn query(&self) -> &[String] {
        &self.query
    }

    pub fn pattern(&self) -> &VersionPattern {
        &self.pattern
    }

    pub fn display_name(&self) -> String {
        self.names.join(" / ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTool {
    pub name: String,
    pub path: PathBuf,
    pub version: Version,
}

impl ResolvedTool {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn program(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait]
pub trait ToolResolver: Send + Sync {
    async fn resolve(&self, spec: &ToolSpec) -> PipelineResult<ResolvedTool>;
}

pub struct SystemResolver {
    locator: Locator,
    logger: Logger,
}

impl SystemResolver {
    pub fn new(locator: Locator, logger: Logger) -> Self {
        Self { locator, logger }
    }

    fn locate(&self, spec: &ToolSpec) -> Option<(String, PathBuf)> {
        spec.names()
            .iter()
            .find_map(|name| self.locator.locate(name).map(|path| (name.clone(), path)))
    }
}

#[async_trait]
impl ToolResolver for SystemResolver {
    async fn resolve(&self, spec: &ToolSpec) -> PipelineResult<ResolvedTool> {
        self.logger
            .info(&format!("Searching for {}...", spec.display_name()));

        let (name, path) = self
            .locate(spec)
            .ok_or_else(|| PipelineError::ToolNotAvailable {
                name: spec.display_name(),
            })?;

        let output = Command::new(&path)
            .args(spec.query())
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| PipelineError::Spawn {
                command: format!("{} {}", path.display(), spec.query().join(" ")),
                source,
            })?;

        let version = spec.pattern().extract(&name, &output.stdout, &output.stderr)?;

        match compare(&version, spec.minimum()) {
            VersionCheck::Older => Err(PipelineError::ToolTooOld {
                name,
                minimum: spec.minimum().clone(),
                found: version,
            }),
            VersionCheck::Satisfied => {
                self.logger.info(&format!(
                    "Found {} {} which matches minimal version constraint ({}).",
                    name,
                    version,
                    spec.minimum()
                ));
                Ok(ResolvedTool {
                    name,
                    path,
                    version,
                })
            }
        }
    }
}

/// Resolves the first acceptable tool among alternatives, e.g. any one of
/// several compilers.
///
/// Missing candidates are skipped. If nothing resolves, the first
/// "too old" failure is reported, or [`PipelineError::NoAcceptableTool`]
/// when no candidate exists at all.
pub async fn resolve_first(
    resolver: &dyn ToolResolver,
    role: &str,
    specs: &[&ToolSpec],
) -> PipelineResult<ResolvedTool> {
    let mut too_old = None;

    for spec in specs {
        match resolver.resolve(spec).await {
            Ok(tool) => return Ok(tool),
            Err(PipelineError::ToolNotAvailable { .. }) => {}
            Err(err @ PipelineError::ToolTooOld { .. }) => {
                if too_old.is_none() {
                    too_old = Some(err);
                }
            }
            Err(err) => return Err(err),
        }
    }

    Err(too_old.unwrap_or_else(|| PipelineError::NoAcceptableTool {
        role: role.to_string(),
        candidates: specs
            .iter()
            .flat_map(|spec| spec.names().iter().cloned())
            .collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;
    use std::collections::HashMap;

    fn spec(names: &[&str], minimum: &str) -> ToolSpec {
        ToolSpec::new(
            names.iter().copied(),
            minimum.parse().unwrap(),
            VersionPattern::stdout(Regex::new(r"(\d+(?:\.\d+)+)").unwrap()),
        )
    }

    struct ScriptedResolver {
        versions: HashMap<String, &'static str>,
    }

    #[async_trait]
    impl ToolResolver for ScriptedResolver {
        async fn resolve(&self, spec: &ToolSpec) -> PipelineResult<ResolvedTool> {
            let name = spec
                .names()
                .iter()
                .find(|n| self.versions.contains_key(*n))
                .ok_or_else(|| PipelineError::ToolNotAvailable {
                    name: spec.display_name(),
                })?;
            let version: Version = self.versions[name].parse().unwrap();
            if !version.satisfies(spec.minimum()) {
                return Err(PipelineError::ToolTooOld {
                    name: name.clone(),
                    minimum: spec.minimum().clone(),
                    found: version,
                });
            }
            Ok(ResolvedTool {
                name: name.clone(),
                path: PathBuf::from("/usr/bin").join(name),
                version,
            })
        }
    }

    fn resolver(entries: &[(&str, &'static str)]) -> ScriptedResolver {
        ScriptedResolver {
            versions: entries.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
        }
    }

    #[test]
    fn test_spec_defaults_and_overrides() {
        let spec = spec(&["clang", "clang-3.5"], "3.5");
        assert_eq!(spec.query(), &["--version".to_string()]);
        assert_eq!(spec.display_name(), "clang / clang-3.5");

        let spec = spec
            .with_query(["-h"])
            .with_names(vec!["clang-15".to_string()])
            .with_minimum("15".parse().unwrap());
        assert_eq!(spec.query(), &["-h".to_string()]);
        assert_eq!(spec.names(), &["clang-15".to_string()]);
        assert_eq!(spec.minimum().to_string(), "15");
    }

    #[tokio::test]
    async fn test_resolve_first_takes_first_success() {
        let gcc = spec(&["gcc"], "4.8");
        let clang = spec(&["clang"], "3.5");
        let resolver = resolver(&[("gcc", "4.6.3"), ("clang", "3.9.1")]);

        let tool = resolve_first(&resolver, "compiler", &[&gcc, &clang])
            .await
            .unwrap();
        assert_eq!(tool.name, "clang");
    }

    #[tokio::test]
    async fn test_resolve_first_reports_too_old_over_missing() {
        let gcc = spec(&["gcc"], "4.8");
        let clang = spec(&["clang"], "3.5");
        let resolver = resolver(&[("gcc", "4.6.3")]);

        let err = resolve_first(&resolver, "compiler", &[&gcc, &clang])
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ToolTooOld { ref name, .. } if name == "gcc"));
    }

    #[tokio::test]
    async fn test_resolve_first_without_candidates() {
        let gcc = spec(&["gcc"], "4.8");
        let clang = spec(&["clang", "clang-3.5"], "3.5");
        let resolver = resolver(&[]);

        let err = resolve_first(&resolver, "compiler", &[&gcc, &clang])
            .await
            .unwrap_err();
        match err {
            PipelineError::NoAcceptableTool { role, candidates } => {
                assert_eq!(role, "compiler");
                assert_eq!(candidates, vec!["gcc", "clang", "clang-3.5"]);
            }
            other => panic!("Expected NoAcceptableTool, got {:?}", other),
        }
    }

    #[cfg(unix)]
    mod system {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        fn script(dir: &Path, name: &str, body: &str) {
            let path = dir.join(name);
            std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        fn system_resolver(dir: &Path) -> SystemResolver {
            SystemResolver::new(Locator::with_dirs([dir]), Logger::new())
        }

        #[tokio::test]
        async fn test_resolves_located_tool() {
            let dir = TempDir::new().unwrap();
            script(dir.path(), "gcovr", "echo 'gcovr 4.2'; echo 'Copyright 2.0'");

            let spec = spec(&["gcovr"], "3.2");
            let tool = system_resolver(dir.path()).resolve(&spec).await.unwrap();

            assert_eq!(tool.name, "gcovr");
            assert_eq!(tool.path, dir.path().join("gcovr"));
            assert_eq!(tool.version, "4.2".parse().unwrap());
        }

        #[tokio::test]
        async fn test_second_candidate_name() {
            let dir = TempDir::new().unwrap();
            script(dir.path(), "clang-3.5", "echo 'clang version 3.5.2 (tags/RELEASE_352)'");

            let spec = spec(&["clang", "clang-3.5"], "3.5");
            let tool = system_resolver(dir.path()).resolve(&spec).await.unwrap();
            assert_eq!(tool.name, "clang-3.5");
        }

        #[tokio::test]
        async fn test_not_available_for_any_number_of_candidates() {
            let dir = TempDir::new().unwrap();
            let resolver = system_resolver(dir.path());

            for names in [&["tar"][..], &["tar", "gtar", "bsdtar"][..]] {
                let err = resolver.resolve(&spec(names, "1.0")).await.unwrap_err();
                assert!(matches!(err, PipelineError::ToolNotAvailable { .. }));
            }
        }

        #[tokio::test]
        async fn test_too_old_carries_both_versions() {
            let dir = TempDir::new().unwrap();
            script(dir.path(), "cppcheck", "echo 'Cppcheck 1.61'");

            let spec = spec(&["cppcheck"], "1.70");
            let err = system_resolver(dir.path()).resolve(&spec).await.unwrap_err();

            match err {
                PipelineError::ToolTooOld {
                    name,
                    minimum,
                    found,
                } => {
                    assert_eq!(name, "cppcheck");
                    assert_eq!(minimum.components(), &[1, 70]);
                    assert_eq!(found.components(), &[1, 61]);
                }
                other => panic!("Expected ToolTooOld, got {:?}", other),
            }
        }

        #[tokio::test]
        async fn test_version_on_stderr() {
            let dir = TempDir::new().unwrap();
            script(dir.path(), "java", "echo 'openjdk version \"17.0.2\" 2022-01-18' >&2");

            let spec = ToolSpec::new(
                ["java"],
                "1.7.0".parse().unwrap(),
                VersionPattern::stderr(Regex::new(r#"[^"]*"(\d+(?:\.\d+)*)"#).unwrap()),
            )
            .with_query(["-version"]);

            let tool = system_resolver(dir.path()).resolve(&spec).await.unwrap();
            assert_eq!(tool.version.components(), &[17, 0, 2]);
        }

        #[tokio::test]
        async fn test_unparsable_banner() {
            let dir = TempDir::new().unwrap();
            script(dir.path(), "doxygen", "echo 'no version here'");

            let err = system_resolver(dir.path())
                .resolve(&spec(&["doxygen"], "1.8.0"))
                .await
                .unwrap_err();
            assert!(matches!(err, PipelineError::VersionParse { .. }));
        }
    }
}
