use anyhow::Context;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use crate::version::Version;

pub const CONFIG_FILE_NAME: &str = "kiln.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub tools: HashMap<String, ToolOverride>,
    #[serde(default)]
    pub doc: DocConfig,
    #[serde(default)]
    pub publish: PublishConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    #[serde(default = "default_project_name")]
    pub name: String,
    #[serde(default = "default_version_file")]
    pub version_file: String,
    #[serde(default)]
    pub minimal: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_build_dir")]
    pub build: String,
    #[serde(default = "default_log_file")]
    pub log_file: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolOverride {
    #[serde(default)]
    pub names: Option<Vec<String>>,
    #[serde(default)]
    pub minimum: Option<Version>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocConfig {
    #[serde(default = "default_plantuml_url")]
    pub plantuml_url: String,
    #[serde(default = "default_doxyfile")]
    pub doxyfile: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublishConfig {
    #[serde(default)]
    pub project_key: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub server_url: Option<String>,
    #[serde(default = "default_runner_url")]
    pub runner_url: String,
    #[serde(default = "default_template")]
    pub template: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: default_project_name(),
            version_file: default_version_file(),
            minimal: false,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            build: default_build_dir(),
            log_file: default_log_file(),
        }
    }
}

impl Default for DocConfig {
    fn default() -> Self {
        Self {
            plantuml_url: default_plantuml_url(),
            doxyfile: default_doxyfile(),
        }
    }
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            project_key: None,
            project_name: None,
            server_url: None,
            runner_url: default_runner_url(),
            template: default_template(),
            properties: BTreeMap::new(),
        }
    }
}

fn default_project_name() -> String {
    "project".to_string()
}

fn default_version_file() -> String {
    "version".to_string()
}

fn default_build_dir() -> String {
    "build".to_string()
}

fn default_log_file() -> String {
    "kiln.log".to_string()
}

fn default_plantuml_url() -> String {
    "http://sourceforge.net/projects/plantuml/files/plantuml.jar/download".to_string()
}

fn default_doxyfile() -> String {
    "Doxyfile".to_string()
}

fn default_runner_url() -> String {
    "http://repo1.maven.org/maven2/org/codehaus/sonar/runner/sonar-runner-dist/2.4/sonar-runner-dist-2.4.jar"
        .to_string()
}

fn default_template() -> String {
    "sonar-cxx.template".to_string()
}

impl Config {
    /// Loads `kiln.toml` from the project root, or an explicit file.
    ///
    /// A missing file in the project root yields the defaults; a missing
    /// explicit file is an error.
    pub fn load(project_root: &Path, explicit: Option<&Path>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => {
                let path = Self::expand_path(&path.to_string_lossy());
                if !path.exists() {
                    anyhow::bail!("Configuration file {} does not exist", path.display());
                }
                Self::load_from_file(&path)
            }
            None => Self::load_from_file(project_root.join(CONFIG_FILE_NAME)),
        }
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn expand_path(path: &str) -> PathBuf {
        let expanded = shellexpand::tilde(path);
        PathBuf::from(expanded.as_ref())
    }

    pub fn read_library_version(&self, project_root: &Path) -> anyhow::Result<String> {
        let path = project_root.join(&self.project.version_file);
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read version file: {}", path.display()))?;

        let version = content.lines().next().unwrap_or_default().trim().to_string();
        if version.is_empty() {
            anyhow::bail!("Version file {} is empty", path.display());
        }

        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = Config::load(dir.path(), None).unwrap();

        assert_eq!(config.project.name, "project");
        assert_eq!(config.paths.build, "build");
        assert_eq!(config.paths.log_file, "kiln.log");
        assert!(config.tools.is_empty());
        assert_eq!(config.publish.template, "sonar-cxx.template");
    }

    #[test]
    fn test_missing_explicit_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("other.toml");
        assert!(Config::load(dir.path(), Some(&missing)).is_err());
    }

    #[test]
    fn test_parse_full_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            r#"
[project]
name = "hutznohmd"
minimal = true

[paths]
build = "out"

[tools.cppcheck]
minimum = "1.80"

[tools.make]
names = ["gmake", "make"]

[publish]
project_key = "hutznohmd"
server_url = "http://sonar.local:9000"

[publish.properties]
"sonar.language" = "c++"
"#,
        )
        .unwrap();

        let config = Config::load(dir.path(), None).unwrap();
        assert_eq!(config.project.name, "hutznohmd");
        assert!(config.project.minimal);
        assert_eq!(config.project.version_file, "version");
        assert_eq!(config.paths.build, "out");
        assert_eq!(
            config.tools["cppcheck"].minimum.as_ref().map(|v| v.to_string()),
            Some("1.80".to_string())
        );
        assert_eq!(
            config.tools["make"].names,
            Some(vec!["gmake".to_string(), "make".to_string()])
        );
        assert_eq!(config.publish.project_key.as_deref(), Some("hutznohmd"));
        assert_eq!(config.publish.properties["sonar.language"], "c++");
    }

    #[test]
    fn test_invalid_minimum_is_rejected() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE_NAME),
            "[tools.gcc]\nminimum = \"four\"\n",
        )
        .unwrap();

        assert!(Config::load(dir.path(), None).is_err());
    }

    #[test]
    fn test_read_library_version() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("version"), "0.0.1\n").unwrap();

        let config = Config::default();
        assert_eq!(config.read_library_version(dir.path()).unwrap(), "0.0.1");

        std::fs::write(dir.path().join("version"), "\n").unwrap();
        assert!(config.read_library_version(dir.path()).is_err());
    }
}
