use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::ToolSpec;
use crate::config::ToolOverride;
use crate::version::{Version, VersionPattern};

static DOTTED_TRIPLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\d]*(\d+\.\d+\.\d+)").unwrap());
static DOTTED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\d]*(\d+\.\d+(?:\.\d+)?)").unwrap());
static CPPCHECK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^Cppcheck\s+(\d+\.\d+)").unwrap());
static VALGRIND: Lazy<Regex> = Lazy::new(|| Regex::new(r"valgrind-(\d+\.\d+\.\d+)").unwrap());
static RATS: Lazy<Regex> = Lazy::new(|| Regex::new(r"^RATS\s+v?(\d+\.\d+)").unwrap());
static GCOVR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^gcovr\s+(\d+\.\d+)").unwrap());
static DOXYGEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\d+\.\d+\.\d+)").unwrap());
static JAVA: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[^"]*"(\d+(?:\.\d+)*)"#).unwrap());
static WGET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^GNU Wget\s+(\d+\.\d+)").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    Gcc,
    Clang,
    CMake,
    Make,
    Cppcheck,
    Valgrind,
    Rats,
    Vera,
    Gcovr,
    Doxygen,
    Java,
    Tar,
    Wget,
}

impl Tool {
    pub fn all() -> Vec<Tool> {
        vec![
            Tool::Gcc,
            Tool::Clang,
            Tool::CMake,
            Tool::Make,
            Tool::Cppcheck,
            Tool::Valgrind,
            Tool::Rats,
            Tool::Vera,
            Tool::Gcovr,
            Tool::Doxygen,
            Tool::Java,
            Tool::Tar,
            Tool::Wget,
        ]
    }

    pub fn key(&self) -> &'static str {
        match self {
            Tool::Gcc => "gcc",
            Tool::Clang => "clang",
            Tool::CMake => "cmake",
            Tool::Make => "make",
            Tool::Cppcheck => "cppcheck",
            Tool::Valgrind => "valgrind",
            Tool::Rats => "rats",
            Tool::Vera => "vera",
            Tool::Gcovr => "gcovr",
            Tool::Doxygen => "doxygen",
            Tool::Java => "java",
            Tool::Tar => "tar",
            Tool::Wget => "wget",
        }
    }

    pub fn from_key(key: &str) -> Option<Tool> {
        Tool::all().into_iter().find(|tool| tool.key() == key)
    }

    pub fn default_spec(&self) -> ToolSpec {
        match self {
            Tool::Gcc => ToolSpec::new(["gcc"], version(&[4, 8]), stdout(&DOTTED_TRIPLE)),
            Tool::Clang => ToolSpec::new(
                ["clang", "clang-3.5"],
                version(&[3, 5]),
                stdout(&DOTTED_TRIPLE),
            ),
            Tool::CMake => ToolSpec::new(["cmake"], version(&[2, 8]), stdout(&DOTTED)),
            Tool::Make => ToolSpec::new(["make", "gmake"], version(&[3, 81]), stdout(&DOTTED)),
            Tool::Cppcheck => {
                ToolSpec::new(["cppcheck"], version(&[1, 70]), stdout(&CPPCHECK))
            }
            Tool::Valgrind => {
                ToolSpec::new(["valgrind"], version(&[3, 7, 0]), stdout(&VALGRIND))
            }
            Tool::Rats => {
                ToolSpec::new(["rats"], version(&[2, 4]), stdout(&RATS)).with_query(["-h"])
            }
            Tool::Vera => ToolSpec::new(["vera++"], version(&[1, 2]), stdout(&DOTTED)),
            Tool::Gcovr => ToolSpec::new(["gcovr"], version(&[3, 2]), stdout(&GCOVR)),
            Tool::Doxygen => ToolSpec::new(["doxygen"], version(&[1, 8, 0]), stdout(&DOXYGEN)),
            Tool::Java => ToolSpec::new(
                ["java"],
                version(&[1, 7, 0]),
                VersionPattern::stderr(Regex::clone(&JAVA)),
            )
            .with_query(["-version"]),
            Tool::Tar => ToolSpec::new(["tar", "gtar"], version(&[1, 26]), stdout(&DOTTED)),
            Tool::Wget => ToolSpec::new(["wget"], version(&[1, 12]), stdout(&WGET)),
        }
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

fn version(components: &[u64]) -> Version {
    Version::new(components.to_vec())
}

fn stdout(regex: &Lazy<Regex>) -> VersionPattern {
    VersionPattern::stdout(Regex::clone(regex))
}

#[derive(Debug, Clone)]
pub struct ToolCatalog {
    specs: HashMap<Tool, ToolSpec>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self {
            specs: Tool::all()
                .into_iter()
                .map(|tool| (tool, tool.default_spec()))
                .collect(),
        }
    }

    pub fn with_overrides(
        mut self,
        overrides: &HashMap<String, ToolOverride>,
    ) -> anyhow::Result<Self> {
        for (key, custom) in overrides {
            let tool = Tool::from_key(key)
                .ok_or_else(|| anyhow::anyhow!("Unknown tool '{}' in [tools] section", key))?;

            let mut spec = tool.default_spec();
            if let Some(names) = &custom.names {
                if names.is_empty() {
                    anyhow::bail!("[tools.{}] names must not be empty", key);
                }
                spec = spec.with_names(names.clone());
            }
            if let Some(minimum) = &custom.minimum {
                spec = spec.with_minimum(minimum.clone());
            }
            self.specs.insert(tool, spec);
        }

        Ok(self)
    }

    pub fn spec(&self, tool: Tool) -> &ToolSpec {
        // every Tool variant is inserted by new()
        &self.specs[&tool]
    }
}

impl Default for ToolCatalog {
    fn default() -> Self {
        Self::new()
    }
}
