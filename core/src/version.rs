use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::error::{PipelineError, PipelineResult};

/// A dotted version number such as `4.8.2`.
///
/// Comparison treats missing trailing components as zero, so `4.8`
/// and `4.8.0` are equal.
#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "String")]
pub struct Version(Vec<u64>);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid version '{0}', expected dotted numbers like 1.2.3")]
pub struct InvalidVersion(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCheck {
    Older,
    Satisfied,
}

impl Version {
    pub fn new(components: Vec<u64>) -> Self {
        Self(components)
    }

    pub fn components(&self) -> &[u64] {
        &self.0
    }

    pub fn satisfies(&self, minimum: &Version) -> bool {
        compare(self, minimum) == VersionCheck::Satisfied
    }
}

/// Decides whether `found` meets `minimum`.
///
/// Walks the components left to right and stops at the first one that
/// differs; equality satisfies the minimum.
pub fn compare(found: &Version, minimum: &Version) -> VersionCheck {
    match found.cmp(minimum) {
        Ordering::Less => VersionCheck::Older,
        Ordering::Equal | Ordering::Greater => VersionCheck::Satisfied,
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        let len = self.0.len().max(other.0.len());

        for i in 0..len {
            let left = self.0.get(i).copied().unwrap_or(0);
            let right = other.0.get(i).copied().unwrap_or(0);

            match left.cmp(&right) {
                Ordering::Equal => continue,
                decided => return decided,
            }
        }

        Ordering::Equal
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl FromStr for Version {
    type Err = InvalidVersion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(InvalidVersion(s.to_string()));
        }

        trimmed
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map(Version)
            .map_err(|_| InvalidVersion(s.to_string()))
    }
}

impl TryFrom<String> for Version {
    type Error = InvalidVersion;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, component) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", component)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Where a tool prints its version banner and how to pick the number out of it.
///
/// Only the first line of the chosen stream is inspected. The first capture
/// group (or the whole match when the pattern has none) must be a dotted
/// version.
#[derive(Debug, Clone)]
pub struct VersionPattern {
    stream: OutputStream,
    regex: Regex,
}

impl VersionPattern {
    pub fn new(stream: OutputStream, regex: Regex) -> Self {
        Self { stream, regex }
    }

    pub fn stdout(regex: Regex) -> Self {
        Self::new(OutputStream::Stdout, regex)
    }

    pub fn stderr(regex: Regex) -> Self {
        Self::new(OutputStream::Stderr, regex)
    }

    pub fn stream(&self) -> OutputStream {
        self.stream
    }

    pub fn extract(&self, name: &str, stdout: &[u8], stderr: &[u8]) -> PipelineResult<Version> {
        let raw = match self.stream {
            OutputStream::Stdout => String::from_utf8_lossy(stdout),
            OutputStream::Stderr => String::from_utf8_lossy(stderr),
        };

        extract_version(&raw, &self.regex).ok_or_else(|| PipelineError::VersionParse {
            name: name.to_string(),
            raw: raw.trim().to_string(),
        })
    }
}

pub fn extract_version(raw_output: &str, pattern: &Regex) -> Option<Version> {
    let first_line = raw_output.lines().next()?;
    let caps = pattern.captures(first_line)?;
    let matched = caps.get(1).or_else(|| caps.get(0))?;
    matched.as_str().parse().ok()
}
