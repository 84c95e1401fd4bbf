use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::version::Version;

pub type PipelineResult<T> = Result<T, PipelineError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitKind {
    Code(i32),
    Signal { number: i32, name: &'static str },
    Unknown,
}

impl ExitKind {
    pub fn from_status(status: &ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return ExitKind::Code(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;

            if let Some(number) = status.signal() {
                let name = nix::sys::signal::Signal::try_from(number)
                    .map(|signal| signal.as_str())
                    .unwrap_or("unknown signal");
                return ExitKind::Signal { number, name };
            }
        }

        ExitKind::Unknown
    }

    pub fn code(&self) -> Option<i32> {
        match self {
            ExitKind::Code(code) => Some(*code),
            _ => None,
        }
    }
}

impl fmt::Display for ExitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitKind::Code(code) => write!(f, "exit code {}", code),
            ExitKind::Signal { number, name } => {
                write!(f, "terminated by signal {} ({})", number, name)
            }
            ExitKind::Unknown => write!(f, "abnormal termination"),
        }
    }
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("The tool {name} was not found.")]
    ToolNotAvailable { name: String },

    #[error("Expected at least version {minimum} of {name}, but found version {found}.")]
    ToolTooOld {
        name: String,
        minimum: Version,
        found: Version,
    },

    #[error("No valid {role} found (tried {}).", .candidates.join(", "))]
    NoAcceptableTool {
        role: String,
        candidates: Vec<String>,
    },

    #[error("Could not read the version of {name} from {raw:?}.")]
    VersionParse { name: String, raw: String },

    #[error("<{command}> failed ({status}).")]
    CommandFailed { command: String, status: ExitKind },

    #[error("<{command}> could not be started: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown step '{0}'.")]
    UnknownStep(String),

    #[error("Failed to {action} {}: {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("[{step}] {source}")]
    Step {
        step: String,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn io(action: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PipelineError::Io {
            action,
            path: path.into(),
            source,
        }
    }

    /// Attaches the failing step's name unless an inner step already did.
    pub fn in_step(self, step: &str) -> Self {
        match self {
            PipelineError::Step { .. } | PipelineError::UnknownStep(_) => self,
            other => PipelineError::Step {
                step: step.to_string(),
                source: Box::new(other),
            },
        }
    }

    pub fn step(&self) -> Option<&str> {
        match self {
            PipelineError::Step { step, .. } => Some(step),
            _ => None,
        }
    }

    pub fn root_cause(&self) -> &PipelineError {
        match self {
            PipelineError::Step { source, .. } => source.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failed(code: i32) -> PipelineError {
        PipelineError::CommandFailed {
            command: "make -j4 install".to_string(),
            status: ExitKind::Code(code),
        }
    }

    #[test]
    fn test_step_context_is_attached_once() {
        let err = failed(2).in_step("build").in_step("test").in_step("package");

        assert_eq!(err.step(), Some("build"));
        assert!(matches!(
            err.root_cause(),
            PipelineError::CommandFailed { status: ExitKind::Code(2), .. }
        ));
    }

    #[test]
    fn test_unknown_step_is_not_wrapped() {
        let err = PipelineError::UnknownStep("deploy".to_string()).in_step("all");
        assert!(err.step().is_none());
        assert_eq!(err.to_string(), "Unknown step 'deploy'.");
    }

    #[test]
    fn test_messages() {
        let err = PipelineError::ToolTooOld {
            name: "cppcheck".to_string(),
            minimum: Version::new(vec![1, 70]),
            found: Version::new(vec![1, 61]),
        };
        assert_eq!(
            err.to_string(),
            "Expected at least version 1.70 of cppcheck, but found version 1.61."
        );

        assert_eq!(
            failed(2).in_step("build").to_string(),
            "[build] <make -j4 install> failed (exit code 2)."
        );

        let err = PipelineError::NoAcceptableTool {
            role: "compiler".to_string(),
            candidates: vec!["gcc".to_string(), "clang".to_string()],
        };
        assert_eq!(err.to_string(), "No valid compiler found (tried gcc, clang).");
    }

    #[test]
    fn test_exit_kind_display() {
        assert_eq!(ExitKind::Code(1).to_string(), "exit code 1");
        assert_eq!(
            ExitKind::Signal {
                number: 11,
                name: "SIGSEGV"
            }
            .to_string(),
            "terminated by signal 11 (SIGSEGV)"
        );
        assert_eq!(ExitKind::Code(3).code(), Some(3));
        assert_eq!(ExitKind::Unknown.code(), None);
    }
}
