use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{ExitKind, PipelineError, PipelineResult};
use crate::logger::Logger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: PathBuf,
}

impl CommandLine {
    pub fn new(program: impl Into<String>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            working_dir: working_dir.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.display().to_string())
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum OutputRouting {
    /// Both streams to the log sink.
    Log,
    /// Both streams to the given file.
    Stream(File),
    /// Standard output to the given file, standard error to the log sink.
    Split(File),
}

impl OutputRouting {
    pub fn describe(&self) -> &'static str {
        match self {
            OutputRouting::Log => "log",
            OutputRouting::Stream(_) => "stream",
            OutputRouting::Split(_) => "split",
        }
    }
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandLine, routing: OutputRouting) -> PipelineResult<()>;
}

pub struct ProcessRunner {
    logger: Logger,
}

impl ProcessRunner {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    fn log_stdio(&self, command: &CommandLine) -> PipelineResult<Stdio> {
        match self.logger.sink() {
            Some(sink) => sink
                .stdio()
                .map_err(|e| PipelineError::io("duplicate", sink.path(), e)),
            None => {
                self.logger
                    .debug(&format!("no log sink, <{}> writes to the console", command));
                Ok(Stdio::inherit())
            }
        }
    }

    fn streams(
        &self,
        command: &CommandLine,
        routing: OutputRouting,
    ) -> PipelineResult<(Stdio, Stdio)> {
        let clone_err = |e| PipelineError::Spawn {
            command: command.to_string(),
            source: e,
        };

        match routing {
            OutputRouting::Log => Ok((self.log_stdio(command)?, self.log_stdio(command)?)),
            OutputRouting::Stream(file) => {
                let stderr = file.try_clone().map_err(clone_err)?;
                Ok((Stdio::from(file), Stdio::from(stderr)))
            }
            OutputRouting::Split(file) => Ok((Stdio::from(file), self.log_stdio(command)?)),
        }
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandLine, routing: OutputRouting) -> PipelineResult<()> {
        let start = Instant::now();
        self.logger.debug(&format!(
            "run <{}> in {} ({})",
            command,
            command.working_dir.display(),
            routing.describe()
        ));

        let (stdout, stderr) = self.streams(command, routing)?;

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .current_dir(&command.working_dir)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .spawn()
            .map_err(|source| PipelineError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let status = child.wait().await.map_err(|source| PipelineError::Spawn {
            command: command.to_string(),
            source,
        })?;

        self.logger.debug(&format!(
            "<{}> finished in {:.1}s",
            command.program,
            start.elapsed().as_secs_f64()
        ));

        if status.success() {
            Ok(())
        } else {
            Err(PipelineError::CommandFailed {
                command: command.to_string(),
                status: ExitKind::from_status(&status),
            })
        }
    }
}
