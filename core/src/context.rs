use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use sysinfo::{CpuRefreshKind, RefreshKind, System};

use crate::config::Config;
use crate::logger::{LogSink, Logger};
use crate::mode::TargetMode;
use crate::paths::{self, ProjectPaths};
use crate::tool::ToolCatalog;

#[derive(Debug, Clone)]
pub struct ExecutionContext {
    mode: TargetMode,
    paths: ProjectPaths,
    library_version: String,
    jobs: usize,
    config: Arc<Config>,
    catalog: Arc<ToolCatalog>,
    logger: Logger,
}

impl ExecutionContext {
    pub fn new(
        mode: TargetMode,
        project_root: PathBuf,
        library_version: String,
        config: Config,
        logger: Logger,
    ) -> anyhow::Result<Self> {
        let catalog = ToolCatalog::new().with_overrides(&config.tools)?;
        let paths = ProjectPaths::new(project_root, &config.paths.build, &config.project.name);

        Ok(Self {
            mode,
            paths,
            library_version,
            jobs: available_parallelism(),
            config: Arc::new(config),
            catalog: Arc::new(catalog),
            logger,
        })
    }

    pub fn prepare(project_root: PathBuf, mode: TargetMode, config: Config) -> anyhow::Result<Self> {
        let library_version = config.read_library_version(&project_root)?;

        let build = project_root.join(&config.paths.build);
        paths::ensure_dir(&build)?;

        let log_path = build.join(&config.paths.log_file);
        let sink = LogSink::open(&log_path)
            .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

        let logger = Logger::new().with_sink(sink);
        logger.info(&format!("Write log to {}", log_path.display()));

        Self::new(mode, project_root, library_version, config, logger)
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn with_mode(&self, mode: TargetMode) -> Self {
        let mut derived = self.clone();
        derived.mode = mode;
        derived
    }

    pub fn mode(&self) -> TargetMode {
        self.mode
    }

    pub fn paths(&self) -> &ProjectPaths {
        &self.paths
    }

    pub fn library_version(&self) -> &str {
        &self.library_version
    }

    pub fn jobs(&self) -> usize {
        self.jobs
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &ToolCatalog {
        &self.catalog
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}

pub fn available_parallelism() -> usize {
    let system = System::new_with_specifics(RefreshKind::new().with_cpu(CpuRefreshKind::new()));
    system.cpus().len().max(1)
}
