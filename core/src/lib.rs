pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod locator;
pub mod logger;
pub mod mode;
pub mod paths;
pub mod pipeline;
pub mod registry;
pub mod runner;
pub mod step;
pub mod steps;
pub mod tool;
pub mod version;

pub use cli::Cli;
pub use config::Config;
pub use context::ExecutionContext;
pub use error::{ExitKind, PipelineError, PipelineResult};
pub use locator::Locator;
pub use mode::TargetMode;
pub use paths::ProjectPaths;
pub use pipeline::{Pipeline, PipelineReport, StepRecord};
pub use registry::{GraphError, StepRegistry};
pub use runner::{CommandLine, CommandRunner, OutputRouting, ProcessRunner};
pub use step::{StepDescriptor, StepEnv, StepStatus, StepWork};
pub use steps::builtin_registry;
pub use tool::{ResolvedTool, SystemResolver, Tool, ToolCatalog, ToolResolver, ToolSpec};
pub use version::{Version, VersionCheck};
