use anyhow::Context;
use clap::{ArgGroup, Parser};
use std::path::PathBuf;

use crate::mode::TargetMode;

#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("mode").args(["debug", "release", "coverage"])))]
pub struct Cli {
    #[arg(
        value_name = "STEP",
        required_unless_present = "list",
        help = "Steps to execute, in order"
    )]
    pub steps: Vec<String>,

    #[arg(short, long, help = "Build the debug target (default)")]
    pub debug: bool,

    #[arg(short, long, help = "Build the release target")]
    pub release: bool,

    #[arg(short, long, help = "Build the coverage target")]
    pub coverage: bool,

    #[arg(
        short = 'C',
        long = "directory",
        value_name = "DIR",
        help = "Project directory"
    )]
    pub project_dir: Option<PathBuf>,

    #[arg(long, value_name = "FILE", help = "Configuration file path")]
    pub config: Option<PathBuf>,

    #[arg(short, long, value_name = "N", help = "Parallel jobs for the build driver")]
    pub jobs: Option<usize>,

    #[arg(long, help = "List available steps and exit")]
    pub list: bool,
}

impl Cli {
    pub fn mode(&self) -> TargetMode {
        if self.release {
            TargetMode::Release
        } else if self.coverage {
            TargetMode::Coverage
        } else {
            TargetMode::Debug
        }
    }

    pub fn project_directory(&self) -> anyhow::Result<PathBuf> {
        match &self.project_dir {
            Some(dir) => Ok(dir.clone()),
            None => std::env::current_dir().context("Failed to determine current directory"),
        }
    }
}
