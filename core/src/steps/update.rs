use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::{PipelineError, PipelineResult};
use crate::paths;
use crate::step::{StepEnv, StepWork};

const FILE_LIST: &str = "files.txt";
const SOURCE_EXTENSIONS: &[&str] = &["cpp", "cc", "hpp", "h"];

pub struct Update;

#[async_trait]
impl StepWork for Update {
    async fn execute(&self, env: &StepEnv<'_>) -> PipelineResult<()> {
        env.info("Update source file lists...");

        let sources = env.paths().sources();
        if !sources.is_dir() {
            env.ctx().logger().warning(&format!(
                "No source directory at {}, nothing to update.",
                sources.display()
            ));
            return Ok(());
        }

        for list in find_file_lists(&sources)? {
            let Some(dir) = list.parent() else { continue };
            write_file_list(dir, &list)?;
            env.ctx()
                .logger()
                .debug(&format!("updated {}", list.display()));
        }

        Ok(())
    }
}

fn find_file_lists(root: &Path) -> PipelineResult<Vec<PathBuf>> {
    let mut lists = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = std::fs::read_dir(&dir).map_err(|e| PipelineError::io("read", &dir, e))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                pending.push(path);
            } else if entry.file_name() == FILE_LIST {
                lists.push(path);
            }
        }
    }

    lists.sort();
    Ok(lists)
}

fn write_file_list(dir: &Path, list: &Path) -> PipelineResult<()> {
    let content = paths::collect_sources(dir, SOURCE_EXTENSIONS)?
        .iter()
        .map(|path| path.to_string_lossy().replace('\\', "/"))
        .collect::<Vec<_>>()
        .join("\n");

    std::fs::write(list, content).map_err(|e| PipelineError::io("write", list, e))
}
