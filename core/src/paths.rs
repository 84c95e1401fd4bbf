use std::path::{Path, PathBuf};

use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone)]
pub struct ProjectPaths {
    project: PathBuf,
    build: PathBuf,
    project_name: String,
}

impl ProjectPaths {
    pub fn new(project: impl Into<PathBuf>, build_dir: impl AsRef<Path>, project_name: &str) -> Self {
        let project = project.into();
        let build = project.join(build_dir);
        Self {
            project,
            build,
            project_name: project_name.to_string(),
        }
    }

    pub fn project(&self) -> &Path {
        &self.project
    }

    pub fn build(&self) -> &Path {
        &self.build
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn cmake(&self) -> PathBuf {
        self.build.join("cmake")
    }

    pub fn install(&self) -> PathBuf {
        self.build.join("install")
    }

    pub fn reports(&self) -> PathBuf {
        self.build.join("reports")
    }

    pub fn coverage(&self) -> PathBuf {
        self.build.join("coverage")
    }

    pub fn download(&self) -> PathBuf {
        self.build.join("download")
    }

    pub fn documentation(&self) -> PathBuf {
        self.build.join("documentation")
    }

    pub fn sources(&self) -> PathBuf {
        self.project.join("src")
    }

    pub fn unittest_bin(&self) -> PathBuf {
        self.cmake()
            .join("src")
            .join("unittest")
            .join(format!("unittest_{}", self.project_name))
    }

    pub fn integrationtest_bin(&self) -> PathBuf {
        self.cmake()
            .join("src")
            .join("integrationtest")
            .join(format!("integrationtest_{}", self.project_name))
    }
}

pub fn renew_dir(dir: &Path) -> PipelineResult<()> {
    remove_dir(dir)?;
    ensure_dir(dir)
}

pub fn ensure_dir(dir: &Path) -> PipelineResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| PipelineError::io("create", dir, e))
}

pub fn remove_dir(dir: &Path) -> PipelineResult<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(PipelineError::io("remove", dir, e)),
    }
}

pub fn collect_sources(root: &Path, extensions: &[&str]) -> PipelineResult<Vec<PathBuf>> {
    fn search_recursive(
        dir: &Path,
        root: &Path,
        extensions: &[&str],
        found: &mut Vec<PathBuf>,
    ) -> PipelineResult<()> {
        let entries = std::fs::read_dir(dir).map_err(|e| PipelineError::io("read", dir, e))?;

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                search_recursive(&path, root, extensions, found)?;
                continue;
            }

            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| extensions.contains(&ext));

            if matches {
                if let Ok(relative) = path.strip_prefix(root) {
                    found.push(relative.to_path_buf());
                }
            }
        }

        Ok(())
    }

    let mut found = Vec::new();
    search_recursive(root, root, extensions, &mut found)?;
    found.sort();
    Ok(found)
}
