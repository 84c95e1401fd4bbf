use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

#[cfg(windows)]
const DEFAULT_PATHEXT: &str = ".COM;.EXE;.BAT;.CMD";

#[derive(Debug, Clone)]
enum SearchPath {
    Environment,
    Dirs(Vec<PathBuf>),
}

/// Finds executables by bare name on a search path. With
/// [`Locator::from_env`] `PATH` is re-read on every lookup.
#[derive(Debug, Clone)]
pub struct Locator {
    search_path: SearchPath,
}

impl Locator {
    pub fn from_env() -> Self {
        Self {
            search_path: SearchPath::Environment,
        }
    }

    pub fn with_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            search_path: SearchPath::Dirs(dirs.into_iter().map(Into::into).collect()),
        }
    }

    pub fn locate(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() {
            return None;
        }

        let candidates = candidate_names(name);
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let mut seen = HashSet::new();

        for dir in self.directories() {
            if dir.as_os_str().is_empty() || !seen.insert(normalize(&dir)) {
                continue;
            }

            // one directory at a time keeps the de-duplicated order
            for candidate in &candidates {
                if let Ok(path) = which::which_in(candidate, Some(dir.as_os_str()), &cwd) {
                    return Some(path);
                }
            }
        }

        None
    }

    fn directories(&self) -> Vec<PathBuf> {
        match &self.search_path {
            SearchPath::Dirs(dirs) => dirs.clone(),
            SearchPath::Environment => {
                #[allow(unused_mut)]
                let mut dirs: Vec<PathBuf> = std::env::var_os("PATH")
                    .map(|path| std::env::split_paths(&path).collect())
                    .unwrap_or_default();

                // cmd.exe looks in the current directory first
                #[cfg(windows)]
                {
                    let current = PathBuf::from(".");
                    if !dirs.contains(&current) {
                        dirs.insert(0, current);
                    }
                }

                dirs
            }
        }
    }
}

impl Default for Locator {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(windows)]
fn normalize(dir: &Path) -> OsString {
    OsString::from(dir.to_string_lossy().to_lowercase())
}

#[cfg(not(windows))]
fn normalize(dir: &Path) -> OsString {
    dir.as_os_str().to_os_string()
}

#[cfg(windows)]
fn candidate_names(name: &str) -> Vec<OsString> {
    let pathext = std::env::var("PATHEXT").unwrap_or_else(|_| DEFAULT_PATHEXT.to_string());
    let extensions: Vec<&str> = pathext.split(';').filter(|ext| !ext.is_empty()).collect();

    let lower = name.to_lowercase();
    let mut candidates = vec![OsString::from(name)];
    if !extensions
        .iter()
        .any(|ext| lower.ends_with(&ext.to_lowercase()))
    {
        candidates.extend(
            extensions
                .iter()
                .map(|ext| OsString::from(format!("{}{}", name, ext))),
        );
    }
    candidates
}

#[cfg(not(windows))]
fn candidate_names(name: &str) -> Vec<OsString> {
    vec![OsString::from(name)]
}
