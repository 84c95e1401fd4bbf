use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Local;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Failure,
}

impl LogLevel {
    pub fn to_str(&self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Failure => "FAIL",
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogSink {
    path: PathBuf,
    file: Arc<Mutex<File>>,
}

impl LogSink {
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;

        Ok(Self {
            path,
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write_line(&self, level: LogLevel, message: &str) -> std::io::Result<()> {
        let mut file = self.lock();
        writeln!(
            file,
            "[{}] [{}]: {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            level.to_str(),
            message
        )?;
        file.flush()
    }

    pub fn stdio(&self) -> std::io::Result<Stdio> {
        Ok(Stdio::from(self.lock().try_clone()?))
    }

    fn lock(&self) -> MutexGuard<'_, File> {
        match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Logger {
    use_colors: bool,
    sink: Option<LogSink>,
}

impl Logger {
    pub fn new() -> Self {
        Self {
            use_colors: atty::is(atty::Stream::Stdout),
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: LogSink) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn sink(&self) -> Option<&LogSink> {
        self.sink.as_ref()
    }

    pub fn log(&self, level: LogLevel, message: &str) {
        if level > LogLevel::Debug {
            self.print(level, message);
        }

        if let Some(sink) = &self.sink {
            if let Err(err) = sink.write_line(level, message) {
                eprintln!("failed to write to {}: {}", sink.path().display(), err);
            }
        }
    }

    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn failure(&self, message: &str) {
        self.log(LogLevel::Failure, message);
    }

    fn print(&self, level: LogLevel, message: &str) {
        let line = match level {
            LogLevel::Info | LogLevel::Debug => format!("> {}", message),
            other => format!("[{}]: {}", other.to_str(), message),
        };

        if self.use_colors {
            let color = match level {
                LogLevel::Debug => "\x1b[90m",
                LogLevel::Info => "\x1b[32m",
                LogLevel::Warning => "\x1b[33m",
                LogLevel::Failure => "\x1b[31;1m",
            };
            println!("{}{}\x1b[0m", color, line);
        } else {
            println!("{}", line);
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_sink_receives_every_level() {
        let dir = TempDir::new().unwrap();
        let sink = LogSink::open(dir.path().join("kiln.log")).unwrap();
        let logger = Logger::new().with_sink(sink.clone());

        logger.debug("probing");
        logger.info("Build project...");
        logger.failure("The tool make was not found.");

        let content = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("[DEBUG]: probing"));
        assert!(lines[1].ends_with("[INFO]: Build project..."));
        assert!(lines[2].ends_with("[FAIL]: The tool make was not found."));
    }

    #[test]
    fn test_open_truncates_previous_log() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kiln.log");
        std::fs::write(&path, "stale\n").unwrap();

        let sink = LogSink::open(&path).unwrap();
        sink.write_line(LogLevel::Info, "fresh").unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("stale"));
        assert!(content.contains("fresh"));
    }

    #[test]
    fn test_level_ordering() {
        assert!(LogLevel::Failure > LogLevel::Warning);
        assert!(LogLevel::Info > LogLevel::Debug);
        assert_eq!(LogLevel::Warning.to_str(), "WARN");
    }
}
