//! Per-run append-only log file.

use crate::core::path::{ensure_dir, logs_dir};
use crate::core::InstallerResult;
use crate::di::EventSink;
use crate::events::{LogLine, Progress};
use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Writes every log line to `installer-<yyyyMMdd-HHmmss>.log`.
///
/// Appends are serialised behind a mutex so lines from the background work
/// and from the front end never interleave.
pub struct FileLogSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileLogSink {
    /// Open a new log file in the per-user logs directory.
    pub fn create() -> InstallerResult<Self> {
        Self::create_in(&logs_dir()?)
    }

    /// Open a new timestamped log file inside `dir`.
    pub fn create_in(dir: &Path) -> InstallerResult<Self> {
        ensure_dir(dir)?;
        let stamp = Local::now().format("%Y%m%d-%H%M%S");
        let path = dir.join(format!("installer-{}.log", stamp));
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EventSink for FileLogSink {
    fn progress(&self, _progress: Progress) {}

    fn log(&self, line: &LogLine) {
        let mut file = match self.file.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writeln!(file, "{}", line) {
            tracing::warn!("Failed to write log file {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::LogLevel;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_creates_timestamped_file() {
        let temp = TempDir::new().unwrap();
        let sink = FileLogSink::create_in(&temp.path().join("logs")).unwrap();

        let name = sink.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("installer-"));
        assert!(name.ends_with(".log"));
        assert!(sink.path().exists());
    }

    #[test]
    fn test_appends_formatted_lines() {
        let temp = TempDir::new().unwrap();
        let sink = FileLogSink::create_in(temp.path()).unwrap();

        sink.log(&LogLine::new(LogLevel::Info, "first"));
        sink.log(&LogLine::new(LogLevel::Error, "second"));

        let content = fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].ends_with("] [INFO] first"));
        assert!(lines[1].ends_with("] [ERROR] second"));
    }

    #[test]
    fn test_concurrent_lines_do_not_interleave() {
        let temp = TempDir::new().unwrap();
        let sink = Arc::new(FileLogSink::create_in(temp.path()).unwrap());

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let sink = Arc::clone(&sink);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        sink.log(&LogLine::new(LogLevel::Info, format!("thread-{}-line-{}", t, i)));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let content = fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 200);
        assert!(lines.iter().all(|l| l.contains("] [INFO] thread-")));
    }
}
