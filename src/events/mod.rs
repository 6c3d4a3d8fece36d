//! Progress and log events emitted by a run.
//!
//! The engine never writes to the terminal or a log file directly. It emits
//! through an injected [`EventSink`]; [`Reporter`] wraps the sink, mirrors
//! every line to `tracing`, and keeps progress monotonic.

pub mod channel;
pub mod file_log;

pub use channel::{ChannelSink, InstallerEvent};
pub use file_log::FileLogSink;

use crate::di::EventSink;
use chrono::{DateTime, Local};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warn => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

/// One log line, rendered as `[yyyy-MM-dd HH:mm:ss] [LEVEL] message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    pub message: String,
}

impl LogLine {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            message: message.into(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] [{}] {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S"),
            self.level,
            self.message
        )
    }
}

/// Progress milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Progress {
    pub percent: u8,
    pub stage: String,
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn progress(&self, _progress: Progress) {}
    fn log(&self, _line: &LogLine) {}
}

/// Sink that forwards every event to several sinks.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn EventSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }
}

impl EventSink for FanoutSink {
    fn progress(&self, progress: Progress) {
        for sink in &self.sinks {
            sink.progress(progress.clone());
        }
    }

    fn log(&self, line: &LogLine) {
        for sink in &self.sinks {
            sink.log(line);
        }
    }
}

/// Engine-side handle on the sink.
#[derive(Clone)]
pub struct Reporter {
    sink: Arc<dyn EventSink>,
    last_percent: Arc<AtomicU8>,
}

impl Reporter {
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            sink,
            last_percent: Arc::new(AtomicU8::new(0)),
        }
    }

    /// Reporter with no listener.
    pub fn silent() -> Self {
        Self::new(Arc::new(NullSink))
    }

    /// Restart the progress sequence at 0.
    pub fn reset(&self) {
        self.last_percent.store(0, Ordering::SeqCst);
    }

    /// Emit a progress milestone. Values are clamped to `100` and never go
    /// below the last reported value.
    pub fn progress(&self, percent: u8, stage: impl Into<String>) {
        let requested = percent.min(100);
        let previous = self.last_percent.fetch_max(requested, Ordering::SeqCst);
        let stage = stage.into();
        tracing::debug!(percent = requested.max(previous), stage = %stage, "progress");
        self.sink.progress(Progress {
            percent: requested.max(previous),
            stage,
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        let line = LogLine::new(LogLevel::Info, message);
        tracing::info!("{}", line.message);
        self.sink.log(&line);
    }

    pub fn warn(&self, message: impl Into<String>) {
        let line = LogLine::new(LogLevel::Warn, message);
        tracing::warn!("{}", line.message);
        self.sink.log(&line);
    }

    pub fn error(&self, message: impl Into<String>) {
        let line = LogLine::new(LogLevel::Error, message);
        tracing::error!("{}", line.message);
        self.sink.log(&line);
    }
}
