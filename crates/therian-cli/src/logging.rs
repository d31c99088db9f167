//! Logging setup for the Therian CLI
//!
//! This module provides:
//! - Session ID generation
//! - Structured logging setup (compact, full or JSON)
//! - Forwarding of the engine's `log` records into the subscriber
//! - Performance timing spans
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use crate::config;
use crate::error::{Error, Result};
use is_terminal::IsTerminal;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{field, Span};
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Global session ID for the current invocation
static SESSION_ID: OnceLock<String> = OnceLock::new();

/// Effective logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Enable console output
    pub console: bool,
    /// Optional file output path
    pub file: Option<PathBuf>,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact format for everyday use
    Compact,
    /// Full format with all details
    Full,
    /// JSON structured format
    Json,
}

impl LogFormat {
    fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "compact" => Some(LogFormat::Compact),
            "full" => Some(LogFormat::Full),
            "json" => Some(LogFormat::Json),
            _ => None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            console: true,
            file: None,
            thread_ids: false,
            source_location: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging config from verbosity level
    pub fn from_verbosity(verbosity: u8) -> Self {
        let mut config = Self::default();

        match verbosity {
            0 => {}
            1 => {
                config.level = "info".to_string();
            }
            2 => {
                config.level = "debug".to_string();
                config.source_location = true;
            }
            _ => {
                config.level = "trace".to_string();
                config.format = LogFormat::Full;
                config.source_location = true;
                config.thread_ids = true;
            }
        }

        config
    }

    /// Apply the configuration file's logging section; an explicit -v flag
    /// keeps its level
    pub fn apply_file_settings(&mut self, settings: &config::LoggingConfig, verbosity: u8) {
        if verbosity == 0 {
            if let Some(level) = &settings.level {
                self.level = level.clone();
            }
        }
        if let Some(format) = settings.format.as_deref().and_then(LogFormat::parse) {
            self.format = format;
        }
        if settings.file.is_some() {
            self.file = settings.file.clone();
        }
        self.thread_ids |= settings.thread_ids;
    }

    /// Apply environment overrides
    pub fn merge_with_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        // RUST_LOG takes precedence
        if let Some(rust_log) = lookup("RUST_LOG") {
            self.level = rust_log;
        }

        if let Some(format) = lookup("THERIAN_LOG_FORMAT") {
            match LogFormat::parse(&format) {
                Some(format) => self.format = format,
                None => eprintln!("Invalid log format: {}, using default", format),
            }
        }

        if let Some(file) = lookup("THERIAN_LOG_FILE") {
            self.file = Some(PathBuf::from(file));
        }

        if let Some(console) = lookup("THERIAN_LOG_CONSOLE") {
            self.console = console.to_lowercase() == "true" || console == "1";
        }
    }

    fn writer(&self) -> Result<(BoxMakeWriter, bool)> {
        if let Some(path) = &self.file {
            let directory = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path
                .file_name()
                .ok_or_else(|| Error::config(format!("log file {} has no file name", path.display())))?;
            std::fs::create_dir_all(&directory)?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            return Ok((BoxMakeWriter::new(appender), false));
        }
        if self.console {
            Ok((BoxMakeWriter::new(std::io::stderr), std::io::stderr().is_terminal()))
        } else {
            Ok((BoxMakeWriter::new(std::io::sink), false))
        }
    }
}

/// Initialize the global logging system
///
/// The subscriber also installs the `log` bridge, so records emitted by
/// `therian-core` are filtered and formatted here too.
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.level)
        .map_err(|e| Error::config(format!("Invalid log filter '{}': {}", config.level, e)))?;
    let (writer, ansi) = config.writer()?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(writer)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    let initialized = match config.format {
        LogFormat::Compact => builder.with_ansi(ansi).compact().finish().try_init(),
        LogFormat::Full => builder.with_ansi(ansi).finish().try_init(),
        LogFormat::Json => builder.with_ansi(false).json().finish().try_init(),
    };
    initialized.map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    let session_id = SESSION_ID.get_or_init(generate_session_id);
    tracing::debug!(
        session_id = %session_id,
        config = ?config,
        "Logging system initialized"
    );

    Ok(())
}

/// Generate a unique ID for this invocation
pub fn generate_session_id() -> String {
    format!("run_{}", Uuid::new_v4().simple())
}

/// Get the current session ID
pub fn current_session_id() -> Option<&'static str> {
    SESSION_ID.get().map(|s| s.as_str())
}

/// Create a span carrying the session ID and a duration slot
pub fn create_command_span(command: &str) -> Span {
    tracing::info_span!(
        "command",
        command = command,
        session_id = current_session_id().unwrap_or("unknown"),
        duration_ms = field::Empty,
    )
}

/// Performance timing utilities
pub mod timing {
    use std::time::Instant;
    use tracing::Span;

    /// A timer that logs the duration of a command when finished
    pub struct Timer {
        start: Instant,
        span: Span,
        command: String,
    }

    impl Timer {
        pub fn new(command: &str) -> Self {
            Self {
                start: Instant::now(),
                span: super::create_command_span(command),
                command: command.to_string(),
            }
        }

        /// Finish the timer and log the duration
        pub fn finish(self) {
            let duration = self.start.elapsed();
            self.span.record("duration_ms", duration.as_millis() as u64);
            tracing::info!(
                command = %self.command,
                duration_ms = duration.as_millis() as u64,
                "Command completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_verbosity() {
        assert_eq!(LoggingConfig::from_verbosity(0).level, "warn");
        assert_eq!(LoggingConfig::from_verbosity(1).level, "info");
        let debug = LoggingConfig::from_verbosity(2);
        assert_eq!(debug.level, "debug");
        assert!(debug.source_location);
        let trace = LoggingConfig::from_verbosity(5);
        assert_eq!(trace.level, "trace");
        assert_eq!(trace.format, LogFormat::Full);
    }

    #[test]
    fn test_file_settings_respect_explicit_verbosity() {
        let settings = config::LoggingConfig {
            level: Some("debug".to_string()),
            format: Some("json".to_string()),
            file: None,
            thread_ids: true,
        };

        let mut quiet = LoggingConfig::from_verbosity(0);
        quiet.apply_file_settings(&settings, 0);
        assert_eq!(quiet.level, "debug");
        assert_eq!(quiet.format, LogFormat::Json);
        assert!(quiet.thread_ids);

        let mut verbose = LoggingConfig::from_verbosity(1);
        verbose.apply_file_settings(&settings, 1);
        assert_eq!(verbose.level, "info");
    }

    #[test]
    fn test_environment_overrides() {
        let mut config = LoggingConfig::default();
        config.merge_with_env(|key| match key {
            "RUST_LOG" => Some("therian_core=trace".to_string()),
            "THERIAN_LOG_FORMAT" => Some("JSON".to_string()),
            "THERIAN_LOG_CONSOLE" => Some("0".to_string()),
            _ => None,
        });
        assert_eq!(config.level, "therian_core=trace");
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.console);
        assert!(config.file.is_none());
    }

    #[test]
    fn test_session_id_format() {
        let id = generate_session_id();
        assert!(id.starts_with("run_"));
        assert_eq!(id.len(), 4 + 32);
        assert_ne!(id, generate_session_id());
    }
}
