//! Output formatting and writing utilities
//!
//! Command results are plain serializable reports. Machine formats
//! serialize them directly; the human format asks the report to render
//! itself.
//!
//! Copyright (c) 2025 Therian Team
//! Licensed under the Apache-2.0 license

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use serde::Serialize;
use std::io::{self, Write};
use tracing::{debug, trace};

/// Human-readable rendering of a command report
pub trait HumanReadable {
    fn render_human(&self, use_color: bool) -> String;
}

/// Trait for formatting output values
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a report, rendering it for people in the human format
    fn format_report<T: Serialize + HumanReadable>(&self, report: &T, use_color: bool) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty | OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
        }
    }

    fn format_report<T: Serialize + HumanReadable>(&self, report: &T, use_color: bool) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(report.render_human(use_color)),
            _ => self.format(report),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self::with_writer(format, use_color, quiet, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(format: OutputFormat, use_color: bool, quiet: bool, writer: Box<dyn Write>) -> Self {
        Self {
            format,
            use_color,
            quiet,
            writer,
        }
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message (human format only)
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message (human format only)
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message (human format only)
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write a command report in the configured format
    pub fn report<T: Serialize + HumanReadable>(&mut self, report: &T) -> Result<()> {
        let formatted = self.format.format_report(report, self.use_color)?;
        trace!("Outputting report: {}", formatted);
        if formatted.ends_with('\n') {
            write!(self.writer, "{}", formatted)?;
            self.writer.flush()?;
            Ok(())
        } else {
            self.writeln(&formatted)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// A writer whose contents stay readable after being boxed
    #[derive(Clone, Default)]
    pub(crate) struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl SharedBuffer {
        pub(crate) fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    pub(crate) fn writer(format: OutputFormat) -> (OutputWriter, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (
            OutputWriter::with_writer(format, false, false, Box::new(buffer.clone())),
            buffer,
        )
    }

    #[derive(Serialize)]
    struct Answer {
        value: i32,
    }

    impl HumanReadable for Answer {
        fn render_human(&self, _use_color: bool) -> String {
            format!("The answer is {}", self.value)
        }
    }

    #[test]
    fn test_report_formats() {
        let (mut human, buffer) = writer(OutputFormat::Human);
        human.report(&Answer { value: 42 }).unwrap();
        assert_eq!(buffer.contents(), "The answer is 42\n");

        let (mut json, buffer) = writer(OutputFormat::Json);
        json.report(&Answer { value: 42 }).unwrap();
        assert_eq!(buffer.contents(), "{\"value\":42}\n");

        let (mut yaml, buffer) = writer(OutputFormat::Yaml);
        yaml.report(&Answer { value: 42 }).unwrap();
        assert_eq!(buffer.contents(), "value: 42\n");
    }

    #[test]
    fn test_messages_only_in_human_format() {
        let (mut json, buffer) = writer(OutputFormat::Json);
        json.info("hello").unwrap();
        json.warning("careful").unwrap();
        assert_eq!(buffer.contents(), "");

        let (mut human, buffer) = writer(OutputFormat::Human);
        human.info("hello").unwrap();
        human.warning("careful").unwrap();
        assert_eq!(buffer.contents(), "INFO: hello\nWARNING: careful\n");
    }
}
