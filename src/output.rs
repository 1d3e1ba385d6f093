//! Output formatting and display utilities

use crate::config::OutputConfig;
use crate::error::Result;
use crate::http::response::ResponseFormatter;
use serde::Serialize;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

/// Output writer that handles file vs stdout
pub struct OutputWriter {
    config: OutputConfig,
    formatter: ResponseFormatter,
}

impl OutputWriter {
    pub fn new(config: OutputConfig) -> Self {
        let formatter = ResponseFormatter::new(config.format_json);
        Self { config, formatter }
    }

    /// Serialize a value as JSON to the configured output
    pub fn write_json<T: Serialize>(&self, value: &T) -> Result<()> {
        let mut rendered = self.formatter.format(value)?;
        rendered.push('\n');
        self.write(&rendered)
    }

    /// Write content to configured output
    pub fn write(&self, content: &str) -> Result<()> {
        if let Some(file_path) = &self.config.file {
            self.write_to_file(content, file_path)
        } else {
            self.write_to_stdout(content)
        }
    }

    /// Write a status line for the user (suppressed in silent mode)
    pub fn write_status(&self, message: &str) -> Result<()> {
        if !self.config.silent {
            eprintln!("{}", message);
        }
        Ok(())
    }

    /// Write error message
    pub fn write_error(&self, message: &str) -> Result<()> {
        if !self.config.silent {
            eprintln!("estate: error: {}", message);
        }
        Ok(())
    }

    fn write_to_file(&self, content: &str, file_path: &Path) -> Result<()> {
        let mut file = File::create(file_path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    fn write_to_stdout(&self, content: &str) -> Result<()> {
        io::stdout().write_all(content.as_bytes())?;
        Ok(())
    }
}
