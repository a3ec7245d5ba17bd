// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Command-line configuration for test-report
//!
//! Flags select the report mode, title and output file, where events are read
//! from, how strictly they are checked, and how much is logged.

use std::path::{Path, PathBuf};

use clap::Parser;
use test_report_core::UnknownReferencePolicy;

use crate::markdown::ReportMode;

/// Default report title
pub const DEFAULT_TITLE: &str = "Test Report";

/// Default report file name
pub const DEFAULT_OUTPUT: &str = "test-report.md";

/// Generate a markdown test report from `go test -json` output
///
/// Events are read from stdin unless --input is given:
///
///   go test ./... -json | test-report -t "Unit Tests"
#[derive(Parser, Debug, Clone)]
#[command(name = "test-report")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Report every test, not just failures
    #[arg(short, long, default_value = "false")]
    pub full: bool,

    /// Report the summary table only
    ///
    /// Takes precedence over --full.
    #[arg(short, long, default_value = "false")]
    pub summary: bool,

    /// Title of the report
    #[arg(short, long, env = "TEST_REPORT_TITLE", default_value = DEFAULT_TITLE)]
    pub title: String,

    /// File the report is written to
    ///
    /// An existing file is overwritten.
    #[arg(short, long, env = "TEST_REPORT_OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Read events from a file instead of stdin
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Fail on events that reference an unknown package or test
    ///
    /// By default such events are logged and skipped.
    #[arg(long, default_value = "false")]
    pub strict: bool,

    /// Enable verbose logging (debug level)
    ///
    /// Every decoded event is logged to stderr.
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            full: false,
            summary: false,
            title: DEFAULT_TITLE.to_string(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            input: None,
            strict: false,
            verbose: false,
            quiet: false,
        }
    }
}

impl Config {
    /// Report mode selected by --full and --summary
    #[must_use]
    pub fn report_mode(&self) -> ReportMode {
        if self.summary {
            ReportMode::SummaryOnly
        } else if self.full {
            ReportMode::AllTests
        } else {
            ReportMode::FailedTests
        }
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }

    #[must_use]
    pub fn reference_policy(&self) -> UnknownReferencePolicy {
        if self.strict {
            UnknownReferencePolicy::Reject
        } else {
            UnknownReferencePolicy::Skip
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The input path is specified but doesn't exist or isn't a file
    /// - The output file's directory doesn't exist
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref input) = self.input {
            if !input.exists() {
                return Err(ConfigError::InputNotFound(input.clone()));
            }
            if !input.is_file() {
                return Err(ConfigError::InputNotFile(input.clone()));
            }
        }

        let parent = self.output.parent().unwrap_or(Path::new(""));
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(ConfigError::OutputDirectoryNotFound(parent.to_path_buf()));
        }

        Ok(())
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Input file not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Input path is not a file: {0}")]
    InputNotFile(PathBuf),

    /// Directory that should contain the report doesn't exist
    #[error("Output directory not found: {0}")]
    OutputDirectoryNotFound(PathBuf),
}
