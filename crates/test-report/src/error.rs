// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for test-report

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop a report from being written
#[derive(Debug, Error)]
pub enum ReportError {
    /// Stdin is a terminal and no --input file was given
    #[error("no input detected (pipe go test -json output or use --input)")]
    NotPiped,

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Error opening the --input file
    #[error("Failed to open input {path}: {source}")]
    InputOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] test_report_core::ParseError),

    /// Error creating the report file
    #[error("Failed to create report {path}: {source}")]
    OutputCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error writing the report
    #[error("Failed to write report: {0}")]
    Render(#[source] std::io::Error),
}
