// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! test-report: markdown reports from `go test -json` output
//!
//! The binary reads a Go test event stream, rebuilds the run with
//! `test-report-core` and renders it as a markdown document suitable for a
//! CI job summary.

pub mod config;
pub mod error;
pub mod generate;
pub mod markdown;
pub mod writer;

pub use config::Config;
pub use error::ReportError;
pub use generate::{ReportOutcome, generate_report};
pub use markdown::{MarkdownReport, ReportMode};
