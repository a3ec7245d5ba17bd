// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Report generation
//!
//! Reads `go test -json` events, rebuilds the run and writes the markdown
//! report to the configured file.

use std::fs::File;
use std::io::{self, BufWriter, IsTerminal, Read, Write};
use std::path::Path;

use test_report_core::model::Run;
use test_report_core::{RunParser, UnknownReferencePolicy};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::ReportError;
use crate::markdown::{MarkdownReport, ReportMode};

/// Exit status when the report was written but tests failed
pub const EXIT_TESTS_FAILED: u8 = 1;

/// Exit status when no report could be written
pub const EXIT_ERROR: u8 = 2;

/// Summary of a written report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportOutcome {
    pub num_tests: usize,
    pub num_passed: usize,
    pub num_failed: usize,
    pub num_skipped: usize,
    /// Events dropped because they referenced an unknown package or test
    pub skipped_events: usize,
}

impl ReportOutcome {
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.num_failed > 0
    }

    /// Process exit status for this outcome
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        if self.has_failures() {
            EXIT_TESTS_FAILED
        } else {
            0
        }
    }
}

/// Parse events and write the report described by `config`
///
/// # Errors
///
/// Returns an error if the configuration is invalid, stdin is a terminal
/// (when no input file is given), the events cannot be parsed, or the report
/// cannot be written.
pub fn generate_report(config: &Config) -> Result<ReportOutcome, ReportError> {
    config.validate()?;

    let policy = config.reference_policy();
    let (run, skipped_events) = match config.input {
        Some(ref path) => {
            let file = File::open(path).map_err(|source| ReportError::InputOpen {
                path: path.clone(),
                source,
            })?;
            info!(input = %path.display(), "Reading events from file");
            parse_events(file, policy)?
        }
        None => {
            let stdin = io::stdin();
            check_pipe(&stdin)?;
            parse_events(stdin.lock(), policy)?
        }
    };

    write_report(&config.output, &config.title, config.report_mode(), &run)?;
    info!(output = %config.output.display(), "Report written");

    Ok(ReportOutcome {
        num_tests: run.num_tests,
        num_passed: run.num_passed,
        num_failed: run.num_failed,
        num_skipped: run.num_skipped,
        skipped_events,
    })
}

/// Fail when input would be read from an interactive terminal
///
/// # Errors
///
/// Returns [`ReportError::NotPiped`] if `input` is a terminal.
pub fn check_pipe(input: &impl IsTerminal) -> Result<(), ReportError> {
    require_piped(input.is_terminal())
}

fn require_piped(is_terminal: bool) -> Result<(), ReportError> {
    if is_terminal {
        return Err(ReportError::NotPiped);
    }
    Ok(())
}

/// Parse a `go test -json` stream into a run
///
/// Returns the run and the number of events skipped under `policy`.
///
/// # Errors
///
/// Returns an error if `policy` rejects an event.
pub fn parse_events<R: Read>(
    reader: R,
    policy: UnknownReferencePolicy,
) -> Result<(Run, usize), ReportError> {
    let mut parser = RunParser::with_policy(policy);
    let mut run = Run::default();
    parser.parse(reader, &mut run)?;

    let skipped = parser.skipped_events();
    if skipped > 0 {
        warn!(skipped, "Skipped events referencing unknown packages or tests");
    }
    match parser.decode_end() {
        Some(end) if !end.is_clean() => {
            warn!(reason = %end, "Event stream ended early; report covers events read so far");
        }
        end => debug!(?end, "Event stream exhausted"),
    }

    Ok((run, skipped))
}

/// Render `run` to the file at `path`, replacing any existing file
///
/// # Errors
///
/// Returns an error if the file cannot be created or written.
pub fn write_report(
    path: &Path,
    title: &str,
    mode: ReportMode,
    run: &Run,
) -> Result<(), ReportError> {
    let file = File::create(path).map_err(|source| ReportError::OutputCreate {
        path: path.to_path_buf(),
        source,
    })?;

    let mut writer = BufWriter::new(file);
    MarkdownReport::new(title, mode, run)
        .render(&mut writer)
        .map_err(ReportError::Render)?;
    writer.flush().map_err(ReportError::Render)
}
