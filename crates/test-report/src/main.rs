// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! test-report: write a markdown report for a `go test -json` run
//!
//! Exit status is 0 when every test passed, 1 when the report was written but
//! tests failed, and 2 when no report could be written.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use test_report::config::Config;
use test_report::generate::{EXIT_ERROR, ReportOutcome, generate_report};
use tracing::{debug, info};

fn main() -> ExitCode {
    let config = Config::parse();

    // Logs go to stderr; the report itself is only ever written to a file
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_level().into()),
        )
        .init();

    debug!(?config, "Starting test-report");

    match run(&config) {
        Ok(outcome) => {
            info!(
                tests = outcome.num_tests,
                failed = outcome.num_failed,
                "Done"
            );
            ExitCode::from(outcome.exit_code())
        }
        Err(err) => {
            eprintln!("ERROR: {err:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}

fn run(config: &Config) -> anyhow::Result<ReportOutcome> {
    generate_report(config)
        .with_context(|| format!("generating {}", config.output.display()))
}
