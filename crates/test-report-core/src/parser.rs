// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Run-state aggregation
//!
//! [`RunParser`] consumes a `go test -json` event stream in a single pass and
//! builds the [`Run`] / [`Package`] / [`Test`] hierarchy, attributing each
//! test's output to source locations once the stream is exhausted.
//!
//! # Event ordering
//!
//! Events must arrive in the causal order of a sequential test run: a
//! package's `start` before any of its tests' `run`, and a test's `run` before
//! its output and terminal (`pass`, `fail`, `skip`) events. Events that name a
//! package or test not yet seen are handled according to the parser's
//! [`UnknownReferencePolicy`].
//!
//! # Example
//!
//! ```
//! use test_report_core::parser::parse_run_output;
//!
//! let output = r#"{"Action":"start","Package":"p"}
//! {"Action":"run","Package":"p","Test":"T"}
//! {"Action":"output","Package":"p","Test":"T","Output":"    p_test.go:3: boom\n"}
//! {"Action":"fail","Package":"p","Test":"T","Elapsed":0.01}"#;
//!
//! let run = parse_run_output(output).unwrap();
//! assert_eq!(run.num_failed, 1);
//! assert_eq!(run.packages[0].tests[0].output["p_test.go:3"], vec!["boom"]);
//! ```

use std::collections::HashMap;
use std::io::Read;

use tracing::{debug, info, trace, warn};

use crate::attribution::{attribute, is_fail_marker, is_pass_marker, is_runner_framing};
use crate::error::ParseError;
use crate::event::{Action, DecodeEnd, Event, Events};
use crate::model::{Package, RAW_OUTPUT_KEY, Run, Test, TestResult};

/// How to treat an event naming a package or test that was never started
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UnknownReferencePolicy {
    /// Drop the event, log a warning and keep parsing
    #[default]
    Skip,
    /// Fail the whole parse
    Reject,
}

/// Lookup entry for a registered package
#[derive(Debug, Default)]
struct PackageSlot {
    /// Position in `Run::packages`
    index: usize,
    /// Test path to position in `Package::tests`
    tests: HashMap<String, usize>,
}

/// Single-pass parser for `go test -json` event streams
#[derive(Debug, Default)]
pub struct RunParser {
    policy: UnknownReferencePolicy,
    packages: HashMap<String, PackageSlot>,
    skipped_events: usize,
    decode_end: Option<DecodeEnd>,
}

impl RunParser {
    /// Create a parser that skips events with unknown references
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with the given unknown reference policy
    #[must_use]
    pub fn with_policy(policy: UnknownReferencePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn policy(&self) -> UnknownReferencePolicy {
        self.policy
    }

    /// Number of events dropped by the last parse under [`UnknownReferencePolicy::Skip`]
    #[must_use]
    pub fn skipped_events(&self) -> usize {
        self.skipped_events
    }

    /// Why the last parse stopped reading events
    #[must_use]
    pub fn decode_end(&self) -> Option<&DecodeEnd> {
        self.decode_end.as_ref()
    }

    /// Parse an entire event stream into `run`
    ///
    /// `run` is reset before the first event is read. Malformed or truncated
    /// input ends the stream without error.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::UnknownPackage` or `ParseError::UnknownTest` if an
    /// event references an unregistered package or test and the policy is
    /// [`UnknownReferencePolicy::Reject`].
    pub fn parse<R: Read>(&mut self, reader: R, run: &mut Run) -> Result<(), ParseError> {
        self.reset();
        *run = Run::default();

        let mut events = Events::new(reader);
        for event in events.by_ref() {
            if let Err(err) = self.process_event(&event, run) {
                if !err.is_unknown_reference() || self.policy == UnknownReferencePolicy::Reject {
                    return Err(err);
                }
                warn!(action = %event.action, error = %err, "skipping event");
                self.skipped_events += 1;
            }
        }
        self.decode_end = events.end().cloned();
        self.finish(run);

        info!(
            events = events.decoded(),
            packages = run.packages.len(),
            tests = run.num_tests,
            passed = run.num_passed,
            failed = run.num_failed,
            skipped = run.num_skipped,
            skipped_events = self.skipped_events,
            "parsed test run"
        );
        Ok(())
    }

    /// Apply a single event to `run`
    ///
    /// The run's elapsed time and timestamps are taken from every decoded
    /// event before it is dispatched. Apart from that, and the package
    /// failure recorded by a `fail` for an unknown test, an event that fails
    /// leaves `run` unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ParseError::UnknownPackage` or `ParseError::UnknownTest` if
    /// the event references an unregistered package or test.
    pub fn process_event(&mut self, event: &Event, run: &mut Run) -> Result<(), ParseError> {
        debug!(
            action = %event.action,
            package = %event.package,
            test = ?event.test,
            elapsed = ?event.elapsed,
            "event"
        );

        if event.is_package_event() {
            if let Some(elapsed) = event.elapsed_duration() {
                run.elapsed = Some(elapsed);
            }
        }
        if let Some(ts) = event.timestamp() {
            run.started.get_or_insert(ts);
            run.finished = Some(ts);
        }

        match event.action {
            Action::Start => self.start_package(event, run),
            Action::Run => self.run_test(event, run)?,
            Action::Output => self.record_output(event, run)?,
            Action::Pass => self.record_pass(event, run)?,
            Action::Fail => self.record_failure(event, run)?,
            Action::Skip => self.record_skip(event, run)?,
            Action::Other => trace!(package = %event.package, "ignoring event"),
        }
        Ok(())
    }

    /// Attribute test output and compute derived totals
    ///
    /// Called by [`RunParser::parse`]; only needed when feeding events through
    /// [`RunParser::process_event`] directly.
    pub fn finish(&mut self, run: &mut Run) {
        for test in run.packages.iter_mut().flat_map(|p| p.tests.iter_mut()) {
            attribute(test);
        }
        run.update_percent_passed();
    }

    fn reset(&mut self) {
        self.packages.clear();
        self.skipped_events = 0;
        self.decode_end = None;
    }

    // handlers

    fn start_package(&mut self, event: &Event, run: &mut Run) {
        let index = run.packages.len();
        run.packages.push(Package::new(event.package.as_str()));
        self.packages.insert(
            event.package.clone(),
            PackageSlot {
                index,
                tests: HashMap::new(),
            },
        );
    }

    fn run_test(&mut self, event: &Event, run: &mut Run) -> Result<(), ParseError> {
        let Some(path) = event.test.as_deref() else {
            return Ok(());
        };

        let slot = self
            .packages
            .get_mut(&event.package)
            .ok_or_else(|| unknown_package(event))?;
        let package = run
            .packages
            .get_mut(slot.index)
            .ok_or_else(|| unknown_package(event))?;

        slot.tests.insert(path.to_string(), package.tests.len());
        package.tests.push(Test::new(path, event.package.as_str()));
        run.num_tests += 1;
        Ok(())
    }

    fn record_output(&mut self, event: &Event, run: &mut Run) -> Result<(), ParseError> {
        let (Some(path), Some(text)) = (event.test.as_deref(), event.output.as_deref()) else {
            return Ok(());
        };
        if is_runner_framing(text) {
            return Ok(());
        }

        let test = self.test_mut(event, path, run)?;
        if is_fail_marker(text, path) {
            test.result = TestResult::Failed;
            return Ok(());
        }
        if is_pass_marker(text, path) {
            test.result = TestResult::Passed;
            return Ok(());
        }

        test.output
            .entry(RAW_OUTPUT_KEY.to_string())
            .or_default()
            .push(text.to_string());
        Ok(())
    }

    fn record_pass(&mut self, event: &Event, run: &mut Run) -> Result<(), ParseError> {
        match event.test.as_deref() {
            Some(path) => {
                let test = self.test_mut(event, path, run)?;
                conclude(test, TestResult::Passed, event);
                run.num_passed += 1;
            }
            None => {
                if let Some(elapsed) = event.elapsed_duration() {
                    self.package_mut(event, run)?.elapsed = Some(elapsed);
                }
            }
        }
        Ok(())
    }

    fn record_failure(&mut self, event: &Event, run: &mut Run) -> Result<(), ParseError> {
        match event.test.as_deref() {
            Some(path) => {
                // the package fails even when the test itself is unknown
                self.package_mut(event, run)?.passed = false;
                let test = self.test_mut(event, path, run)?;
                conclude(test, TestResult::Failed, event);
                run.num_failed += 1;
            }
            None => {
                let package = self.package_mut(event, run)?;
                package.passed = false;
                if let Some(elapsed) = event.elapsed_duration() {
                    package.elapsed = Some(elapsed);
                }
            }
        }
        Ok(())
    }

    fn record_skip(&mut self, event: &Event, run: &mut Run) -> Result<(), ParseError> {
        match event.test.as_deref() {
            Some(path) => {
                let test = self.test_mut(event, path, run)?;
                conclude(test, TestResult::Skipped, event);
                run.num_skipped += 1;
            }
            None => {
                // a package reported as skipped as a whole did not pass
                let package = self.package_mut(event, run)?;
                package.passed = false;
                if let Some(elapsed) = event.elapsed_duration() {
                    package.elapsed = Some(elapsed);
                }
            }
        }
        Ok(())
    }

    // lookups

    fn package_mut<'r>(&self, event: &Event, run: &'r mut Run) -> Result<&'r mut Package, ParseError> {
        let slot = self
            .packages
            .get(&event.package)
            .ok_or_else(|| unknown_package(event))?;
        run.packages
            .get_mut(slot.index)
            .ok_or_else(|| unknown_package(event))
    }

    fn test_mut<'r>(
        &self,
        event: &Event,
        path: &str,
        run: &'r mut Run,
    ) -> Result<&'r mut Test, ParseError> {
        let slot = self
            .packages
            .get(&event.package)
            .ok_or_else(|| unknown_package(event))?;
        let package = run
            .packages
            .get_mut(slot.index)
            .ok_or_else(|| unknown_package(event))?;

        let unknown_test = || ParseError::UnknownTest {
            package: event.package.clone(),
            test: path.to_string(),
        };
        let index = *slot.tests.get(path).ok_or_else(unknown_test)?;
        package.tests.get_mut(index).ok_or_else(unknown_test)
    }
}

fn unknown_package(event: &Event) -> ParseError {
    ParseError::UnknownPackage {
        package: event.package.clone(),
    }
}

/// Record a terminal result on a test
fn conclude(test: &mut Test, result: TestResult, event: &Event) {
    test.result = result;
    if let Some(elapsed) = event.elapsed_duration() {
        test.elapsed = Some(elapsed);
    }
}

// ============================================================================
// Parsing Functions
// ============================================================================

/// Parse a complete event stream with the default policy
///
/// # Errors
///
/// Never fails under [`UnknownReferencePolicy::Skip`]; the `Result` mirrors
/// [`RunParser::parse`].
pub fn parse_run<R: Read>(reader: R) -> Result<Run, ParseError> {
    let mut run = Run::default();
    RunParser::new().parse(reader, &mut run)?;
    Ok(run)
}

/// Parse `go test -json` output held in memory
///
/// # Errors
///
/// See [`parse_run`].
pub fn parse_run_output(output: &str) -> Result<Run, ParseError> {
    parse_run(output.as_bytes())
}
