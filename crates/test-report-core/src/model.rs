// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Test run result types
//!
//! A [`Run`] owns its packages in the order they were first seen, and each
//! [`Package`] owns its tests in the same way.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Output key holding unattributed lines while a stream is being parsed
pub const RAW_OUTPUT_KEY: &str = "raw";

/// Test output grouped by the source location that emitted it
pub type OutputMap = BTreeMap<String, Vec<String>>;

/// Possible test results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestResult {
    /// Test failed, or never reported a result
    #[default]
    Failed,
    /// Test passed
    Passed,
    /// Test was skipped
    Skipped,
}

/// A single test case (or subtest)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Test {
    /// Test path, e.g. `TestSubtest/subtest/fails`
    pub path: String,
    /// Final result
    pub result: TestResult,
    /// Time taken, if reported
    pub elapsed: Option<Duration>,
    /// Name of the package containing the test
    pub package_name: String,
    /// Output lines keyed by `file:line`
    pub output: OutputMap,
}

impl Test {
    /// Create a test that has started but not yet reported a result
    #[must_use]
    pub fn new(path: impl Into<String>, package_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            package_name: package_name.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn passed(&self) -> bool {
        self.result == TestResult::Passed
    }

    #[must_use]
    pub fn failed(&self) -> bool {
        self.result == TestResult::Failed
    }

    #[must_use]
    pub fn skipped(&self) -> bool {
        self.result == TestResult::Skipped
    }

    /// Raw output lines still waiting to be attributed
    #[must_use]
    pub fn raw_output(&self) -> Option<&[String]> {
        self.output.get(RAW_OUTPUT_KEY).map(Vec::as_slice)
    }

    /// Whether the test produced any attributed output
    #[must_use]
    pub fn has_output(&self) -> bool {
        self.output.values().any(|lines| !lines.is_empty())
    }

    /// Test name without its parent test path
    ///
    /// `TestSubtest/subtest/fails` becomes `fails`.
    #[must_use]
    pub fn short_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// A package and the tests it ran
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    /// Import path of the package
    pub name: String,
    /// False once any test fails or the package itself fails or is skipped
    pub passed: bool,
    /// Time taken to run the package, if reported
    pub elapsed: Option<Duration>,
    /// Tests in the order they started
    pub tests: Vec<Test>,
}

impl Package {
    /// Create a package with no tests that has not (yet) failed
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            passed: true,
            elapsed: None,
            tests: Vec::new(),
        }
    }

    /// Find a test by path
    #[must_use]
    pub fn test(&self, path: &str) -> Option<&Test> {
        self.tests.iter().find(|t| t.path == path)
    }

    /// Count tests with the given result
    #[must_use]
    pub fn count(&self, result: TestResult) -> usize {
        self.tests.iter().filter(|t| t.result == result).count()
    }
}

/// Aggregated results of one test run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Overall elapsed time, if reported
    pub elapsed: Option<Duration>,
    /// Timestamp of the first event that carried one
    pub started: Option<DateTime<FixedOffset>>,
    /// Timestamp of the last event that carried one
    pub finished: Option<DateTime<FixedOffset>>,
    /// Packages in the order they started
    pub packages: Vec<Package>,
    /// Tests started
    pub num_tests: usize,
    /// Tests passed
    pub num_passed: usize,
    /// Tests failed
    pub num_failed: usize,
    /// Tests skipped
    pub num_skipped: usize,
    /// `num_passed * 100 / num_tests`, truncated; zero when no tests ran
    pub percent_passed: usize,
}

impl Run {
    /// Create an empty run
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if no test failed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.num_failed == 0
    }

    /// Iterate over every test in every package
    pub fn tests(&self) -> impl Iterator<Item = &Test> {
        self.packages.iter().flat_map(|p| p.tests.iter())
    }

    /// Get failing tests
    #[must_use]
    pub fn failing_tests(&self) -> Vec<&Test> {
        self.tests().filter(|t| t.failed()).collect()
    }

    /// Find a package by name
    ///
    /// If a package was started more than once the latest entry is returned.
    #[must_use]
    pub fn package(&self, name: &str) -> Option<&Package> {
        self.packages.iter().rev().find(|p| p.name == name)
    }

    /// Recompute `percent_passed` from the counters
    pub fn update_percent_passed(&mut self) {
        self.percent_passed = percent(self.num_passed, self.num_tests);
    }
}

/// Integer percentage, truncated, with a zero total yielding zero
#[must_use]
pub fn percent(part: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    part.saturating_mul(100) / total
}
