// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for output attribution

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use test_report_core::attribution::attribute_lines;
use test_report_core::model::TestResult;

#[derive(Debug, Arbitrary)]
struct Input {
    lines: Vec<String>,
    test_path: String,
    skipped: bool,
}

fuzz_target!(|input: Input| {
    let result = if input.skipped {
        TestResult::Skipped
    } else {
        TestResult::Failed
    };

    let output = attribute_lines(&input.lines, &input.test_path, result);

    let stored: usize = output.values().map(Vec::len).sum();
    assert!(stored <= input.lines.len());
});
