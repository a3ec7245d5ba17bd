// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Fuzz target for the event stream parser
//!
//! Arbitrary bytes must never panic the parser, under either policy.

#![no_main]

use libfuzzer_sys::fuzz_target;

use test_report_core::{Run, RunParser, UnknownReferencePolicy};

fuzz_target!(|data: &[u8]| {
    for policy in [UnknownReferencePolicy::Skip, UnknownReferencePolicy::Reject] {
        let mut run = Run::default();
        let mut parser = RunParser::with_policy(policy);
        if parser.parse(data, &mut run).is_ok() {
            assert!(run.tests().all(|t| t.raw_output().is_none()));
        }
    }
});
