// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! test-report-core: Go test event stream processing for test-report
//!
//! This library crate parses the newline-delimited JSON produced by
//! `go test -json` into a run / package / test hierarchy, attributing each
//! test's output to the source location that produced it.
//!
//! # Example
//!
//! ```no_run
//! use test_report_core::{RunParser, Run};
//!
//! let mut run = Run::default();
//! let mut parser = RunParser::new();
//! parser.parse(std::io::stdin().lock(), &mut run).unwrap();
//!
//! println!("{}% of {} tests passed", run.percent_passed, run.num_tests);
//! ```

pub mod attribution;
pub mod error;
pub mod event;
pub mod model;
pub mod parser;

pub use error::ParseError;
pub use event::{Action, DecodeEnd, Event, Events, parse_event};
pub use model::{OutputMap, Package, Run, Test, TestResult};
pub use parser::{RunParser, UnknownReferencePolicy, parse_run, parse_run_output};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::ParseError;
    pub use crate::model::{Package, Run, Test, TestResult};
    pub use crate::parser::{RunParser, UnknownReferencePolicy, parse_run};
}
