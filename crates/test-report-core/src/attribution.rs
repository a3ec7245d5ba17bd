// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Output attribution
//!
//! Test output from `go test` interleaves source reference headers
//! (`pkgb_test.go:11: message`) with continuation lines indented by the
//! runner. Attribution groups each test's raw output lines by the source
//! location that emitted them.
//!
//! The rules used to classify a line are small pure functions so each can be
//! checked against literal fixtures.
//!
//! ```
//! use test_report_core::attribution::attribute_lines;
//! use test_report_core::model::TestResult;
//!
//! let raw = vec![
//!     "    pkgb_test.go:11: this test fails\n".to_string(),
//!     "        with two\n".to_string(),
//! ];
//! let output = attribute_lines(&raw, "TestFails", TestResult::Failed);
//! assert_eq!(output["pkgb_test.go:11"], vec!["this test fails", "with two"]);
//! ```

use std::sync::LazyLock;

use regex::Regex;

use crate::model::{OutputMap, RAW_OUTPUT_KEY, Test, TestResult};

/// Indentation the runner adds to continuation lines of a test log entry
pub const RUNNER_INDENT: &str = "        ";

/// Prefixes of lines the runner writes to frame test execution
pub const RUNNER_FRAMING_PREFIXES: [&str; 4] = ["=== RUN", "=== PAUSE", "=== CONT", "=== NAME"];

/// Prefix of the runner's summary line for a failed test
pub const FAIL_MARKER: &str = "--- FAIL";

/// Prefix of the runner's summary line for a passed test
pub const PASS_MARKER: &str = "--- PASS";

/// Captures: (location, message) from `  file.ext:123: message`
static SOURCE_REFERENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\S+\.\w+:\d+): (.*)$").unwrap());

// ============================================================================
// Line Classification
// ============================================================================

/// A source reference found at the start of an output line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceReference<'a> {
    /// `file:line` of the statement that produced the output
    pub location: &'a str,
    /// Text following the reference
    pub message: &'a str,
}

/// Remove a single trailing `\n` or `\r\n`
#[must_use]
pub fn strip_line_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

/// Lines such as `=== RUN   TestOne` that frame test execution
///
/// The runner writes these at the start of a line, so the prefix is matched
/// as-is.
#[must_use]
pub fn is_runner_framing(text: &str) -> bool {
    RUNNER_FRAMING_PREFIXES
        .iter()
        .any(|prefix| text.starts_with(prefix))
}

/// `--- FAIL: TestOne (0.00s)` for the test at `test_path`
///
/// The runner indents the marker of a subtest by four spaces per level, so
/// leading whitespace is allowed; the marker must name `test_path`, which
/// keeps log lines that merely begin with `--- FAIL` from counting.
#[must_use]
pub fn is_fail_marker(text: &str, test_path: &str) -> bool {
    is_result_marker(text, FAIL_MARKER, test_path)
}

/// `--- PASS: TestOne (0.00s)` for the test at `test_path`
///
/// Matched the same way as [`is_fail_marker`].
#[must_use]
pub fn is_pass_marker(text: &str, test_path: &str) -> bool {
    is_result_marker(text, PASS_MARKER, test_path)
}

fn is_result_marker(text: &str, marker: &str, test_path: &str) -> bool {
    text.trim_start()
        .strip_prefix(marker)
        .and_then(|rest| rest.strip_prefix(": "))
        .and_then(|rest| rest.strip_prefix(test_path))
        .is_some_and(|rest| rest.starts_with(" ("))
}

/// Match `file.ext:line: message`, allowing leading indentation
#[must_use]
pub fn source_reference(line: &str) -> Option<SourceReference<'_>> {
    let caps = SOURCE_REFERENCE_RE.captures(strip_line_terminator(line))?;
    let location = caps.get(1)?.as_str().trim();
    let message = caps.get(2)?.as_str();
    Some(SourceReference { location, message })
}

/// The runner's closing line for a skipped test, `--- SKIP: <path> (0.00s)`
///
/// Only the `": <path> (<secs>s)"` part is checked, so the line may carry any
/// prefix or indentation.
#[must_use]
pub fn is_skip_summary(line: &str, test_path: &str) -> bool {
    let needle = format!(": {test_path} (");
    line.match_indices(needle.as_str())
        .any(|(idx, _)| is_elapsed_suffix(&line[idx + needle.len()..]))
}

/// `<digits>.<digits>s)` at the start of `rest`
fn is_elapsed_suffix(rest: &str) -> bool {
    let Some((secs, _)) = rest.split_once("s)") else {
        return false;
    };
    let Some((whole, frac)) = secs.split_once('.') else {
        return false;
    };
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    digits(whole) && digits(frac)
}

/// Remove the runner's continuation indentation
#[must_use]
pub fn strip_runner_indent(line: &str) -> &str {
    line.strip_prefix(RUNNER_INDENT).unwrap_or(line)
}

// ============================================================================
// Attribution
// ============================================================================

/// Group raw output lines by the source location that emitted them
///
/// Lines before any source reference are grouped under the empty key. A
/// repeated reference to the same location replaces the earlier group.
#[must_use]
pub fn attribute_lines(lines: &[String], test_path: &str, result: TestResult) -> OutputMap {
    let mut output = OutputMap::new();
    let mut cursor = String::new();

    for line in lines {
        let line = strip_line_terminator(line);

        if let Some(reference) = source_reference(line) {
            cursor = reference.location.to_string();
            output.insert(cursor.clone(), vec![reference.message.to_string()]);
            continue;
        }

        if result == TestResult::Skipped && is_skip_summary(line, test_path) {
            continue;
        }

        let text = strip_runner_indent(line).to_string();
        match output.get_mut(&cursor) {
            Some(bucket) => bucket.push(text),
            None => {
                output.insert(cursor.clone(), vec![text]);
            }
        }
    }

    output
}

/// Replace a test's raw output with location-keyed output
///
/// Tests without raw output are left untouched, so attributing twice is
/// harmless.
pub fn attribute(test: &mut Test) {
    let Some(raw) = test.output.remove(RAW_OUTPUT_KEY) else {
        return;
    };
    let attributed = attribute_lines(&raw, &test.path, test.result);
    test.output.extend(attributed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| (*s).to_string()).collect()
    }

    fn output(entries: &[(&str, &[&str])]) -> OutputMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), lines(v)))
            .collect()
    }

    #[test]
    fn test_strip_line_terminator() {
        assert_eq!(strip_line_terminator("text\n"), "text");
        assert_eq!(strip_line_terminator("text\r\n"), "text");
        assert_eq!(strip_line_terminator("text"), "text");
        assert_eq!(strip_line_terminator("text\n\n"), "text\n");
    }

    #[test]
    fn test_is_runner_framing() {
        assert!(is_runner_framing("=== RUN   TestPasses\n"));
        assert!(is_runner_framing("=== PAUSE TestParallel\n"));
        assert!(is_runner_framing("=== CONT  TestParallel\n"));
        assert!(is_runner_framing("=== NAME  TestParallel\n"));
        assert!(!is_runner_framing("--- PASS: TestPasses (0.00s)\n"));
        assert!(!is_runner_framing("RUN tests\n"));
    }

    #[test]
    fn test_is_runner_framing_requires_line_start() {
        assert!(!is_runner_framing("    === RUN in a log message\n"));
    }

    #[test]
    fn test_markers() {
        assert!(is_fail_marker("--- FAIL: TestFails (0.00s)\n", "TestFails"));
        assert!(is_fail_marker(
            "        --- FAIL: TestSubtest/subtest/fails (0.00s)\n",
            "TestSubtest/subtest/fails"
        ));
        assert!(!is_fail_marker("FAIL\n", "TestFails"));
        assert!(is_pass_marker("--- PASS: TestPasses (0.00s)\n", "TestPasses"));
        assert!(!is_pass_marker("--- SKIP: TestSkipped (0.00s)\n", "TestSkipped"));
        assert!(!is_pass_marker("PASS\n", "TestPasses"));
    }

    #[test]
    fn test_markers_must_name_the_test() {
        assert!(!is_pass_marker("    --- PASS ok, retrying\n", "TestFails"));
        assert!(!is_pass_marker("--- PASS: TestOther (0.00s)\n", "TestFails"));
        assert!(!is_fail_marker("--- FAIL: TestFailsToo (0.00s)\n", "TestFails"));
        assert!(!is_fail_marker("--- FAIL: TestFails/sub (0.00s)\n", "TestFails"));
    }

    #[test]
    fn test_source_reference_indented() {
        let reference =
            source_reference("    pkgb_test.go:11: this test fails\n").expect("Should match");
        assert_eq!(reference.location, "pkgb_test.go:11");
        assert_eq!(reference.message, "this test fails");
    }

    #[test]
    fn test_source_reference_keeps_message_colons() {
        let reference = source_reference("main_test.go:7: got: 1, want: 2").expect("Should match");
        assert_eq!(reference.location, "main_test.go:7");
        assert_eq!(reference.message, "got: 1, want: 2");
    }

    #[test]
    fn test_source_reference_other_extensions() {
        let reference = source_reference("testdata/helper.s:42: asm").expect("Should match");
        assert_eq!(reference.location, "testdata/helper.s:42");
    }

    #[test]
    fn test_source_reference_rejects_non_references() {
        assert!(source_reference("with four").is_none());
        assert!(source_reference("pkgb_test.go:11 no colon after line").is_none());
        assert!(source_reference("pkgb_test.go:: no line number").is_none());
        assert!(source_reference("Makefile:3: no extension").is_none());
        assert!(source_reference("expected value at file.go:3: x").is_none());
    }

    #[test]
    fn test_is_skip_summary() {
        assert!(is_skip_summary("--- SKIP: TestSkipped (0.00s)\n", "TestSkipped"));
        assert!(is_skip_summary(
            "        --- SKIP: TestSubtest/subtest/skipped (0.01s)\n",
            "TestSubtest/subtest/skipped"
        ));
        assert!(!is_skip_summary("--- SKIP: TestOther (0.00s)\n", "TestSkipped"));
        assert!(!is_skip_summary("--- SKIP: TestSkipped (fast)\n", "TestSkipped"));
        assert!(!is_skip_summary("--- SKIP: TestSkipped (0s)\n", "TestSkipped"));
        assert!(!is_skip_summary("TestSkipped (0.00s)\n", "TestSkipped"));
    }

    #[test]
    fn test_is_skip_summary_treats_path_literally() {
        assert!(!is_skip_summary("--- SKIP: TestAxB (0.00s)", "TestA.B"));
        assert!(is_skip_summary("--- SKIP: TestA.B (0.00s)", "TestA.B"));
    }

    #[test]
    fn test_strip_runner_indent() {
        assert_eq!(strip_runner_indent("        with four"), "with four");
        assert_eq!(
            strip_runner_indent("          the last is indented"),
            "  the last is indented"
        );
        assert_eq!(strip_runner_indent("    four spaces"), "    four spaces");
    }

    #[test]
    fn test_attribute_multi_line_message() {
        let raw = lines(&[
            "pkgb_test.go:12: this test fails",
            "with four",
            "lines of output",
            "  the last is indented",
        ]);

        let result = attribute_lines(&raw, "TestFails", TestResult::Failed);

        assert_eq!(
            result,
            output(&[(
                "pkgb_test.go:12",
                &[
                    "this test fails",
                    "with four",
                    "lines of output",
                    "  the last is indented"
                ]
            )])
        );
    }

    #[test]
    fn test_attribute_runner_formatted_output() {
        let raw = lines(&[
            "    pkgb_test.go:11: this test fails\n",
            "        with four\n",
            "        lines of output\n",
            "          the last is indented\n",
            "raw output is not indented (unlike test failure output)\n",
        ]);

        let result = attribute_lines(&raw, "TestFails", TestResult::Failed);

        assert_eq!(
            result,
            output(&[(
                "pkgb_test.go:11",
                &[
                    "this test fails",
                    "with four",
                    "lines of output",
                    "  the last is indented",
                    "raw output is not indented (unlike test failure output)",
                ]
            )])
        );
    }

    #[test]
    fn test_attribute_multiple_locations() {
        let raw = lines(&[
            "    a_test.go:3: first\n",
            "    a_test.go:9: second\n",
            "        continued\n",
        ]);

        let result = attribute_lines(&raw, "T", TestResult::Passed);

        assert_eq!(
            result,
            output(&[("a_test.go:3", &["first"]), ("a_test.go:9", &["second", "continued"])])
        );
    }

    #[test]
    fn test_attribute_repeated_location_replaces_bucket() {
        let raw = lines(&[
            "    a_test.go:5: iteration 1\n",
            "    a_test.go:5: iteration 2\n",
        ]);

        let result = attribute_lines(&raw, "T", TestResult::Passed);

        assert_eq!(result, output(&[("a_test.go:5", &["iteration 2"])]));
    }

    #[test]
    fn test_attribute_without_reference_uses_empty_key() {
        let raw = lines(&["plain stdout\n", "more stdout\n"]);

        let result = attribute_lines(&raw, "T", TestResult::Passed);

        assert_eq!(result, output(&[("", &["plain stdout", "more stdout"])]));
    }

    #[test]
    fn test_attribute_drops_skip_summary_for_skipped_test() {
        let raw = lines(&[
            "    pkgb_test.go:16: this test is skipped\n",
            "--- SKIP: TestSkipped (0.00s)\n",
        ]);

        let result = attribute_lines(&raw, "TestSkipped", TestResult::Skipped);

        assert_eq!(
            result,
            output(&[("pkgb_test.go:16", &["this test is skipped"])])
        );
    }

    #[test]
    fn test_attribute_keeps_skip_summary_when_not_skipped() {
        let raw = lines(&["--- SKIP: TestSkipped (0.00s)\n"]);

        let result = attribute_lines(&raw, "TestSkipped", TestResult::Failed);

        assert_eq!(
            result,
            output(&[("", &["--- SKIP: TestSkipped (0.00s)"])])
        );
    }

    #[test]
    fn test_attribute_replaces_raw_key() {
        let mut test = Test::new("T", "p");
        test.output.insert(
            RAW_OUTPUT_KEY.to_string(),
            lines(&["    p_test.go:3: boom\n"]),
        );

        attribute(&mut test);

        assert!(test.raw_output().is_none());
        assert_eq!(test.output, output(&[("p_test.go:3", &["boom"])]));
    }

    #[test]
    fn test_attribute_is_idempotent() {
        let mut test = Test::new("T", "p");
        test.output.insert(
            RAW_OUTPUT_KEY.to_string(),
            lines(&["    p_test.go:3: boom\n", "        bang\n"]),
        );

        attribute(&mut test);
        let once = test.clone();
        attribute(&mut test);

        assert_eq!(test, once);
    }
}
