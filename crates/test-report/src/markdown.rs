// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Markdown report rendering
//!
//! Reports are markdown documents built from HTML tables so they render in
//! GitHub job summaries and pull request comments.

use std::fmt::Write as _;
use std::io::{self, Write};
use std::time::Duration;

use test_report_core::model::{OutputMap, Package, Run, Test, TestResult};

use crate::writer::IndentWriter;

/// Footer appended to every report
pub const FOOTER: &str = "_markdown test report generated by test-report_";

/// Icons used in reports
pub mod icon {
    pub const GREEN_BOOK: &str = "📗";
    pub const YELLOW_BOOK: &str = "📒";
    pub const ORANGE_BOOK: &str = "📙";
    pub const RED_BOOK: &str = "📕";
    pub const FAILED: &str = "🔴";
    pub const PASSED: &str = "✅";
    pub const SKIPPED: &str = "🔕";
}

/// How much detail a report includes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportMode {
    /// Summary plus details of failed tests
    #[default]
    FailedTests,
    /// Summary plus every test
    AllTests,
    /// Summary table only
    SummaryOnly,
}

/// A markdown rendering of a parsed test run
pub struct MarkdownReport<'a> {
    title: &'a str,
    mode: ReportMode,
    run: &'a Run,
}

impl<'a> MarkdownReport<'a> {
    #[must_use]
    pub fn new(title: &'a str, mode: ReportMode, run: &'a Run) -> Self {
        Self { title, mode, run }
    }

    /// Write the report to `writer`
    ///
    /// # Errors
    ///
    /// Returns the first I/O error raised by `writer`.
    pub fn render<W: Write>(&self, writer: W) -> io::Result<()> {
        let mut out = IndentWriter::new(writer);

        out.line(&format!(
            "## {}&nbsp;&nbsp;{}",
            self.report_icon(),
            escape(self.title)
        ));
        out.blank();
        self.write_summary(&mut out);
        if self.mode != ReportMode::SummaryOnly {
            self.write_detail(&mut out);
        }
        out.blank();
        out.line("<hr>");
        out.blank();
        out.line(FOOTER);

        out.finish().map(|_| ())
    }

    /// Icon summarising the overall result
    ///
    /// A run with skipped tests but no failures is never shown as fully green.
    #[must_use]
    pub fn report_icon(&self) -> &'static str {
        let run = self.run;
        if run.num_failed == 0 && run.num_skipped > 0 {
            return icon::YELLOW_BOOK;
        }
        match run.percent_passed {
            100.. => icon::GREEN_BOOK,
            95..=99 => icon::YELLOW_BOOK,
            85..=94 => icon::ORANGE_BOOK,
            _ => icon::RED_BOOK,
        }
    }

    fn write_summary<W: Write>(&self, out: &mut IndentWriter<W>) {
        let run = self.run;
        out.element("<table>", "</table>", |out| {
            out.element("<tr>", "</tr>", |out| {
                out.line("<td><b>packages</b></td>");
                out.line(&format!("<td>{}</td>", run.packages.len()));
                out.line(&format!(
                    "<td>{}</td>",
                    format_duration(run.elapsed.unwrap_or_default())
                ));
                out.line("<td><b>tests</b></td>");
                out.line(&format!("<td align='right'>{}</td>", run.num_tests));
            });
            if run.num_failed > 0 {
                summary_row(out, icon::FAILED, "failed", &run.num_failed.to_string());
            }
            if run.num_skipped > 0 {
                summary_row(out, icon::SKIPPED, "skipped", &run.num_skipped.to_string());
            }
            summary_row(
                out,
                self.report_icon(),
                "passed",
                &format!("{}%", run.percent_passed),
            );
        });
    }

    fn write_detail<W: Write>(&self, out: &mut IndentWriter<W>) {
        let packages: Vec<&Package> = self
            .run
            .packages
            .iter()
            .filter(|p| self.mode == ReportMode::AllTests || !p.passed)
            .collect();
        if packages.is_empty() {
            return;
        }

        out.element("<table>", "</table>", |out| {
            for pkg in packages {
                self.write_package(out, pkg);
            }
        });
    }

    fn write_package<W: Write>(&self, out: &mut IndentWriter<W>, pkg: &Package) {
        let pkg_icon = if pkg.passed { icon::PASSED } else { icon::FAILED };
        out.element("<tr>", "</tr>", |out| {
            out.line(&format!("<td>{pkg_icon}</td>"));
            out.line(&format!("<td colspan='2'><b>{}</b></td>", escape(&pkg.name)));
            out.line(&format!(
                "<td align='right'>{}</td>",
                format_duration(pkg.elapsed.unwrap_or_default())
            ));
        });

        match self.mode {
            ReportMode::AllTests => {
                for test in &pkg.tests {
                    write_test(out, test);
                }
            }
            _ => {
                for test in pkg.tests.iter().filter(|t| t.failed()) {
                    write_test(out, test);
                }
                let skipped = pkg.count(TestResult::Skipped);
                if skipped > 0 {
                    let text = match skipped {
                        1 => "1 test was skipped".to_string(),
                        n => format!("{n} tests were skipped"),
                    };
                    count_row(out, icon::SKIPPED, &text);
                }
                let passed = pkg.count(TestResult::Passed);
                if passed > 0 {
                    let text = match passed {
                        1 => "1 test passed".to_string(),
                        n => format!("{n} tests passed"),
                    };
                    count_row(out, icon::PASSED, &text);
                }
            }
        }
    }
}

fn summary_row<W: Write>(out: &mut IndentWriter<W>, icon: &str, label: &str, value: &str) {
    out.element("<tr>", "</tr>", |out| {
        out.line(&format!("<td colspan=3 align='right'>{icon}</td>"));
        out.line(&format!("<td>{label}</td>"));
        out.line(&format!("<td align='right'>{value}</td>"));
    });
}

fn count_row<W: Write>(out: &mut IndentWriter<W>, icon: &str, text: &str) {
    out.element("<tr>", "</tr>", |out| {
        out.line(&format!("<td>{icon}</td>"));
        out.line(&format!("<td colspan=3><b>{text}</b></td>"));
    });
}

fn write_test<W: Write>(out: &mut IndentWriter<W>, test: &Test) {
    out.element("<tr valign='top'>", "</tr>", |out| {
        out.line("<td></td>");
        out.line(&format!("<td>{}</td>", result_icon(test.result)));
        out.element("<td>", "</td>", |out| {
            out.line(&format!("<b>{}</b>", escape(&test.path)));
            write_output(out, &test.output);
        });
        out.line(&format!(
            "<td align='right'>{}</td>",
            format_duration(test.elapsed.unwrap_or_default())
        ));
    });
}

/// Write each location's output as a caption and a `<pre>` block
pub fn write_output<W: Write>(out: &mut IndentWriter<W>, output: &OutputMap) {
    for (location, lines) in output {
        if lines.is_empty() {
            continue;
        }
        if !location.is_empty() {
            out.line(&format!("<div><i>{}</i></div>", escape(location)));
        }

        let last = lines.len() - 1;
        for (i, line) in lines.iter().enumerate() {
            let mut text = String::new();
            if i == 0 {
                text.push_str("<pre>");
            }
            text.push_str(&escape_pre(line));
            if i == last {
                text.push_str("</pre>");
            }
            if i == 0 {
                out.line(&text);
            } else {
                out.raw_line(&text);
            }
        }
    }
}

#[must_use]
pub fn result_icon(result: TestResult) -> &'static str {
    match result {
        TestResult::Failed => icon::FAILED,
        TestResult::Passed => icon::PASSED,
        TestResult::Skipped => icon::SKIPPED,
    }
}

/// Escape text for use inside HTML elements
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Escape a line of test output, keeping its spacing intact
#[must_use]
pub fn escape_pre(text: &str) -> String {
    escape(text).replace(' ', "&nbsp;")
}

/// Format a duration the way Go prints `time.Duration`: `0s`, `6ms`, `1.5s`, `2m3s`
#[must_use]
pub fn format_duration(d: Duration) -> String {
    let millis = d.as_millis();
    if millis == 0 {
        return if d.is_zero() {
            "0s".to_string()
        } else {
            format!("{}µs", d.as_micros())
        };
    }
    if millis < 1000 {
        return format!("{millis}ms");
    }

    let minutes = millis / 60_000;
    let rem = millis % 60_000;
    let mut secs = (rem / 1000).to_string();
    let frac = rem % 1000;
    if frac > 0 {
        let _ = write!(secs, ".{frac:03}");
        let trimmed = secs.trim_end_matches('0').len();
        secs.truncate(trimmed);
    }

    if minutes > 0 {
        format!("{minutes}m{secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn render(report: &MarkdownReport<'_>) -> Vec<String> {
        let mut buf = Vec::new();
        report.render(&mut buf).expect("render to Vec");
        String::from_utf8(buf)
            .expect("utf-8")
            .split('\n')
            .map(str::to_string)
            .collect()
    }

    fn sample_run() -> Run {
        let mut pkg = Package::new("github.com/foo/package");
        pkg.passed = false;
        pkg.elapsed = Some(Duration::from_millis(6));
        pkg.tests = vec![
            Test {
                result: TestResult::Failed,
                elapsed: Some(Duration::from_millis(1)),
                ..Test::new("Test1", "github.com/foo/package")
            },
            Test {
                result: TestResult::Skipped,
                elapsed: Some(Duration::from_millis(2)),
                ..Test::new("Test2", "github.com/foo/package")
            },
            Test {
                result: TestResult::Passed,
                elapsed: Some(Duration::from_millis(3)),
                ..Test::new("Test3", "github.com/foo/package")
            },
        ];
        Run {
            elapsed: Some(Duration::from_millis(6)),
            packages: vec![pkg],
            num_tests: 3,
            num_passed: 1,
            num_failed: 1,
            num_skipped: 1,
            percent_passed: 33,
            ..Run::default()
        }
    }

    const SUMMARY: [&str; 22] = [
        "## 📕&nbsp;&nbsp;Test Report",
        "",
        "<table>",
        "  <tr>",
        "    <td><b>packages</b></td>",
        "    <td>1</td>",
        "    <td>6ms</td>",
        "    <td><b>tests</b></td>",
        "    <td align='right'>3</td>",
        "  </tr>",
        "  <tr>",
        "    <td colspan=3 align='right'>🔴</td>",
        "    <td>failed</td>",
        "    <td align='right'>1</td>",
        "  </tr>",
        "  <tr>",
        "    <td colspan=3 align='right'>🔕</td>",
        "    <td>skipped</td>",
        "    <td align='right'>1</td>",
        "  </tr>",
        "  <tr>",
        "    <td colspan=3 align='right'>📕</td>",
    ];

    // the trailing "" is what follows the final newline
    const CLOSING: [&str; 5] = ["", "<hr>", "", FOOTER, ""];

    fn expected(sections: &[&[&str]]) -> Vec<String> {
        sections
            .iter()
            .flat_map(|s| s.iter().map(|l| (*l).to_string()))
            .collect()
    }

    #[test]
    fn test_report_icon_thresholds() {
        let mut run = Run::default();
        for (from, to, want) in [
            (0, 84, icon::RED_BOOK),
            (85, 94, icon::ORANGE_BOOK),
            (95, 99, icon::YELLOW_BOOK),
            (100, 100, icon::GREEN_BOOK),
        ] {
            for pct in from..=to {
                run.percent_passed = pct;
                let report = MarkdownReport::new("t", ReportMode::SummaryOnly, &run);
                assert_eq!(report.report_icon(), want, "{pct}%");
            }
        }
    }

    #[test]
    fn test_report_icon_skipped_without_failures() {
        let run = Run {
            num_skipped: 1,
            ..Run::default()
        };
        let report = MarkdownReport::new("t", ReportMode::SummaryOnly, &run);
        assert_eq!(report.report_icon(), icon::YELLOW_BOOK);
    }

    #[test]
    fn test_summary_only_no_tests() {
        let run = Run::default();
        let report = MarkdownReport::new("Test Report", ReportMode::SummaryOnly, &run);

        assert_eq!(
            render(&report),
            expected(&[
                &[
                    "## 📕&nbsp;&nbsp;Test Report",
                    "",
                    "<table>",
                    "  <tr>",
                    "    <td><b>packages</b></td>",
                    "    <td>0</td>",
                    "    <td>0s</td>",
                    "    <td><b>tests</b></td>",
                    "    <td align='right'>0</td>",
                    "  </tr>",
                    "  <tr>",
                    "    <td colspan=3 align='right'>📕</td>",
                    "    <td>passed</td>",
                    "    <td align='right'>0%</td>",
                    "  </tr>",
                    "</table>",
                ],
                &CLOSING,
            ])
        );
    }

    #[test]
    fn test_summary_only() {
        let run = sample_run();
        let report = MarkdownReport::new("Test Report", ReportMode::SummaryOnly, &run);

        assert_eq!(
            render(&report),
            expected(&[
                &SUMMARY,
                &["    <td>passed</td>", "    <td align='right'>33%</td>", "  </tr>", "</table>"],
                &CLOSING,
            ])
        );
    }

    #[test]
    fn test_failed_tests_mode() {
        let run = sample_run();
        let report = MarkdownReport::new("Test Report", ReportMode::FailedTests, &run);

        assert_eq!(
            render(&report),
            expected(&[
                &SUMMARY,
                &["    <td>passed</td>", "    <td align='right'>33%</td>", "  </tr>", "</table>"],
                &[
                    "<table>",
                    "  <tr>",
                    "    <td>🔴</td>",
                    "    <td colspan='2'><b>github.com/foo/package</b></td>",
                    "    <td align='right'>6ms</td>",
                    "  </tr>",
                    "  <tr valign='top'>",
                    "    <td></td>",
                    "    <td>🔴</td>",
                    "    <td>",
                    "      <b>Test1</b>",
                    "    </td>",
                    "    <td align='right'>1ms</td>",
                    "  </tr>",
                    "  <tr>",
                    "    <td>🔕</td>",
                    "    <td colspan=3><b>1 test was skipped</b></td>",
                    "  </tr>",
                    "  <tr>",
                    "    <td>✅</td>",
                    "    <td colspan=3><b>1 test passed</b></td>",
                    "  </tr>",
                    "</table>",
                ],
                &CLOSING,
            ])
        );
    }

    #[test]
    fn test_all_tests_mode_lists_every_test() {
        let run = sample_run();
        let report = MarkdownReport::new("Test Report", ReportMode::AllTests, &run);

        let lines = render(&report);
        for name in ["Test1", "Test2", "Test3"] {
            assert!(
                lines.contains(&format!("      <b>{name}</b>")),
                "{name} should be listed"
            );
        }
        assert!(!lines.iter().any(|l| l.contains("tests passed")));
    }

    #[test]
    fn test_failed_tests_mode_omits_passing_packages() {
        let mut run = sample_run();
        run.packages.push(Package::new("github.com/foo/clean"));
        let report = MarkdownReport::new("Test Report", ReportMode::FailedTests, &run);

        let lines = render(&report);
        assert!(!lines.iter().any(|l| l.contains("github.com/foo/clean")));
    }

    #[test]
    fn test_write_output_single_line() {
        let output: OutputMap = [(
            "filename_test.go:12".to_string(),
            vec!["output".to_string()],
        )]
        .into_iter()
        .collect();

        let mut w = IndentWriter::new(Vec::new());
        write_output(&mut w, &output);
        let text = String::from_utf8(w.finish().expect("write")).expect("utf-8");

        assert_eq!(
            text,
            "<div><i>filename_test.go:12</i></div>\n<pre>output</pre>\n"
        );
    }

    #[test]
    fn test_write_output_multiple_locations() {
        let output: OutputMap = [
            (
                "filename_test.go:12".to_string(),
                vec![
                    "first output line 1".to_string(),
                    "  indented <b>".to_string(),
                ],
            ),
            ("filename_test.go:14".to_string(), vec!["second".to_string()]),
            (String::new(), vec!["stdout".to_string()]),
        ]
        .into_iter()
        .collect();

        let mut w = IndentWriter::new(Vec::new());
        w.indented(|w| write_output(w, &output));
        let text = String::from_utf8(w.finish().expect("write")).expect("utf-8");

        assert_eq!(
            text,
            [
                "  <pre>stdout</pre>",
                "  <div><i>filename_test.go:12</i></div>",
                "  <pre>first&nbsp;output&nbsp;line&nbsp;1",
                "&nbsp;&nbsp;indented&nbsp;&lt;b&gt;</pre>",
                "  <div><i>filename_test.go:14</i></div>",
                "  <pre>second</pre>",
                "",
            ]
            .join("\n")
        );
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("a < b && c > 'd'"), "a &lt; b &amp;&amp; c &gt; &#39;d&#39;");
        assert_eq!(escape_pre("a  b"), "a&nbsp;&nbsp;b");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::ZERO), "0s");
        assert_eq!(format_duration(Duration::from_micros(250)), "250µs");
        assert_eq!(format_duration(Duration::from_millis(6)), "6ms");
        assert_eq!(format_duration(Duration::from_millis(1000)), "1s");
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_millis(1234)), "1.234s");
        assert_eq!(format_duration(Duration::from_millis(60_000)), "1m0s");
        assert_eq!(format_duration(Duration::from_millis(123_050)), "2m3.05s");
    }
}
