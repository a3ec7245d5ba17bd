// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Indentation-aware text output
//!
//! [`IndentWriter`] wraps an [`io::Write`] and indents nested sections by two
//! spaces. The first I/O error is latched: later writes are dropped and the
//! error is returned from [`IndentWriter::finish`], so rendering code can
//! write freely without threading `?` through every line.

use std::io::{self, Write};

/// Indentation added per nesting level
const INDENT_STEP: &str = "  ";

/// Line-oriented writer with nested indentation and a latched error
pub struct IndentWriter<W: Write> {
    inner: W,
    indent: String,
    error: Option<io::Error>,
}

impl<W: Write> IndentWriter<W> {
    /// Wrap `inner` with no indentation
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            indent: String::new(),
            error: None,
        }
    }

    /// Write `text` followed by a newline, indenting every line in `text`
    ///
    /// Empty lines are written without indentation.
    pub fn line(&mut self, text: &str) {
        for line in text.split('\n') {
            if line.is_empty() {
                self.write_str("\n");
            } else {
                let indented = format!("{}{line}\n", self.indent);
                self.write_str(&indented);
            }
        }
    }

    /// Write an empty line
    pub fn blank(&mut self) {
        self.write_str("\n");
    }

    /// Write `text` and a newline with no indentation
    ///
    /// Used for the continuation lines of `<pre>` blocks, where leading
    /// whitespace would become part of the content.
    pub fn raw_line(&mut self, text: &str) {
        self.write_str(text);
        self.write_str("\n");
    }

    /// Run `f` with the indentation increased by one level
    pub fn indented(&mut self, f: impl FnOnce(&mut Self)) {
        let depth = self.indent.len();
        self.indent.push_str(INDENT_STEP);
        f(self);
        self.indent.truncate(depth);
    }

    /// Write `open`, the indented body produced by `f`, then `close`
    pub fn element(&mut self, open: &str, close: &str, f: impl FnOnce(&mut Self)) {
        self.line(open);
        self.indented(f);
        self.line(close);
    }

    /// Whether a write has failed
    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.error.is_some()
    }

    /// Flush and return the inner writer, or the first error encountered
    ///
    /// # Errors
    ///
    /// Returns the first I/O error from any earlier write, or from the flush.
    pub fn finish(mut self) -> io::Result<W> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        self.inner.flush()?;
        Ok(self.inner)
    }

    fn write_str(&mut self, s: &str) {
        if self.error.is_some() {
            return;
        }
        if let Err(err) = self.inner.write_all(s.as_bytes()) {
            self.error = Some(err);
        }
    }
}
