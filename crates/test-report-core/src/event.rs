// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Go test event decoding
//!
//! `go test -json` writes one JSON object per line describing a change in the
//! state of the test run. This module decodes that stream lazily into
//! [`Event`] values.
//!
//! # Example
//!
//! ```
//! use test_report_core::event::{Action, Events};
//!
//! let input = r#"{"Action":"start","Package":"example.com/pkg"}
//! {"Action":"run","Package":"example.com/pkg","Test":"TestOne"}
//! "#;
//!
//! let actions: Vec<Action> = Events::new(input.as_bytes()).map(|e| e.action).collect();
//! assert_eq!(actions, vec![Action::Start, Action::Run]);
//! ```

use std::fmt;
use std::io::{BufReader, Read};
use std::iter::FusedIterator;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::de::IoRead;
use serde_json::error::Category;
use serde_json::{Deserializer, StreamDeserializer};
use tracing::{debug, warn};

use crate::error::ParseError;

// ============================================================================
// Event Types
// ============================================================================

/// The kind of state change an event describes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// A package has started running
    Start,
    /// A test has started running
    Run,
    /// Output was printed by a test or package
    Output,
    /// A test or package passed
    Pass,
    /// A test or package failed
    Fail,
    /// A test or package was skipped
    Skip,
    /// Any action not listed above (pause, cont, bench, build-output, ...)
    #[default]
    #[serde(other)]
    Other,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Start => "start",
            Self::Run => "run",
            Self::Output => "output",
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Skip => "skip",
            Self::Other => "other",
        };
        f.write_str(s)
    }
}

/// A single record from a `go test -json` stream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Event {
    /// Time the event was emitted (RFC 3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// What happened
    #[serde(default)]
    pub action: Action,
    /// Package the event concerns
    #[serde(default)]
    pub package: String,
    /// Test the event concerns; absent for package-level events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
    /// Elapsed seconds, reported with terminal events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<f64>,
    /// Raw output text, including its line terminator
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl Event {
    /// Elapsed time as a duration rounded to the nearest millisecond
    #[must_use]
    pub fn elapsed_duration(&self) -> Option<Duration> {
        self.elapsed.map(seconds_to_duration)
    }

    /// Parse the event timestamp
    ///
    /// Returns `None` when the event has no timestamp or it is not valid RFC 3339.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTime<FixedOffset>> {
        self.time
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
    }

    /// Whether the event concerns a package as a whole rather than a test
    #[must_use]
    pub fn is_package_event(&self) -> bool {
        self.test.is_none()
    }
}

/// Convert fractional seconds into a duration with millisecond precision
///
/// Negative and non-finite values convert to zero.
#[must_use]
pub fn seconds_to_duration(secs: f64) -> Duration {
    if !secs.is_finite() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::from_millis((secs * 1000.0).round() as u64)
}

/// Parse a single JSON event
///
/// # Errors
///
/// Returns `ParseError::Json` if the JSON is invalid or is not an event object.
pub fn parse_event(json: &str) -> Result<Event, ParseError> {
    serde_json::from_str(json).map_err(ParseError::from)
}

// ============================================================================
// Streaming Decoder
// ============================================================================

/// Why an event stream stopped producing events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEnd {
    /// Input ended cleanly after a complete event
    Exhausted,
    /// Input ended part way through an event
    Truncated,
    /// Input contained something that is not an event object
    Malformed(String),
    /// Reading the input failed
    Io(String),
}

impl DecodeEnd {
    /// Whether the stream ended at a clean event boundary
    #[must_use]
    pub fn is_clean(&self) -> bool {
        matches!(self, Self::Exhausted)
    }

    fn from_error(err: &serde_json::Error) -> Self {
        match err.classify() {
            Category::Eof => Self::Truncated,
            Category::Io => Self::Io(err.to_string()),
            Category::Syntax | Category::Data => Self::Malformed(err.to_string()),
        }
    }
}

impl fmt::Display for DecodeEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exhausted => f.write_str("end of input"),
            Self::Truncated => f.write_str("truncated event"),
            Self::Malformed(msg) => write!(f, "malformed event: {msg}"),
            Self::Io(msg) => write!(f, "read error: {msg}"),
        }
    }
}

/// Lazy iterator over the events in a byte stream
///
/// The iterator ends at the first record that cannot be decoded, whatever the
/// reason; it never yields an error. The reason is available from
/// [`Events::end`] once iteration has finished.
pub struct Events<R: Read> {
    inner: StreamDeserializer<'static, IoRead<BufReader<R>>, Event>,
    decoded: usize,
    end: Option<DecodeEnd>,
}

impl<R: Read> Events<R> {
    /// Create a decoder reading from `reader`
    pub fn new(reader: R) -> Self {
        Self {
            inner: Deserializer::from_reader(BufReader::new(reader)).into_iter::<Event>(),
            decoded: 0,
            end: None,
        }
    }

    /// Number of events decoded so far
    #[must_use]
    pub fn decoded(&self) -> usize {
        self.decoded
    }

    /// Why decoding stopped, or `None` while events may still follow
    #[must_use]
    pub fn end(&self) -> Option<&DecodeEnd> {
        self.end.as_ref()
    }
}

impl<R: Read> Iterator for Events<R> {
    type Item = Event;

    fn next(&mut self) -> Option<Event> {
        if self.end.is_some() {
            return None;
        }

        match self.inner.next() {
            Some(Ok(event)) => {
                self.decoded += 1;
                Some(event)
            }
            Some(Err(err)) => {
                let end = DecodeEnd::from_error(&err);
                warn!(
                    decoded = self.decoded,
                    offset = self.inner.byte_offset(),
                    reason = ?end,
                    "event stream ended early"
                );
                self.end = Some(end);
                None
            }
            None => {
                debug!(decoded = self.decoded, "event stream exhausted");
                self.end = Some(DecodeEnd::Exhausted);
                None
            }
        }
    }
}

impl<R: Read> FusedIterator for Events<R> {}
