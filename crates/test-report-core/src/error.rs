// Copyright (c) 2026 - present Nicholas D. Crosbie
// SPDX-License-Identifier: MIT

//! Error types for test-report-core

use thiserror::Error;

/// Errors that can occur while parsing a test event stream
#[derive(Debug, Error)]
pub enum ParseError {
    /// Error decoding a single JSON event
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// An event referenced a package that was never started
    #[error("event references unknown package '{package}'")]
    UnknownPackage {
        /// Name of the package carried by the event
        package: String,
    },

    /// An event referenced a test that was never run
    #[error("event references unknown test '{test}' in package '{package}'")]
    UnknownTest {
        /// Name of the package carried by the event
        package: String,
        /// Name of the test carried by the event
        test: String,
    },
}

impl ParseError {
    /// Whether the error is an unknown package or test reference
    #[must_use]
    pub fn is_unknown_reference(&self) -> bool {
        matches!(self, Self::UnknownPackage { .. } | Self::UnknownTest { .. })
    }
}
