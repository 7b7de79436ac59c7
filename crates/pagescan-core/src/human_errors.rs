// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for hard failures.
//
// Every error that aborts a run is mapped to plain language with a
// suggestion. Recoverable per-page problems are already phrased this way by
// `ReportIssue::message`.

use crate::error::ScanError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Worth trying again as-is (busy machine, interrupted I/O).
    Transient,
    /// The operator must change something (file, settings, build features).
    ActionRequired,
    /// Retrying or reconfiguring will not help.
    Permanent,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    pub message: String,
    pub suggestion: String,
    pub severity: Severity,
}

impl std::fmt::Display for HumanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.message, self.suggestion)
    }
}

/// Convert a `ScanError` into a `HumanError`.
pub fn humanize_error(err: &ScanError) -> HumanError {
    match err {
        ScanError::Open(detail) => HumanError {
            message: "The document could not be opened.".into(),
            suggestion: format!("Check that the file exists and is a readable PDF. ({detail})"),
            severity: Severity::ActionRequired,
        },

        ScanError::Render { page, detail } => HumanError {
            message: format!("Page {page} could not be turned into an image."),
            suggestion: format!(
                "The document may be damaged; try a lower render quality or a different page range. ({detail})"
            ),
            severity: Severity::Permanent,
        },

        ScanError::BackendUnavailable(detail) => HumanError {
            message: "No PDF renderer is built into this program.".into(),
            suggestion: format!("Rebuild with the `mupdf` feature enabled. ({detail})"),
            severity: Severity::ActionRequired,
        },

        ScanError::Image(detail) | ScanError::Export(detail) => HumanError {
            message: "Page images could not be written.".into(),
            suggestion: format!("Check the output folder and image format. ({detail})"),
            severity: Severity::ActionRequired,
        },

        ScanError::Decoder(detail) => HumanError {
            message: "The code reader failed.".into(),
            suggestion: format!("Check the decoder tool settings. ({detail})"),
            severity: Severity::ActionRequired,
        },

        ScanError::Task(detail) => HumanError {
            message: "A background job stopped unexpectedly.".into(),
            suggestion: format!("Try again; if it keeps happening, report it. ({detail})"),
            severity: Severity::Transient,
        },

        ScanError::Config(detail) => HumanError {
            message: "The settings are not valid.".into(),
            suggestion: format!("Fix the configuration file and try again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        ScanError::Io(io_err) => match io_err.kind() {
            std::io::ErrorKind::NotFound => HumanError {
                message: "A file could not be found.".into(),
                suggestion: format!("Check the path and try again. ({io_err})"),
                severity: Severity::ActionRequired,
            },
            std::io::ErrorKind::PermissionDenied => HumanError {
                message: "Permission denied.".into(),
                suggestion: format!("Check file and folder permissions. ({io_err})"),
                severity: Severity::ActionRequired,
            },
            _ => HumanError {
                message: "Reading or writing a file failed.".into(),
                suggestion: format!("Try again. ({io_err})"),
                severity: Severity::Transient,
            },
        },

        ScanError::Serialization(detail) => HumanError {
            message: "A settings or report file is malformed.".into(),
            suggestion: format!("Check that the file is valid JSON. ({detail})"),
            severity: Severity::Permanent,
        },
    }
}
