// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Pagescan.

use thiserror::Error;

/// Top-level error type for all Pagescan operations.
///
/// Only document-level failures travel through this type. Per-page problems
/// (timeouts, empty results) are collected as [`crate::ReportIssue`]s instead.
#[derive(Debug, Error)]
pub enum ScanError {
    // -- Document errors --
    #[error("failed to open document: {0}")]
    Open(String),

    #[error("failed to render page {page}: {detail}")]
    Render { page: u32, detail: String },

    #[error("no rendering backend available: {0}")]
    BackendUnavailable(String),

    #[error("image processing failed: {0}")]
    Image(String),

    #[error("page export failed: {0}")]
    Export(String),

    // -- Decode errors --
    #[error("decoder failed: {0}")]
    Decoder(String),

    #[error("background task failed: {0}")]
    Task(String),

    // -- Configuration / persistence --
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScanError>;
