// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pagescan: Core types, configuration and report aggregation shared across
// all crates.

pub mod config;
pub mod error;
pub mod human_errors;
pub mod range;
pub mod report;
pub mod types;

pub use config::ScanConfig;
pub use error::ScanError;
pub use range::{PageRange, RenderQuality, ResolvedRange};
pub use report::{DecodeReport, ReportBuilder, ReportIssue};
pub use types::*;
