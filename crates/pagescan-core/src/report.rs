// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decode report and its aggregation rules.
//
// Per-page failures never abort a run. They are recorded as issues while the
// builder accumulates pages, and the final status is decided once, when the
// report is finished.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::types::{PageResult, RunId};

/// A recoverable problem recorded while building a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportIssue {
    /// Rendering produced no page images at all.
    EmptyRenderOutput,
    /// The page deadline elapsed before every enabled codec finished.
    PageTimeout { page: u32 },
    /// Every page finished but no code was found anywhere in the document.
    EmptyDecodeOutput,
}

impl ReportIssue {
    /// Plain-language line with a suggestion, as shown to the user.
    pub fn message(&self) -> String {
        match self {
            Self::EmptyRenderOutput => {
                "The document produced no page images; check that it has pages.".into()
            }
            Self::PageTimeout { page } => {
                format!("Decoding page {page} timed out; try increasing the page timeout.")
            }
            Self::EmptyDecodeOutput => {
                "No codes were found in the document; try raising the render quality.".into()
            }
        }
    }
}

impl std::fmt::Display for ReportIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message())
    }
}

/// Final result of one decode run. Built once by [`ReportBuilder::finish`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeReport {
    pub run_id: RunId,
    /// Document the run was started for.
    pub source: PathBuf,
    pub started_at: DateTime<Utc>,
    pub success: bool,
    /// Wall-clock duration of the whole run.
    pub elapsed: Duration,
    /// Codes per 1-based page index, in ascending page order.
    pub pages: BTreeMap<u32, Vec<String>>,
    /// Pages whose deadline elapsed; their codes may be partial.
    pub incomplete_pages: Vec<u32>,
    pub issues: Vec<ReportIssue>,
    /// One line per issue, each newline-terminated. Empty on success.
    pub error_message: String,
}

impl DecodeReport {
    /// Total number of codes across every page.
    pub fn code_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    /// Codes for one page, if that page was part of the run.
    pub fn codes_for(&self, page: u32) -> Option<&[String]> {
        self.pages.get(&page).map(Vec::as_slice)
    }
}

/// Accumulates page results and issues for one run.
pub struct ReportBuilder {
    run_id: RunId,
    source: PathBuf,
    started_at: DateTime<Utc>,
    pages: BTreeMap<u32, Vec<String>>,
    incomplete_pages: Vec<u32>,
    issues: Vec<ReportIssue>,
    code_count: usize,
    rendered_any: bool,
}

impl ReportBuilder {
    pub fn new(run_id: RunId, source: impl Into<PathBuf>) -> Self {
        Self {
            run_id,
            source: source.into(),
            started_at: Utc::now(),
            pages: BTreeMap::new(),
            incomplete_pages: Vec::new(),
            issues: Vec::new(),
            code_count: 0,
            rendered_any: false,
        }
    }

    /// Note that rendering returned no pages. The finished report fails
    /// without a page map.
    pub fn empty_render_output(&mut self) {
        warn!(run_id = %self.run_id, "render output is empty");
        self.issues.push(ReportIssue::EmptyRenderOutput);
    }

    /// Record one page. A page that missed its deadline keeps its partial
    /// codes and adds a timeout issue naming the page.
    pub fn record_page(&mut self, result: PageResult) {
        self.rendered_any = true;
        self.code_count += result.codes.len();

        if !result.completed {
            warn!(
                run_id = %self.run_id,
                page = result.page_index,
                partial_codes = result.codes.len(),
                "page decode timed out"
            );
            self.incomplete_pages.push(result.page_index);
            self.issues.push(ReportIssue::PageTimeout {
                page: result.page_index,
            });
        } else {
            debug!(
                run_id = %self.run_id,
                page = result.page_index,
                codes = result.codes.len(),
                "page recorded"
            );
        }

        self.pages.insert(result.page_index, result.codes);
    }

    /// Decide the final status and freeze the report.
    pub fn finish(mut self, elapsed: Duration) -> DecodeReport {
        if self.rendered_any && self.code_count == 0 {
            self.issues.push(ReportIssue::EmptyDecodeOutput);
        }

        let success = self.rendered_any && self.issues.is_empty();
        let error_message: String = self
            .issues
            .iter()
            .map(|issue| format!("{}\n", issue.message()))
            .collect();

        DecodeReport {
            run_id: self.run_id,
            source: self.source,
            started_at: self.started_at,
            success,
            elapsed,
            pages: self.pages,
            incomplete_pages: self.incomplete_pages,
            issues: self.issues,
            error_message,
        }
    }
}
