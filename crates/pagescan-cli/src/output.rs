// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-text rendering of a decode report.

use std::fmt::Write;

use pagescan_core::report::DecodeReport;

/// One line per page (`page N: code, code`), then a status line and any
/// issue lines.
pub fn format_report(report: &DecodeReport) -> String {
    let mut out = String::new();
    for (page, codes) in &report.pages {
        let marker = if report.incomplete_pages.contains(page) {
            " (timed out)"
        } else {
            ""
        };
        let codes = if codes.is_empty() {
            "-".to_string()
        } else {
            codes.join(", ")
        };
        let _ = writeln!(out, "page {page}{marker}: {codes}");
    }

    let status = if report.success { "ok" } else { "failed" };
    let _ = writeln!(
        out,
        "{status}: {} code(s) on {} page(s) in {} ms",
        report.code_count(),
        report.pages.len(),
        report.elapsed.as_millis()
    );
    out.push_str(&report.error_message);
    out
}
