// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Pagescan decode pipeline.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for one decode run, used to correlate log lines with the
/// report handed back to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The recognised code families. Each runs as its own task on every page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodecFamily {
    /// Linear barcodes (Code 128, Code 39, Code 93, UPC/EAN).
    OneD,
    /// Data Matrix 2-D codes.
    DataMatrix,
    /// QR codes.
    QrCode,
}

impl CodecFamily {
    /// Every family, in scheduling order.
    pub const ALL: [CodecFamily; 3] = [Self::OneD, Self::DataMatrix, Self::QrCode];

    /// Maximum number of codes a single page may yield for this family.
    pub fn max_results(&self) -> usize {
        match self {
            Self::OneD => 15,
            Self::DataMatrix => 3,
            Self::QrCode => 3,
        }
    }

    /// Short label for logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            Self::OneD => "1d",
            Self::DataMatrix => "datamatrix",
            Self::QrCode => "qr",
        }
    }
}

impl std::fmt::Display for CodecFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Enable flag and time budget for one codec family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecSettings {
    pub enabled: bool,
    /// Time the decoder may spend on one page, in milliseconds.
    pub timeout_ms: u64,
}

impl CodecSettings {
    pub fn enabled(timeout_ms: u64) -> Self {
        Self {
            enabled: true,
            timeout_ms,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            timeout_ms: 0,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self::enabled(300)
    }
}

/// Per-family codec configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CodecConfig {
    pub one_d: CodecSettings,
    pub data_matrix: CodecSettings,
    pub qr_code: CodecSettings,
}

impl CodecConfig {
    /// Configuration with every family switched off.
    pub fn none() -> Self {
        Self {
            one_d: CodecSettings::disabled(),
            data_matrix: CodecSettings::disabled(),
            qr_code: CodecSettings::disabled(),
        }
    }

    pub fn get(&self, family: CodecFamily) -> CodecSettings {
        match family {
            CodecFamily::OneD => self.one_d,
            CodecFamily::DataMatrix => self.data_matrix,
            CodecFamily::QrCode => self.qr_code,
        }
    }

    pub fn set(&mut self, family: CodecFamily, settings: CodecSettings) {
        match family {
            CodecFamily::OneD => self.one_d = settings,
            CodecFamily::DataMatrix => self.data_matrix = settings,
            CodecFamily::QrCode => self.qr_code = settings,
        }
    }

    /// Families that will get a task on each page, in scheduling order.
    pub fn enabled_families(&self) -> Vec<CodecFamily> {
        CodecFamily::ALL
            .into_iter()
            .filter(|family| self.get(*family).enabled)
            .collect()
    }
}

/// What happens to codec tasks that are still running when the page deadline
/// elapses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrunPolicy {
    /// Signal cancellation to the decoder so abandoned work stops early.
    #[default]
    Cancel,
    /// Leave the task running until its own timeout. Its late results are
    /// still discarded.
    Detach,
}

/// Lifecycle of one page through the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageState {
    Pending,
    Rendering,
    Decoding,
    /// Every enabled codec task finished before the page deadline.
    Completed,
    /// The page deadline elapsed first.
    TimedOut,
}

impl PageState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::TimedOut)
    }
}

/// Outcome of decoding one page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-based page number within the document.
    pub page_index: u32,
    /// Codes merged before the orchestrator returned. No ordering is
    /// guaranteed between families.
    pub codes: Vec<String>,
    /// `false` when the page deadline elapsed before all tasks finished.
    pub completed: bool,
}

impl PageResult {
    pub fn state(&self) -> PageState {
        if self.completed {
            PageState::Completed
        } else {
            PageState::TimedOut
        }
    }
}
