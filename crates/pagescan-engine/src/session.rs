// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document-level decode session.
//
// Renders the selected pages in one blocking stage (the document handle is
// opened and released inside it), then decodes the pages strictly one after
// another and folds each page result into the report.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use pagescan_core::config::ScanConfig;
use pagescan_core::error::{Result, ScanError};
use pagescan_core::report::{DecodeReport, ReportBuilder};
use pagescan_core::types::{PageState, RunId};
use pagescan_document::{DocumentSource, RasterPage, render_document};
use tracing::{debug, info, instrument};

use crate::decoder::Decoder;
use crate::orchestrator::PageDecodeOrchestrator;

/// Drives whole documents through rendering and decoding.
#[derive(Clone)]
pub struct DecodeSession {
    source: Arc<dyn DocumentSource>,
    decoder: Arc<dyn Decoder>,
}

impl DecodeSession {
    pub fn new(source: Arc<dyn DocumentSource>, decoder: Arc<dyn Decoder>) -> Self {
        Self { source, decoder }
    }

    /// Decode every selected page of `path` and return the report.
    ///
    /// Only a document that cannot be opened or a page that cannot be
    /// rendered is an `Err`. Empty render output, page timeouts and an empty
    /// result set all produce a failed report instead. The config is used as
    /// given; a zero page timeout times every page with enabled codecs out.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn decode(&self, path: impl AsRef<Path>, config: &ScanConfig) -> Result<DecodeReport> {
        let started = Instant::now();
        let path = path.as_ref();
        let run_id = RunId::new();
        let mut report = ReportBuilder::new(run_id, path);
        info!(
            %run_id,
            families = ?config.codecs.enabled_families(),
            page_timeout_ms = config.page_timeout_ms,
            "decode run started"
        );

        debug!(state = ?PageState::Rendering, "rendering selected pages");
        let pages = self.render(path, config).await?;

        if pages.is_empty() {
            report.empty_render_output();
        } else {
            let orchestrator = PageDecodeOrchestrator::from_config(Arc::clone(&self.decoder), config);
            for page in pages {
                let result = orchestrator.decode_page(&page).await;
                report.record_page(result);
            }
        }

        let report = report.finish(started.elapsed());
        info!(
            %run_id,
            success = report.success,
            pages = report.pages.len(),
            codes = report.code_count(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "decode run finished"
        );
        Ok(report)
    }

    /// Blocking variant of [`decode`](Self::decode) for callers without a
    /// runtime. Must not be called from inside an async context.
    ///
    /// Codec tasks left running past a page deadline are not waited for;
    /// the call returns as soon as the report is built.
    pub fn decode_blocking(&self, path: impl AsRef<Path>, config: &ScanConfig) -> Result<DecodeReport> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        let report = runtime.block_on(self.decode(path, config));
        runtime.shutdown_background();
        report
    }

    async fn render(&self, path: &Path, config: &ScanConfig) -> Result<Vec<RasterPage>> {
        let source = Arc::clone(&self.source);
        let path: PathBuf = path.to_path_buf();
        let range = config.page_range;
        let quality = config.quality;

        tokio::task::spawn_blocking(move || render_document(source.as_ref(), &path, &range, quality))
            .await
            .map_err(|err| ScanError::Task(format!("render stage: {err}")))?
    }
}
