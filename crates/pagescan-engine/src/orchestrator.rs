// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-page decode orchestration.
//
// Every enabled codec family gets its own blocking task. The tasks are joined
// under the page deadline: the call returns as soon as all of them finish, or
// when the deadline passes, whichever is first. Whatever the sink holds at
// that moment is the page result.

use std::sync::Arc;
use std::time::Duration;

use pagescan_core::config::ScanConfig;
use pagescan_core::types::{CodecConfig, OverrunPolicy, PageResult, PageState};
use pagescan_document::RasterPage;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::decoder::{CancelToken, Decoder};
use crate::sink::ResultSink;
use crate::task::CodecTask;

/// Runs the enabled codec families concurrently on one page at a time.
#[derive(Clone)]
pub struct PageDecodeOrchestrator {
    decoder: Arc<dyn Decoder>,
    codecs: CodecConfig,
    page_timeout: Duration,
    overrun: OverrunPolicy,
}

impl PageDecodeOrchestrator {
    pub fn new(decoder: Arc<dyn Decoder>, codecs: CodecConfig, page_timeout: Duration) -> Self {
        Self {
            decoder,
            codecs,
            page_timeout,
            overrun: OverrunPolicy::default(),
        }
    }

    pub fn from_config(decoder: Arc<dyn Decoder>, config: &ScanConfig) -> Self {
        Self::new(decoder, config.codecs, config.page_timeout())
            .with_overrun_policy(config.overrun_policy)
    }

    pub fn with_overrun_policy(mut self, overrun: OverrunPolicy) -> Self {
        self.overrun = overrun;
        self
    }

    pub fn page_timeout(&self) -> Duration {
        self.page_timeout
    }

    /// Decode one page under the page deadline.
    ///
    /// `completed` is `false` when the deadline passed first; `codes` then
    /// holds what had been merged by that moment and never changes later.
    /// With no family enabled the page completes immediately and empty.
    #[instrument(skip_all, fields(page = page.index))]
    pub async fn decode_page(&self, page: &RasterPage) -> PageResult {
        let deadline = Instant::now() + self.page_timeout;
        let sink = ResultSink::new();
        let cancel = CancelToken::new();
        let mut tasks = JoinSet::new();

        for family in self.codecs.enabled_families() {
            let task = CodecTask::new(
                page.index,
                family,
                self.codecs.get(family).timeout(),
                Arc::clone(&page.image),
            );
            let decoder = Arc::clone(&self.decoder);
            let sink = sink.clone();
            let cancel = cancel.clone();
            tasks.spawn_blocking(move || task.run(decoder.as_ref(), &sink, cancel));
        }
        debug!(state = ?PageState::Decoding, tasks = tasks.len(), "codec tasks started");

        let joined = tokio::time::timeout_at(deadline, async {
            while let Some(outcome) = tasks.join_next().await {
                if let Err(err) = outcome {
                    warn!(%err, "codec task did not finish cleanly");
                }
            }
        })
        .await;
        let completed = joined.is_ok();

        // Taken before anything else so stragglers cannot add to it.
        let codes = sink.seal();

        if completed {
            debug!(state = ?PageState::Completed, codes = codes.len(), "page decoded");
        } else {
            let pending = tasks.len();
            if self.overrun == OverrunPolicy::Cancel {
                cancel.cancel();
            }
            tasks.detach_all();
            info!(
                state = ?PageState::TimedOut,
                pending,
                partial_codes = codes.len(),
                policy = ?self.overrun,
                timeout_ms = self.page_timeout.as_millis() as u64,
                "page deadline elapsed"
            );
        }

        PageResult {
            page_index: page.index,
            codes,
            completed,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Instant as StdInstant;

    use image::DynamicImage;
    use pagescan_core::error::Result;
    use pagescan_core::types::{CodecFamily, CodecSettings};

    use super::*;
    use crate::decoder::CodecRequest;

    fn page(index: u32) -> RasterPage {
        RasterPage::new(index, DynamicImage::new_luma8(8, 8))
    }

    fn all_enabled(timeout_ms: u64) -> CodecConfig {
        let mut codecs = CodecConfig::none();
        for family in CodecFamily::ALL {
            codecs.set(family, CodecSettings::enabled(timeout_ms));
        }
        codecs
    }

    /// Sleeps for a per-family delay, waking early on cancellation, then
    /// reports one code per family.
    struct DelayedDecoder {
        delays: [(CodecFamily, Duration); 3],
        observed_cancel: Mutex<Vec<CodecFamily>>,
    }

    impl DelayedDecoder {
        fn new(one_d: u64, data_matrix: u64, qr: u64) -> Self {
            Self {
                delays: [
                    (CodecFamily::OneD, Duration::from_millis(one_d)),
                    (CodecFamily::DataMatrix, Duration::from_millis(data_matrix)),
                    (CodecFamily::QrCode, Duration::from_millis(qr)),
                ],
                observed_cancel: Mutex::new(Vec::new()),
            }
        }
    }

    impl Decoder for DelayedDecoder {
        fn decode(&self, _image: &DynamicImage, request: &CodecRequest) -> Result<Vec<String>> {
            let delay = self
                .delays
                .iter()
                .find(|(family, _)| *family == request.family)
                .map(|(_, delay)| *delay)
                .unwrap_or_default();
            let started = StdInstant::now();
            while started.elapsed() < delay {
                if request.cancel.is_cancelled() {
                    self.observed_cancel.lock().unwrap().push(request.family);
                    return Ok(Vec::new());
                }
                std::thread::sleep(Duration::from_millis(2));
            }
            Ok(vec![format!("{}-code", request.family)])
        }
    }

    #[tokio::test]
    async fn all_families_finish_before_deadline() {
        let decoder = Arc::new(DelayedDecoder::new(5, 10, 15));
        let orchestrator =
            PageDecodeOrchestrator::new(decoder, all_enabled(500), Duration::from_secs(5));

        let result = orchestrator.decode_page(&page(2)).await;

        assert!(result.completed);
        assert_eq!(result.page_index, 2);
        let mut codes = result.codes.clone();
        codes.sort();
        assert_eq!(codes, vec!["1d-code", "datamatrix-code", "qr-code"]);
    }

    #[tokio::test]
    async fn returns_early_when_tasks_finish() {
        let decoder = Arc::new(DelayedDecoder::new(1, 1, 1));
        let orchestrator =
            PageDecodeOrchestrator::new(decoder, all_enabled(500), Duration::from_secs(10));

        let started = StdInstant::now();
        let result = orchestrator.decode_page(&page(1)).await;

        assert!(result.completed);
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[tokio::test]
    async fn no_enabled_family_completes_empty() {
        let decoder = Arc::new(DelayedDecoder::new(0, 0, 0));
        let orchestrator =
            PageDecodeOrchestrator::new(decoder, CodecConfig::none(), Duration::from_millis(50));

        let result = orchestrator.decode_page(&page(1)).await;

        assert!(result.completed);
        assert!(result.codes.is_empty());
    }

    #[tokio::test]
    async fn deadline_returns_partial_codes_and_cancels() {
        let decoder = Arc::new(DelayedDecoder::new(5, 5_000, 5_000));
        let orchestrator = PageDecodeOrchestrator::new(
            Arc::clone(&decoder) as Arc<dyn Decoder>,
            all_enabled(10_000),
            Duration::from_millis(300),
        );

        let started = StdInstant::now();
        let result = orchestrator.decode_page(&page(3)).await;

        assert!(!result.completed);
        assert_eq!(result.codes, vec!["1d-code"]);
        assert!(started.elapsed() < Duration::from_secs(4));

        // Give the slow tasks a moment to notice the cancellation.
        tokio::time::sleep(Duration::from_millis(200)).await;
        let mut cancelled = decoder.observed_cancel.lock().unwrap().clone();
        cancelled.sort();
        assert_eq!(cancelled, vec![CodecFamily::DataMatrix, CodecFamily::QrCode]);
    }

    #[tokio::test]
    async fn detached_tasks_cannot_change_returned_codes() {
        let decoder = Arc::new(DelayedDecoder::new(5, 400, 5));
        let orchestrator = PageDecodeOrchestrator::new(
            Arc::clone(&decoder) as Arc<dyn Decoder>,
            all_enabled(10_000),
            Duration::from_millis(150),
        )
        .with_overrun_policy(OverrunPolicy::Detach);

        let result = orchestrator.decode_page(&page(1)).await;
        assert!(!result.completed);
        let before = result.codes.clone();

        // Let the detached Data Matrix task run to completion.
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(result.codes, before);
        assert!(!result.codes.contains(&"datamatrix-code".to_string()));
        assert!(decoder.observed_cancel.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn panicking_decoder_counts_as_finished() {
        let decoder = |_: &DynamicImage, request: &CodecRequest| -> Result<Vec<String>> {
            if request.family == CodecFamily::QrCode {
                panic!("decoder bug");
            }
            Ok(vec![request.family.to_string()])
        };
        let orchestrator =
            PageDecodeOrchestrator::new(Arc::new(decoder), all_enabled(100), Duration::from_secs(2));

        let result = orchestrator.decode_page(&page(1)).await;

        assert!(result.completed);
        assert_eq!(result.codes.len(), 2);
    }
}
