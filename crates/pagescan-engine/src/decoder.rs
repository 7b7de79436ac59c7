// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Decode capability consumed by the engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use image::DynamicImage;
use pagescan_core::error::Result;
use pagescan_core::types::CodecFamily;

/// Shared flag telling a decoder its result is no longer wanted.
///
/// Cloning yields a handle to the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One bounded recognition attempt for one codec family on one page.
#[derive(Debug, Clone)]
pub struct CodecRequest {
    pub family: CodecFamily,
    /// The decoder must return within this budget, empty-handed if need be.
    pub timeout: Duration,
    /// Upper bound on the number of codes to report.
    pub max_results: usize,
    /// Fired when the page deadline passes before this attempt finished.
    pub cancel: CancelToken,
}

/// Recognises codes of one family in a raster image.
///
/// Called from blocking worker threads, at most once per enabled family per
/// page, all against the same image. Implementations must return within
/// `request.timeout`; they should also check `request.cancel` and give up
/// early once it fires. A timeout is reported as an empty result, not an
/// error.
pub trait Decoder: Send + Sync {
    fn decode(&self, image: &DynamicImage, request: &CodecRequest) -> Result<Vec<String>>;
}

impl<F> Decoder for F
where
    F: Fn(&DynamicImage, &CodecRequest) -> Result<Vec<String>> + Send + Sync,
{
    fn decode(&self, image: &DynamicImage, request: &CodecRequest) -> Result<Vec<String>> {
        self(image, request)
    }
}
