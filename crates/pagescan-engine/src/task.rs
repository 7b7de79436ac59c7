// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// One codec family on one page.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::DynamicImage;
use pagescan_core::types::CodecFamily;
use tracing::{debug, warn};

use crate::decoder::{CancelToken, CodecRequest, Decoder};
use crate::sink::ResultSink;

/// A single bounded decode attempt, run on a blocking worker thread.
#[derive(Debug, Clone)]
pub struct CodecTask {
    pub page: u32,
    pub family: CodecFamily,
    pub timeout: Duration,
    image: Arc<DynamicImage>,
}

impl CodecTask {
    pub fn new(page: u32, family: CodecFamily, timeout: Duration, image: Arc<DynamicImage>) -> Self {
        Self {
            page,
            family,
            timeout,
            image,
        }
    }

    /// Run the decoder and append its codes to `sink`.
    ///
    /// Decoder errors count as "nothing found". Results beyond the family cap
    /// are cut off. Returns how many codes were accepted by the sink.
    pub fn run(self, decoder: &dyn Decoder, sink: &ResultSink, cancel: CancelToken) -> usize {
        let request = CodecRequest {
            family: self.family,
            timeout: self.timeout,
            max_results: self.family.max_results(),
            cancel,
        };

        let started = Instant::now();
        let mut codes = match decoder.decode(&self.image, &request) {
            Ok(codes) => codes,
            Err(err) => {
                warn!(page = self.page, family = %self.family, %err, "decoder failed");
                Vec::new()
            }
        };
        codes.truncate(request.max_results);

        let found = codes.len();
        let accepted = sink.append(self.family, codes);
        debug!(
            page = self.page,
            family = %self.family,
            found,
            accepted,
            cancelled = request.cancel.is_cancelled(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "codec task finished"
        );

        if accepted { found } else { 0 }
    }
}
