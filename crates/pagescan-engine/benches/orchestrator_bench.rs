// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the pagescan-engine crate. Measures the fixed
// overhead of fanning a page out to the codec tasks and joining them, using
// a decoder that returns immediately.

use std::sync::Arc;
use std::time::Duration;

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use image::{DynamicImage, GrayImage, Luma};

use pagescan_core::error::Result;
use pagescan_core::types::CodecConfig;
use pagescan_document::RasterPage;
use pagescan_engine::{CodecRequest, PageDecodeOrchestrator};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// One page through all three families with an instant decoder.
fn bench_decode_page(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("failed to build tokio runtime");

    let decoder = |_: &DynamicImage, request: &CodecRequest| -> Result<Vec<String>> {
        Ok(vec![format!("{}-bench", request.family)])
    };
    let orchestrator = PageDecodeOrchestrator::new(
        Arc::new(decoder),
        CodecConfig::default(),
        Duration::from_secs(5),
    );
    let page = RasterPage::new(
        1,
        DynamicImage::ImageLuma8(GrayImage::from_pixel(64, 64, Luma([255u8]))),
    );

    c.bench_function("decode_page (3 families, instant decoder)", |b| {
        b.iter(|| {
            let result = runtime.block_on(orchestrator.decode_page(black_box(&page)));
            black_box(result.codes.len());
        });
    });
}

criterion_group!(benches, bench_decode_page);
criterion_main!(benches);
