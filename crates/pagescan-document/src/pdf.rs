// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF rendering through MuPDF.
//
// Only available with the `mupdf` feature:
//
// ```toml
// pagescan-document = { path = "crates/pagescan-document", features = ["mupdf"] }
// ```

use std::path::Path;

use image::{DynamicImage, RgbImage};
use mupdf::{Colorspace, Document, Matrix, Pixmap};
use pagescan_core::ScanError;
use pagescan_core::error::Result;
use pagescan_core::range::RenderQuality;
use tracing::{debug, info, instrument};

use crate::source::{DocumentSource, RenderDocument};

/// MuPDF works in PDF points, 72 per inch.
const POINTS_PER_INCH: f32 = 72.0;

/// Opens PDF (and other MuPDF-supported) documents.
pub struct MupdfSource;

impl DocumentSource for MupdfSource {
    #[instrument(skip_all, fields(path = %path.display()))]
    fn open(&self, path: &Path) -> Result<Box<dyn RenderDocument>> {
        let document = Document::open(path.to_string_lossy().as_ref())
            .map_err(|err| ScanError::Open(format!("{}: {}", path.display(), err)))?;
        let page_count = document
            .page_count()
            .map_err(|err| ScanError::Open(format!("cannot count pages: {err}")))?;

        info!(page_count, "PDF opened");
        Ok(Box::new(MupdfDocument {
            document,
            page_count: u32::try_from(page_count).unwrap_or(0),
        }))
    }
}

struct MupdfDocument {
    document: Document,
    page_count: u32,
}

impl RenderDocument for MupdfDocument {
    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn render_page(&mut self, page: u32, quality: RenderQuality) -> Result<DynamicImage> {
        let render_err = |detail: String| ScanError::Render { page, detail };

        if page == 0 || page > self.page_count {
            return Err(render_err(format!(
                "out of range (document has {} pages)",
                self.page_count
            )));
        }

        let loaded = self
            .document
            .load_page((page - 1) as i32)
            .map_err(|err| render_err(err.to_string()))?;

        let scale = quality.resolution() as f32 / POINTS_PER_INCH;
        let matrix = Matrix::new_scale(scale, scale);
        let pixmap = loaded
            .to_pixmap(&matrix, &Colorspace::device_rgb(), false, false)
            .map_err(|err| render_err(err.to_string()))?;

        debug!(
            page,
            scale,
            width = pixmap.width(),
            height = pixmap.height(),
            "pixmap rendered"
        );
        pixmap_to_image(&pixmap).map_err(render_err)
    }
}

/// Copy a MuPDF pixmap into an RGB image, dropping any alpha channel and
/// row padding.
fn pixmap_to_image(pixmap: &Pixmap) -> std::result::Result<DynamicImage, String> {
    let n = pixmap.n() as usize;
    if n < 3 {
        return Err(format!("unsupported pixmap format: {n} channels"));
    }

    let width = pixmap.width() as usize;
    let height = pixmap.height() as usize;
    let stride = pixmap.stride() as usize;
    let samples = pixmap.samples();
    let row_bytes = width * n;
    if samples.len() < stride.saturating_mul(height) || row_bytes > stride {
        return Err("pixmap buffer size mismatch".into());
    }

    let mut rgb = Vec::with_capacity(width * height * 3);
    for y in 0..height {
        let row = &samples[y * stride..y * stride + row_bytes];
        if n == 3 {
            rgb.extend_from_slice(row);
        } else {
            for px in row.chunks_exact(n) {
                rgb.extend_from_slice(&px[..3]);
            }
        }
    }

    RgbImage::from_raw(width as u32, height as u32, rgb)
        .map(DynamicImage::ImageRgb8)
        .ok_or_else(|| "failed to create image buffer".to_string())
}
