// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Renderer capability: open a document, count its pages, rasterise pages.

use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use pagescan_core::error::Result;
use pagescan_core::range::{PageRange, RenderQuality, ResolvedRange};
use tracing::{debug, info, instrument};

/// Opens documents for rendering.
///
/// Implementations must be shareable across threads; the documents they open
/// need not be, since a document never leaves the thread that rendered it.
pub trait DocumentSource: Send + Sync {
    /// Open the document at `path`. Fails with `ScanError::Open`.
    fn open(&self, path: &Path) -> Result<Box<dyn RenderDocument>>;
}

/// An open document. Dropping it releases the underlying handle.
pub trait RenderDocument {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Rasterise the 1-based `page` at `quality`. Fails with
    /// `ScanError::Render`.
    fn render_page(&mut self, page: u32, quality: RenderQuality) -> Result<DynamicImage>;
}

/// One rendered page, shared read-only with the codec tasks decoding it.
#[derive(Debug, Clone)]
pub struct RasterPage {
    /// 1-based page number within the document.
    pub index: u32,
    pub image: Arc<DynamicImage>,
}

impl RasterPage {
    pub fn new(index: u32, image: DynamicImage) -> Self {
        Self {
            index,
            image: Arc::new(image),
        }
    }
}

/// Render `range` from an open document, one page at a time in ascending
/// order.
pub fn render_range(
    document: &mut dyn RenderDocument,
    range: ResolvedRange,
    quality: RenderQuality,
) -> Result<Vec<RasterPage>> {
    let mut pages = Vec::with_capacity(range.len() as usize);
    for index in range.pages() {
        let image = document.render_page(index, quality)?;
        debug!(
            page = index,
            width = image.width(),
            height = image.height(),
            "page rendered"
        );
        pages.push(RasterPage::new(index, image));
    }
    Ok(pages)
}

/// Open `path`, resolve `range` and `quality` against it, and render every
/// selected page.
///
/// The document is released before this returns, whether rendering succeeded
/// or not. An empty document yields an empty list.
#[instrument(skip_all, fields(path = %path.display(), quality = quality.value()))]
pub fn render_document(
    source: &dyn DocumentSource,
    path: &Path,
    range: &PageRange,
    quality: RenderQuality,
) -> Result<Vec<RasterPage>> {
    let mut document = source.open(path)?;
    let page_count = document.page_count();

    let Some(resolved) = range.resolve(page_count) else {
        info!(page_count, "document has no pages to render");
        return Ok(Vec::new());
    };

    info!(
        page_count,
        start = resolved.start,
        end = resolved.end,
        resolution = quality.resolution(),
        "rendering pages"
    );
    let pages = render_range(document.as_mut(), resolved, quality)?;

    drop(document);
    debug!(rendered = pages.len(), "document released");
    Ok(pages)
}
