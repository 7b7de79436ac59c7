// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagescan-document: Turning documents into page images.
//
// Defines the renderer capability the decode engine consumes, a raster-image
// source that treats a single image file as a one-page document, an optional
// MuPDF-backed PDF source, and page export to image files.

pub mod export;
pub mod raster;
pub mod source;

#[cfg(feature = "mupdf")]
pub mod pdf;

pub use export::{ExportOptions, export_pages};
pub use raster::ImageFileSource;
pub use source::{DocumentSource, RasterPage, RenderDocument, render_document};

#[cfg(feature = "mupdf")]
pub use pdf::MupdfSource;

use std::path::Path;
use std::sync::Arc;

/// Pick a source for `path` by its extension: raster images open directly,
/// anything else goes to the PDF renderer when it is compiled in.
pub fn source_for_path(path: &Path) -> pagescan_core::error::Result<Arc<dyn DocumentSource>> {
    if raster::is_raster_path(path) {
        return Ok(Arc::new(ImageFileSource));
    }

    #[cfg(feature = "mupdf")]
    {
        Ok(Arc::new(MupdfSource))
    }
    #[cfg(not(feature = "mupdf"))]
    {
        Err(pagescan_core::ScanError::BackendUnavailable(format!(
            "{} needs the PDF renderer",
            path.display()
        )))
    }
}
