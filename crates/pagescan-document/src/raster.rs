// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Raster image files as one-page documents.

use std::path::Path;

use image::{DynamicImage, ImageFormat};
use pagescan_core::ScanError;
use pagescan_core::error::Result;
use pagescan_core::range::RenderQuality;
use tracing::{info, instrument};

use crate::source::{DocumentSource, RenderDocument};

/// Whether `path` has an extension the `image` crate can decode.
pub fn is_raster_path(path: &Path) -> bool {
    ImageFormat::from_path(path).is_ok_and(|format| format.reading_enabled())
}

/// Opens PNG, JPEG and other raster files as single-page documents.
///
/// The page is already a raster, so render quality has no effect: the image
/// is handed to the decoders at its native size.
pub struct ImageFileSource;

impl DocumentSource for ImageFileSource {
    #[instrument(skip_all, fields(path = %path.display()))]
    fn open(&self, path: &Path) -> Result<Box<dyn RenderDocument>> {
        let image = image::open(path)
            .map_err(|err| ScanError::Open(format!("{}: {}", path.display(), err)))?;
        info!(
            width = image.width(),
            height = image.height(),
            "image loaded as single page"
        );
        Ok(Box::new(ImageDocument { image }))
    }
}

struct ImageDocument {
    image: DynamicImage,
}

impl RenderDocument for ImageDocument {
    fn page_count(&self) -> u32 {
        1
    }

    fn render_page(&mut self, page: u32, _quality: RenderQuality) -> Result<DynamicImage> {
        if page != 1 {
            return Err(ScanError::Render {
                page,
                detail: "image files have a single page".into(),
            });
        }
        Ok(self.image.clone())
    }
}
