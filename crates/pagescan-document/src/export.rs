// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Page export: write rendered pages to image files.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat};
use pagescan_core::ScanError;
use pagescan_core::error::Result;
use pagescan_core::range::{PageRange, RenderQuality};
use tracing::{debug, info, instrument};

use crate::source::DocumentSource;

/// Where and how to write exported pages.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Created if it does not exist.
    pub output_dir: PathBuf,
    /// File stem; multi-page exports append the page number.
    pub base_name: String,
    pub format: ImageFormat,
    pub range: PageRange,
    pub quality: RenderQuality,
}

impl ExportOptions {
    pub fn new(output_dir: impl Into<PathBuf>, base_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            base_name: base_name.into(),
            format: ImageFormat::Png,
            range: PageRange::all(),
            quality: RenderQuality::default(),
        }
    }

    /// File path for `page`. A single-page export uses the bare base name.
    pub fn file_path(&self, page: u32, single: bool) -> PathBuf {
        let extension = self.format.extensions_str().first().copied().unwrap_or("img");
        let stem = if single {
            self.base_name.clone()
        } else {
            format!("{}{}", self.base_name, page)
        };
        self.output_dir.join(format!("{stem}.{extension}"))
    }
}

/// Render the selected pages of `path` and write one image file per page.
///
/// Pages are rendered and written one at a time. Returns the written paths in
/// page order; an empty document writes nothing.
#[instrument(skip_all, fields(path = %path.display(), out = %options.output_dir.display()))]
pub fn export_pages(
    source: &dyn DocumentSource,
    path: &Path,
    options: &ExportOptions,
) -> Result<Vec<PathBuf>> {
    if !options.format.writing_enabled() {
        return Err(ScanError::Export(format!(
            "writing {:?} images is not supported",
            options.format
        )));
    }

    let mut document = source.open(path)?;
    let Some(range) = options.range.resolve(document.page_count()) else {
        info!("document has no pages to export");
        return Ok(Vec::new());
    };

    std::fs::create_dir_all(&options.output_dir)?;

    let single = range.len() == 1;
    let mut written = Vec::with_capacity(range.len() as usize);
    for page in range.pages() {
        let image = document.render_page(page, options.quality)?;
        let target = options.file_path(page, single);
        save_image(&image, &target, options.format)?;
        debug!(page, file = %target.display(), "page exported");
        written.push(target);
    }

    info!(files = written.len(), "export complete");
    Ok(written)
}

fn save_image(image: &DynamicImage, target: &Path, format: ImageFormat) -> Result<()> {
    // JPEG has no alpha channel.
    let result = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(image.to_rgb8()).save_with_format(target, format)
    } else {
        image.save_with_format(target, format)
    };
    result.map_err(|err| {
        ScanError::Image(format!("failed to save {}: {}", target.display(), err))
    })
}
