//! Page sources
//!
//! A page source renders numbered pages at a requested size. Exports only
//! see the [`PageSource`] trait; [`RasterPages`] is the in-memory
//! implementation backed by decoded images.

use crate::{ExportError, Result};
use image::imageops::FilterType;
use image::DynamicImage;
use log::debug;
use pdf_core::{encode_jpeg, PageRecord, PageSize};
use std::path::Path;

/// Something that can render pages at a given size
pub trait PageSource {
    /// Number of pages this source can render
    fn page_count(&self) -> usize;

    /// Render page `index` (0-based) at exactly `size`
    fn render(&self, index: usize, size: PageSize) -> Result<DynamicImage>;

    /// Render page `index` and encode it as a JPEG page
    ///
    /// # Arguments
    /// * `index` - Page index (0-based)
    /// * `size` - Page size in pixels
    /// * `quality` - JPEG quality (0 = default)
    fn render_page(&self, index: usize, size: PageSize, quality: u8) -> Result<PageRecord> {
        let image = self.render(index, size)?;
        if image.width() != size.width || image.height() != size.height {
            return Err(ExportError::Render(format!(
                "page {} rendered at {}x{}, expected {}x{}",
                index + 1,
                image.width(),
                image.height(),
                size.width,
                size.height
            )));
        }
        let jpeg = encode_jpeg(&image, quality)?;
        Ok(PageRecord::new(size.width, size.height, jpeg)?)
    }
}

/// Pages backed by decoded images, scaled to the requested size
#[derive(Debug, Clone)]
pub struct RasterPages {
    pages: Vec<DynamicImage>,
    filter: FilterType,
}

impl Default for RasterPages {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl RasterPages {
    pub fn new(pages: Vec<DynamicImage>) -> Self {
        Self {
            pages,
            filter: FilterType::Triangle,
        }
    }

    /// Load every file as one page
    pub fn from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let pages = paths
            .iter()
            .map(|path| {
                let path = path.as_ref();
                if !path.is_file() {
                    return Err(ExportError::FileNotFound(path.to_path_buf()));
                }
                Ok(image::open(path)?)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(pages))
    }

    /// Set the resampling filter used when scaling
    pub fn with_filter(mut self, filter: FilterType) -> Self {
        self.filter = filter;
        self
    }

    pub fn push(&mut self, page: DynamicImage) {
        self.pages.push(page);
    }

    /// Native size of page `index` before any scaling
    pub fn native_size(&self, index: usize) -> Option<PageSize> {
        self.pages
            .get(index)
            .map(|page| PageSize::new(page.width(), page.height()))
    }
}

impl PageSource for RasterPages {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn render(&self, index: usize, size: PageSize) -> Result<DynamicImage> {
        let page = self.pages.get(index).ok_or_else(|| {
            ExportError::Render(format!(
                "page {} requested from a source of {} pages",
                index + 1,
                self.pages.len()
            ))
        })?;

        if page.width() == size.width && page.height() == size.height {
            return Ok(page.clone());
        }
        debug!(
            "scaling page {} from {}x{} to {}x{}",
            index + 1,
            page.width(),
            page.height(),
            size.width,
            size.height
        );
        Ok(page.resize_exact(size.width, size.height, self.filter))
    }
}
