//! PDF Document wrapper

use crate::builder::build;
use crate::image::{PageRecord, PageSize};
use crate::reader::{parse, ParsedState};
use crate::{PdfError, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Image-page document that grows by appending
///
/// Pages added with [`PdfDocument::add_page`] are buffered until the next
/// [`PdfDocument::to_bytes`] or [`PdfDocument::save`]. After a build the
/// document keeps the structured state of the result, so further pages are
/// appended without reading the file back.
#[derive(Debug, Clone, Default)]
pub struct PdfDocument {
    /// Pages already written (None for a fresh document)
    base: Option<ParsedState>,
    /// Pages waiting for the next build
    pending: Vec<PageRecord>,
}

impl PdfDocument {
    /// Create an empty document
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a PDF previously written by this crate
    ///
    /// # Arguments
    /// * `path` - Path to the PDF file
    ///
    /// # Example
    /// ```ignore
    /// let doc = PdfDocument::open("report.pdf")?;
    /// ```
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        Self::open_from_bytes(&data)
    }

    /// Open a PDF from bytes
    ///
    /// # Arguments
    /// * `data` - PDF file bytes
    pub fn open_from_bytes(data: &[u8]) -> Result<Self> {
        Ok(Self::from_state(parse(data)?))
    }

    /// Continue from state kept by an earlier build
    pub fn from_state(state: ParsedState) -> Self {
        Self {
            base: Some(state),
            pending: Vec::new(),
        }
    }

    /// Get the number of pages, written and pending
    pub fn page_count(&self) -> usize {
        self.base.as_ref().map_or(0, ParsedState::page_count) + self.pending.len()
    }

    /// Sizes of all pages in order, written and pending
    pub fn page_sizes(&self) -> Vec<PageSize> {
        let mut sizes: Vec<PageSize> = self
            .base
            .as_ref()
            .map(|s| s.page_sizes().to_vec())
            .unwrap_or_default();
        sizes.extend(self.pending.iter().map(PageRecord::size));
        sizes
    }

    /// State of the pages already written
    pub fn state(&self) -> Option<&ParsedState> {
        self.base.as_ref()
    }

    /// Queue a page; returns its page number (1-indexed)
    pub fn add_page(&mut self, page: PageRecord) -> Result<usize> {
        page.size().validate()?;
        self.pending.push(page);
        Ok(self.page_count())
    }

    /// Build the document and return its bytes
    ///
    /// Pending pages are appended after the written ones and become part of
    /// the written state.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let built = build(self.base.as_ref(), &self.pending)?;
        self.base = Some(built.append_state()?);
        self.pending.clear();
        Ok(built.into_bytes())
    }

    /// Save the document to a file
    ///
    /// The whole file is built in memory first and then written next to the
    /// destination and renamed over it, so a failed save leaves the previous
    /// file untouched.
    ///
    /// # Arguments
    /// * `path` - Output file path
    pub fn save<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let bytes = self.to_bytes()?;
        write_replacing(path, &bytes)?;
        debug!("saved {} pages to {}", self.page_count(), path.display());
        Ok(())
    }
}

/// Write `bytes` to a sibling temporary file, then rename it over `path`
pub fn write_replacing(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = temp_path(path)?;
    fs::write(&tmp, bytes).map_err(|e| {
        PdfError::SaveError(format!("failed to write {}: {}", tmp.display(), e))
    })?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        PdfError::SaveError(format!("failed to replace {}: {}", path.display(), e))
    })
}

fn temp_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .ok_or_else(|| PdfError::SaveError(format!("{} is not a file path", path.display())))?;
    let mut tmp_name = name.to_os_string();
    tmp_name.push(".tmp");
    Ok(path.with_file_name(tmp_name))
}
