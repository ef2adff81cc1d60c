//! WASM bindings for snapdoc
//!
//! This crate provides JavaScript-friendly API for:
//! - Assembling image pages into a PDF
//! - Appending pages to a PDF produced earlier
//! - Inspecting the pages of such a PDF
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { PdfAssembler, inspect } from 'snapdoc-wasm';
//!
//! await init();
//!
//! // Start fresh, or continue an earlier document
//! const doc = existingBytes ? PdfAssembler.fromBytes(existingBytes) : new PdfAssembler();
//!
//! doc.addJpegPage(jpegBytes);
//! doc.addImagePage(pngBytes, 85);
//!
//! const output = doc.build();
//! console.log(inspect(output).pageCount);
//! ```

use pdf_core::{PageRecord, PageSize, PdfDocument};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn js_error(e: pdf_core::PdfError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[derive(Serialize)]
struct JsPageSize {
    width: u32,
    height: u32,
}

impl From<PageSize> for JsPageSize {
    fn from(size: PageSize) -> Self {
        Self {
            width: size.width,
            height: size.height,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsInspection {
    page_count: usize,
    pages: Vec<JsPageSize>,
    xref_offsets: Vec<usize>,
}

/// Image-page PDF assembler
#[wasm_bindgen]
pub struct PdfAssembler {
    doc: PdfDocument,
}

#[wasm_bindgen]
impl PdfAssembler {
    /// Create an empty document
    #[wasm_bindgen(constructor)]
    pub fn new() -> PdfAssembler {
        PdfAssembler {
            doc: PdfDocument::new(),
        }
    }

    /// Continue a PDF produced by snapdoc
    ///
    /// @param data - PDF file bytes (Uint8Array)
    /// @returns PdfAssembler that appends to the given document
    #[wasm_bindgen(js_name = fromBytes)]
    pub fn from_bytes(data: &[u8]) -> Result<PdfAssembler, JsValue> {
        let doc = PdfDocument::open_from_bytes(data).map_err(js_error)?;
        Ok(PdfAssembler { doc })
    }

    /// Add a page from an RGB JPEG; the page takes the image's size
    ///
    /// @param data - JPEG bytes (Uint8Array)
    /// @returns Page number (1-indexed)
    #[wasm_bindgen(js_name = addJpegPage)]
    pub fn add_jpeg_page(&mut self, data: &[u8]) -> Result<usize, JsValue> {
        let page = PageRecord::from_jpeg(data).map_err(js_error)?;
        self.doc.add_page(page).map_err(js_error)
    }

    /// Add a page from a JPEG, PNG or BMP, re-encoding non-JPEG data
    ///
    /// @param data - Image bytes (Uint8Array)
    /// @param quality - JPEG quality 1-100 (0 = default)
    /// @returns Page number (1-indexed)
    #[wasm_bindgen(js_name = addImagePage)]
    pub fn add_image_page(&mut self, data: &[u8], quality: u8) -> Result<usize, JsValue> {
        let page = PageRecord::from_image_bytes(data, quality).map_err(js_error)?;
        self.doc.add_page(page).map_err(js_error)
    }

    /// Add a page of an explicit size from encoded JPEG bytes
    ///
    /// @param width - Page width in points
    /// @param height - Page height in points
    /// @param data - JPEG bytes (Uint8Array)
    /// @returns Page number (1-indexed)
    #[wasm_bindgen(js_name = addPage)]
    pub fn add_page(&mut self, width: u32, height: u32, data: &[u8]) -> Result<usize, JsValue> {
        let page = PageRecord::new(width, height, data.to_vec()).map_err(js_error)?;
        self.doc.add_page(page).map_err(js_error)
    }

    /// Number of pages, written and pending
    #[wasm_bindgen(js_name = pageCount)]
    pub fn page_count(&self) -> usize {
        self.doc.page_count()
    }

    /// Sizes of all pages
    ///
    /// @returns Array of { width, height }
    #[wasm_bindgen(js_name = pageSizes)]
    pub fn page_sizes(&self) -> Result<JsValue, JsValue> {
        let sizes: Vec<JsPageSize> = self.doc.page_sizes().into_iter().map(Into::into).collect();
        Ok(serde_wasm_bindgen::to_value(&sizes)?)
    }

    /// Build the document
    ///
    /// Pages added afterwards are appended to the returned document.
    ///
    /// @returns PDF bytes (Uint8Array)
    pub fn build(&mut self) -> Result<Vec<u8>, JsValue> {
        self.doc.to_bytes().map_err(js_error)
    }
}

impl Default for PdfAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Read the page sizes and object offsets of a snapdoc PDF
///
/// @param data - PDF file bytes (Uint8Array)
/// @returns { pageCount, pages, xrefOffsets }
#[wasm_bindgen]
pub fn inspect(data: &[u8]) -> Result<JsValue, JsValue> {
    let state = pdf_core::parse(data).map_err(js_error)?;
    let inspection = JsInspection {
        page_count: state.page_count(),
        pages: state.page_sizes().iter().copied().map(Into::into).collect(),
        xref_offsets: state.xref_entries().iter().map(|e| e.offset).collect(),
    };
    Ok(serde_wasm_bindgen::to_value(&inspection)?)
}
