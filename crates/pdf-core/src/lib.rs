//! PDF Core - Image-page PDF assembly
//!
//! This crate provides functionality for:
//! - Building PDF files where every page is one full-page JPEG image
//! - Appending pages to a PDF previously produced by this crate
//! - Reading back the page sizes and object table of such a file
//!
//! # Example
//!
//! ```ignore
//! use pdf_core::{PageRecord, PdfDocument};
//!
//! let mut doc = PdfDocument::open("report.pdf")?;
//! doc.add_page(PageRecord::from_jpeg(&std::fs::read("page.jpg")?)?)?;
//! doc.save("report.pdf")?;
//! ```

pub mod builder;
mod document;
mod image;
mod objects;
pub mod reader;
mod xref;

pub use builder::{build, BuiltDocument};
pub use document::{write_replacing, PdfDocument};
pub use image::{
    detect_format, encode_jpeg, placement_operators, ImageFormat, PageRecord, PageSize,
    DEFAULT_JPEG_QUALITY, MIN_PAGE_DIMENSION,
};
pub use objects::{ObjectId, ObjectLayout};
pub use reader::{parse, ParsedState};
pub use xref::{XrefEntry, XrefTable};

use thiserror::Error;

/// Errors that can occur during PDF operations
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("Failed to parse existing PDF: {0}")]
    ParseError(String),

    #[error("Marker {0} not found in existing PDF")]
    MissingMarker(&'static str),

    #[error("Invalid number after {marker}: {token:?}")]
    InvalidNumber { marker: &'static str, token: String },

    #[error("Invalid page size {width}x{height} (both sides must be above {minimum})")]
    InvalidDimensions {
        width: u32,
        height: u32,
        minimum: u32,
    },

    #[error("Document has no pages")]
    NoPages,

    #[error("Too many pages for one document: {0}")]
    TooManyPages(usize),

    #[error("Image error: {0}")]
    ImageError(String),

    #[error("Failed to save PDF: {0}")]
    SaveError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type for PDF operations
pub type Result<T> = std::result::Result<T, PdfError>;

/// PDF header written at the start of every fresh document
pub const PDF_HEADER: &[u8] = b"%PDF-1.7\n\n";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = PdfError::MissingMarker("/Count");
        assert_eq!(err.to_string(), "Marker /Count not found in existing PDF");

        let err = PdfError::InvalidNumber {
            marker: "/Width",
            token: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid number after /Width: \"abc\"");
    }

    #[test]
    fn test_header_is_pdf_17() {
        assert!(PDF_HEADER.starts_with(b"%PDF-1.7"));
    }
}
