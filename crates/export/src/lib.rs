//! Export - Saving rendered pages, images and text to disk
//!
//! This crate provides:
//! - Multi-page PDF export with overwrite or append
//! - Single image export (PNG, JPEG, BMP) with optional numbered copies
//! - Plain text save/load with append
//! - File deletion and directory clearing
//! - JSON configuration for output defaults
//!
//! # Example
//!
//! ```ignore
//! use export::{save_to_pdf, ExportConfig, ExportStatus, RasterPages};
//! use pdf_core::PageSize;
//!
//! let config = ExportConfig::load("snapdoc.json")?;
//! let pages = RasterPages::from_files(&["cover.png", "body.png"])?;
//! let status = ExportStatus::from(save_to_pdf(&pages, PageSize::new(595, 842), "report", false, &config));
//! println!("{status}");
//! ```

mod config;
mod files;
mod image_export;
pub mod paths;
mod pdf;
mod source;
mod status;
mod text;

pub use config::{ExportConfig, ImageFormat, ParseFallback};
pub use files::{clear_directory, delete_file};
pub use image_export::{
    save_encoded_image, save_image, save_image_simple, ImageOptions, MIN_IMAGE_DIMENSION,
};
pub use paths::{make_valid_file_name, validate_directory};
pub use pdf::{save_pages_to_pdf, save_to_pdf};
pub use source::{PageSource, RasterPages};
pub use status::ExportStatus;
pub use text::{load_text, save_text};

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during export operations
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Wrong Directory: {0}")]
    WrongDirectory(String),

    #[error("Page source has no pages")]
    EmptySource,

    #[error("Size {width}x{height} is too small (minimum {minimum} pixels per side)")]
    SizeTooSmall {
        width: u32,
        height: u32,
        minimum: u32,
    },

    #[error("File does not exist: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Render error: {0}")]
    Render(String),

    #[error("PDF error: {0}")]
    Pdf(#[from] pdf_core::PdfError),

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Error deleting {}: (Error Code {code})", path.display())]
    Delete { path: PathBuf, code: i32 },
}

/// Result type for export operations
pub type Result<T> = std::result::Result<T, ExportError>;
