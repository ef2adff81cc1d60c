//! Export configuration
//!
//! Configuration is read from camelCase JSON; every field is optional.
//!
//! ```json
//! {
//!     "documentsDir": "Documents",
//!     "jpegQuality": 85,
//!     "imageFormat": "png",
//!     "overwritePdf": false,
//!     "onParseFailure": "overwrite"
//! }
//! ```

use crate::{ExportError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File format for single image export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    #[serde(alias = "jpg")]
    Jpeg,
    Bmp,
}

impl ImageFormat {
    /// File extension including the leading dot
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Png => ".png",
            ImageFormat::Jpeg => ".jpg",
            ImageFormat::Bmp => ".bmp",
        }
    }

    pub(crate) fn to_image_format(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::Bmp => image::ImageFormat::Bmp,
        }
    }
}

/// What to do when appending to a PDF that cannot be read back
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseFallback {
    /// Fail the export and leave the file untouched
    #[default]
    Abort,
    /// Replace the file with a fresh document
    Overwrite,
}

/// Defaults used by the export operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportConfig {
    /// Directory used by the `_simple` variants
    pub documents_dir: PathBuf,
    /// JPEG quality 1-100 (0 = encoder default)
    pub jpeg_quality: u8,
    pub image_format: ImageFormat,
    pub overwrite_pdf: bool,
    pub overwrite_image: bool,
    pub overwrite_text: bool,
    /// Extension for text files, with or without the leading dot
    pub text_extension: String,
    pub on_parse_failure: ParseFallback,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("Documents"),
            jpeg_quality: pdf_core::DEFAULT_JPEG_QUALITY,
            image_format: ImageFormat::Png,
            overwrite_pdf: true,
            overwrite_image: true,
            overwrite_text: true,
            text_extension: ".txt".to_string(),
            on_parse_failure: ParseFallback::Abort,
        }
    }
}

impl ExportConfig {
    /// Parse configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ExportError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path.as_ref())?;
        Self::from_json(&json)
    }

    /// Serialize configuration as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ExportError::Config(e.to_string()))
    }

    fn validate(&self) -> Result<()> {
        if self.jpeg_quality > 100 {
            return Err(ExportError::Config(format!(
                "jpegQuality must be between 0 and 100, got {}",
                self.jpeg_quality
            )));
        }
        Ok(())
    }
}
