//! PDF export

use crate::config::{ExportConfig, ParseFallback};
use crate::paths::{output_path, validate_directory};
use crate::source::PageSource;
use crate::{ExportError, Result};
use log::{info, warn};
use pdf_core::{PageSize, PdfDocument, MIN_PAGE_DIMENSION};
use std::fs;
use std::path::{Path, PathBuf};

/// Save every page of `source` to `<dir>/<file_name>.pdf`
///
/// With `overwrite` unset and the file present, the pages are appended to
/// it; a file that cannot be read back is handled per
/// `config.on_parse_failure`. Nothing is written unless the whole document
/// was built.
///
/// # Arguments
/// * `source` - Pages to render, in order
/// * `page_size` - Size every page is rendered at
/// * `dir` - Output directory (created if missing)
/// * `file_name` - File name without extension; reserved characters become `_`
/// * `overwrite` - Replace an existing file instead of appending
/// * `config` - JPEG quality and parse fallback
pub fn save_pages_to_pdf(
    source: &dyn PageSource,
    page_size: PageSize,
    dir: &Path,
    file_name: &str,
    overwrite: bool,
    config: &ExportConfig,
) -> Result<PathBuf> {
    if source.page_count() == 0 {
        return Err(ExportError::EmptySource);
    }
    if page_size.width <= MIN_PAGE_DIMENSION || page_size.height <= MIN_PAGE_DIMENSION {
        return Err(ExportError::SizeTooSmall {
            width: page_size.width,
            height: page_size.height,
            minimum: MIN_PAGE_DIMENSION + 1,
        });
    }
    validate_directory(dir)?;

    let path = output_path(dir, file_name, ".pdf");
    let mut doc = if !overwrite && path.is_file() {
        open_for_append(&path, config.on_parse_failure)?
    } else {
        PdfDocument::new()
    };
    let existing = doc.page_count();

    for index in 0..source.page_count() {
        doc.add_page(source.render_page(index, page_size, config.jpeg_quality)?)?;
    }

    fs::create_dir_all(dir)?;
    doc.save(&path)?;
    info!(
        "saved {} pages ({} appended) to {}",
        doc.page_count(),
        doc.page_count() - existing,
        path.display()
    );
    Ok(path)
}

/// Same as [`save_pages_to_pdf`], saving into `config.documents_dir`
pub fn save_to_pdf(
    source: &dyn PageSource,
    page_size: PageSize,
    file_name: &str,
    overwrite: bool,
    config: &ExportConfig,
) -> Result<PathBuf> {
    save_pages_to_pdf(
        source,
        page_size,
        &config.documents_dir,
        file_name,
        overwrite,
        config,
    )
}

fn open_for_append(path: &Path, fallback: ParseFallback) -> Result<PdfDocument> {
    let data = fs::read(path)?;
    match PdfDocument::open_from_bytes(&data) {
        Ok(doc) => Ok(doc),
        Err(e) => match fallback {
            ParseFallback::Abort => Err(e.into()),
            ParseFallback::Overwrite => {
                warn!(
                    "cannot append to {} ({}), writing a new document",
                    path.display(),
                    e
                );
                Ok(PdfDocument::new())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RasterPages;
    use image::{DynamicImage, Rgb, RgbImage};
    use pdf_core::parse;
    use pretty_assertions::assert_eq;

    fn pages(count: usize) -> RasterPages {
        RasterPages::new(
            (0..count)
                .map(|i| {
                    let shade = (i * 60) as u8;
                    DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, Rgb([shade, 90, 160])))
                })
                .collect(),
        )
    }

    #[test]
    fn test_empty_source_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = save_pages_to_pdf(
            &pages(0),
            PageSize::new(50, 50),
            dir.path(),
            "doc",
            true,
            &ExportConfig::default(),
        );
        assert!(matches!(result, Err(ExportError::EmptySource)));
    }

    #[test]
    fn test_size_checked_before_directory() {
        let result = save_pages_to_pdf(
            &pages(1),
            PageSize::new(1, 50),
            Path::new("bad|dir"),
            "doc",
            true,
            &ExportConfig::default(),
        );
        assert!(matches!(
            result,
            Err(ExportError::SizeTooSmall { minimum: 2, .. })
        ));
    }

    #[test]
    fn test_fresh_then_append() {
        let dir = tempfile::tempdir().unwrap();
        let config = ExportConfig::default();

        let path = save_pages_to_pdf(
            &pages(2),
            PageSize::new(40, 30),
            dir.path(),
            "doc",
            true,
            &config,
        )
        .unwrap();
        assert_eq!(path, dir.path().join("doc.pdf"));

        save_pages_to_pdf(
            &pages(1),
            PageSize::new(20, 60),
            dir.path(),
            "doc",
            false,
            &config,
        )
        .unwrap();

        let state = parse(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            state.page_sizes(),
            &[
                PageSize::new(40, 30),
                PageSize::new(40, 30),
                PageSize::new(20, 60)
            ]
        );
    }

    #[test]
    fn test_unreadable_file_aborts_or_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.pdf");
        fs::write(&path, b"not a pdf").unwrap();

        let abort = ExportConfig::default();
        let result = save_pages_to_pdf(
            &pages(1),
            PageSize::new(30, 30),
            dir.path(),
            "doc",
            false,
            &abort,
        );
        assert!(matches!(result, Err(ExportError::Pdf(_))));
        assert_eq!(fs::read(&path).unwrap(), b"not a pdf".to_vec());

        let overwrite = ExportConfig {
            on_parse_failure: ParseFallback::Overwrite,
            ..Default::default()
        };
        save_pages_to_pdf(
            &pages(1),
            PageSize::new(30, 30),
            dir.path(),
            "doc",
            false,
            &overwrite,
        )
        .unwrap();
        assert_eq!(parse(&fs::read(&path).unwrap()).unwrap().page_count(), 1);
    }
}
