//! Single image export

use crate::config::{ExportConfig, ImageFormat};
use crate::paths::{next_free_path, output_path, validate_directory};
use crate::source::PageSource;
use crate::{ExportError, Result};
use log::info;
use pdf_core::{encode_jpeg, write_replacing, PageSize};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Smallest width or height accepted for image export
pub const MIN_IMAGE_DIMENSION: u32 = 15;

/// How an image is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageOptions {
    pub format: ImageFormat,
    /// Replace an existing file; otherwise pick the first free numbered name
    pub overwrite: bool,
    /// JPEG quality (0 = default), ignored by the other formats
    pub quality: u8,
}

impl ImageOptions {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            format: config.image_format,
            overwrite: config.overwrite_image,
            quality: config.jpeg_quality,
        }
    }
}

impl Default for ImageOptions {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}

/// Render the first page of `source` and save it as an image
///
/// # Arguments
/// * `source` - Page source; only its first page is used
/// * `size` - Image size, at least 15x15
/// * `dir` - Output directory (created if missing)
/// * `file_name` - File name without extension
/// * `options` - Format and overwrite behaviour
pub fn save_image(
    source: &dyn PageSource,
    size: PageSize,
    dir: &Path,
    file_name: &str,
    options: &ImageOptions,
) -> Result<PathBuf> {
    check_image_request(source, size, dir)?;

    let extension = options.format.extension();
    let path = if options.overwrite {
        output_path(dir, file_name, extension)
    } else {
        next_free_path(dir, file_name, extension)
    };

    let image = source.render(0, size)?;
    let bytes = match options.format {
        ImageFormat::Jpeg => encode_jpeg(&image, options.quality)?,
        format => {
            let mut cursor = Cursor::new(Vec::new());
            image.write_to(&mut cursor, format.to_image_format())?;
            cursor.into_inner()
        }
    };

    fs::create_dir_all(dir)?;
    write_replacing(&path, &bytes)?;
    info!("saved {}x{} image to {}", size.width, size.height, path.display());
    Ok(path)
}

/// Same as [`save_image`], saving into `config.documents_dir` with the
/// configured format and overwrite mode
pub fn save_image_simple(
    source: &dyn PageSource,
    size: PageSize,
    file_name: &str,
    config: &ExportConfig,
) -> Result<PathBuf> {
    save_image(
        source,
        size,
        &config.documents_dir,
        file_name,
        &ImageOptions::from_config(config),
    )
}

/// Render the first page of `source` as JPEG and write the encoded bytes
/// under `extension`, replacing any existing file
pub fn save_encoded_image(
    source: &dyn PageSource,
    size: PageSize,
    dir: &Path,
    file_name: &str,
    extension: &str,
    config: &ExportConfig,
) -> Result<PathBuf> {
    check_image_request(source, size, dir)?;

    let path = output_path(dir, file_name, extension);
    let page = source.render_page(0, size, config.jpeg_quality)?;

    fs::create_dir_all(dir)?;
    write_replacing(&path, page.image_bytes())?;
    info!(
        "saved {} encoded bytes to {}",
        page.image_bytes().len(),
        path.display()
    );
    Ok(path)
}

fn check_image_request(source: &dyn PageSource, size: PageSize, dir: &Path) -> Result<()> {
    if source.page_count() == 0 {
        return Err(ExportError::EmptySource);
    }
    if size.width < MIN_IMAGE_DIMENSION || size.height < MIN_IMAGE_DIMENSION {
        return Err(ExportError::SizeTooSmall {
            width: size.width,
            height: size.height,
            minimum: MIN_IMAGE_DIMENSION,
        });
    }
    validate_directory(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::RasterPages;
    use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
    use pretty_assertions::assert_eq;

    fn source() -> RasterPages {
        RasterPages::new(vec![DynamicImage::ImageRgba8(RgbaImage::from_pixel(
            32,
            32,
            Rgba([10, 200, 30, 255]),
        ))])
    }

    fn options(format: ImageFormat, overwrite: bool) -> ImageOptions {
        ImageOptions {
            format,
            overwrite,
            quality: 0,
        }
    }

    #[test]
    fn test_minimum_size() {
        let dir = tempfile::tempdir().unwrap();
        let result = save_image(
            &source(),
            PageSize::new(14, 100),
            dir.path(),
            "shot",
            &ImageOptions::default(),
        );
        assert!(matches!(
            result,
            Err(ExportError::SizeTooSmall { minimum: 15, .. })
        ));
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_save_png_scaled() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_image(
            &source(),
            PageSize::new(20, 15),
            dir.path(),
            "shot",
            &options(ImageFormat::Png, true),
        )
        .unwrap();

        assert_eq!(path, dir.path().join("shot.png"));
        let saved = image::open(&path).unwrap();
        assert_eq!(saved.dimensions(), (20, 15));
    }

    #[test]
    fn test_numbered_copies() {
        let dir = tempfile::tempdir().unwrap();
        let opts = options(ImageFormat::Bmp, false);

        let names: Vec<PathBuf> = (0..3)
            .map(|_| {
                save_image(&source(), PageSize::new(16, 16), dir.path(), "shot", &opts).unwrap()
            })
            .collect();

        assert_eq!(
            names,
            vec![
                dir.path().join("shot.bmp"),
                dir.path().join("shot1.bmp"),
                dir.path().join("shot2.bmp"),
            ]
        );
    }

    #[test]
    fn test_save_jpeg() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_image(
            &source(),
            PageSize::new(16, 16),
            dir.path(),
            "shot",
            &options(ImageFormat::Jpeg, true),
        )
        .unwrap();

        assert_eq!(path.extension().unwrap(), "jpg");
        assert!(fs::read(&path).unwrap().starts_with(&[0xFF, 0xD8]));
    }

    #[test]
    fn test_encoded_image_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = save_encoded_image(
            &source(),
            PageSize::new(16, 16),
            dir.path(),
            "raw",
            "jpeg",
            &ExportConfig::default(),
        )
        .unwrap();

        assert_eq!(path, dir.path().join("raw.jpeg"));
        assert!(fs::read(&path).unwrap().starts_with(&[0xFF, 0xD8]));
    }
}
