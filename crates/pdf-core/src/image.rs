//! Page images and their placement on the page

use crate::{PdfError, Result};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbImage};

impl From<image::ImageError> for PdfError {
    fn from(err: image::ImageError) -> Self {
        PdfError::ImageError(err.to_string())
    }
}

/// Page sides must be strictly greater than this
pub const MIN_PAGE_DIMENSION: u32 = 1;

/// Quality used when a caller passes 0
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Detected image format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
}

/// Detect image format from magic bytes
pub fn detect_format(data: &[u8]) -> Result<ImageFormat> {
    if data.len() < 8 {
        return Err(PdfError::ImageError("Image data too short".to_string()));
    }

    // Check for JPEG (starts with FF D8 FF)
    if data[0] == 0xFF && data[1] == 0xD8 && data[2] == 0xFF {
        return Ok(ImageFormat::Jpeg);
    }

    // Check for PNG (starts with 89 50 4E 47 0D 0A 1A 0A)
    if data[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
        return Ok(ImageFormat::Png);
    }

    Err(PdfError::ImageError("Unknown image format".to_string()))
}

/// JPEG info including dimensions and color components
#[derive(Debug, Clone, Copy)]
struct JpegInfo {
    width: u32,
    height: u32,
    num_components: u8,
}

/// Get JPEG info including dimensions and color components
fn get_jpeg_info(data: &[u8]) -> Result<JpegInfo> {
    // SOF segment structure:
    // - 2 bytes: marker (0xFF, 0xC0-0xCF)
    // - 2 bytes: segment length
    // - 1 byte: precision
    // - 2 bytes: height
    // - 2 bytes: width
    // - 1 byte: number of components (1=grayscale, 3=RGB/YCbCr)
    let mut i = 2;
    while i + 10 < data.len() {
        if data[i] != 0xFF {
            i += 1;
            continue;
        }

        let marker = data[i + 1];

        // SOF markers (baseline, progressive, etc.)
        if (0xC0..=0xCF).contains(&marker) && marker != 0xC4 && marker != 0xC8 && marker != 0xCC {
            let height = u16::from_be_bytes([data[i + 5], data[i + 6]]) as u32;
            let width = u16::from_be_bytes([data[i + 7], data[i + 8]]) as u32;
            let num_components = data[i + 9];
            return Ok(JpegInfo {
                width,
                height,
                num_components,
            });
        }

        // Skip to next marker
        if i + 4 < data.len() {
            let length = u16::from_be_bytes([data[i + 2], data[i + 3]]) as usize;
            if length < 2 {
                break;
            }
            i += 2 + length;
        } else {
            break;
        }
    }

    Err(PdfError::ImageError(
        "Could not parse JPEG info".to_string(),
    ))
}

/// Width and height of one page, in pixels (1 pixel = 1 point)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageSize {
    pub width: u32,
    pub height: u32,
}

impl PageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Reject sizes with a side of `MIN_PAGE_DIMENSION` or less
    pub fn validate(&self) -> Result<()> {
        if self.width <= MIN_PAGE_DIMENSION || self.height <= MIN_PAGE_DIMENSION {
            return Err(PdfError::InvalidDimensions {
                width: self.width,
                height: self.height,
                minimum: MIN_PAGE_DIMENSION,
            });
        }
        Ok(())
    }
}

/// One page to be added: its size and the JPEG stream drawn over it
///
/// The JPEG bytes are embedded as-is with `/DCTDecode`; the declared size
/// is trusted to match the encoded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    size: PageSize,
    image: Vec<u8>,
}

impl PageRecord {
    /// Create a page from an already encoded JPEG stream
    pub fn new(width: u32, height: u32, image: Vec<u8>) -> Result<Self> {
        let size = PageSize::new(width, height);
        size.validate()?;
        if image.is_empty() {
            return Err(PdfError::ImageError("Image data is empty".to_string()));
        }
        Ok(Self { size, image })
    }

    /// Create a page from JPEG data, reading the size from its SOF marker
    ///
    /// Only 3-component JPEGs are accepted since pages declare
    /// `/DeviceRGB`.
    pub fn from_jpeg(data: &[u8]) -> Result<Self> {
        let info = get_jpeg_info(data)?;
        if info.num_components != 3 {
            return Err(PdfError::ImageError(format!(
                "JPEG has {} color components, expected 3",
                info.num_components
            )));
        }
        Self::new(info.width, info.height, data.to_vec())
    }

    /// Create a page from any supported image file
    ///
    /// RGB JPEG data is embedded unchanged; everything else the `image`
    /// crate can decode is re-encoded as JPEG with `quality`.
    pub fn from_image_bytes(data: &[u8], quality: u8) -> Result<Self> {
        if matches!(detect_format(data), Ok(ImageFormat::Jpeg)) {
            if let Ok(page) = Self::from_jpeg(data) {
                return Ok(page);
            }
        }

        let image = image::load_from_memory(data)?;
        Self::from_image(&image, quality)
    }

    /// Encode a decoded image as a JPEG page of the same size
    pub fn from_image(image: &DynamicImage, quality: u8) -> Result<Self> {
        let encoded = encode_jpeg(image, quality)?;
        Self::new(image.width(), image.height(), encoded)
    }

    pub fn size(&self) -> PageSize {
        self.size
    }

    pub fn width(&self) -> u32 {
        self.size.width
    }

    pub fn height(&self) -> u32 {
        self.size.height
    }

    /// Encoded JPEG stream
    pub fn image_bytes(&self) -> &[u8] {
        &self.image
    }

    /// Placement operators for this page's image under `image_name`
    pub fn placement(&self, image_name: &str) -> String {
        placement_operators(image_name, self.size.width, self.size.height)
    }
}

/// Encode an image as baseline JPEG
///
/// Alpha is blended against a white background. A `quality` of 0 selects
/// `DEFAULT_JPEG_QUALITY`.
pub fn encode_jpeg(image: &DynamicImage, quality: u8) -> Result<Vec<u8>> {
    let quality = match quality {
        0 => DEFAULT_JPEG_QUALITY,
        q => q.min(100),
    };

    let rgb = flatten_to_rgb(image);
    let mut out = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut out, quality);
    encoder.encode_image(&rgb)?;
    Ok(out)
}

fn flatten_to_rgb(image: &DynamicImage) -> RgbImage {
    if !image.color().has_alpha() {
        return image.to_rgb8();
    }

    let rgba = image.to_rgba8();
    let mut rgb = RgbImage::new(rgba.width(), rgba.height());
    for (src, dst) in rgba.pixels().zip(rgb.pixels_mut()) {
        let alpha = src[3] as f32 / 255.0;
        for c in 0..3 {
            dst[c] = (src[c] as f32 * alpha + 255.0 * (1.0 - alpha)) as u8;
        }
    }
    rgb
}

/// Generate operators that stretch an image over a whole page
///
/// # Arguments
/// * `image_name` - Image resource name (e.g., "Img1")
/// * `width` - Page width in points
/// * `height` - Page height in points
pub fn placement_operators(image_name: &str, width: u32, height: u32) -> String {
    // q                     - Save graphics state
    // width 0 0 height 0 0 cm - Scale the unit square to the page
    // /Img1 Do              - Draw image
    // Q                     - Restore graphics state
    format!("q {width} 0 0 {height} 0 0 cm /{image_name} Do Q\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use pretty_assertions::assert_eq;

    fn sof_jpeg(width: u16, height: u16, components: u8) -> Vec<u8> {
        let mut jpeg = vec![
            0xFF, 0xD8, // SOI
            0xFF, 0xC0, // SOF0
            0x00, 0x11, // Length
            0x08, // Precision
        ];
        jpeg.extend_from_slice(&height.to_be_bytes());
        jpeg.extend_from_slice(&width.to_be_bytes());
        jpeg.push(components);
        jpeg.extend_from_slice(&[0x01, 0x22, 0x00, 0x02, 0x11, 0x01, 0x03, 0x11, 0x01]);
        jpeg.extend_from_slice(&[0xFF, 0xD9]); // EOI
        jpeg
    }

    #[test]
    fn test_detect_jpeg() {
        let jpeg_header = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46];
        assert_eq!(detect_format(&jpeg_header).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_detect_png() {
        let png_header = vec![0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
        assert_eq!(detect_format(&png_header).unwrap(), ImageFormat::Png);
    }

    #[test]
    fn test_detect_unknown() {
        let unknown = vec![0x00; 8];
        assert!(detect_format(&unknown).is_err());
        assert!(detect_format(&[0xFF, 0xD8]).is_err());
    }

    #[test]
    fn test_page_from_bmp_bytes() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(12, 9, image::Rgb([10, 200, 30])));
        let mut bmp = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut bmp), image::ImageFormat::Bmp)
            .unwrap();
        assert!(detect_format(&bmp).is_err());

        let page = PageRecord::from_image_bytes(&bmp, 80).unwrap();
        assert_eq!(page.size(), PageSize::new(12, 9));
        assert_eq!(detect_format(page.image_bytes()).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_page_from_unknown_bytes_fails() {
        assert!(PageRecord::from_image_bytes(&[0x00; 32], 80).is_err());
    }

    #[test]
    fn test_page_from_jpeg_reads_sof() {
        let page = PageRecord::from_jpeg(&sof_jpeg(200, 100, 3)).unwrap();
        assert_eq!(page.size(), PageSize::new(200, 100));
        assert_eq!(page.image_bytes(), sof_jpeg(200, 100, 3).as_slice());
    }

    #[test]
    fn test_page_from_grayscale_jpeg_rejected() {
        let result = PageRecord::from_jpeg(&sof_jpeg(200, 100, 1));
        assert!(matches!(result, Err(PdfError::ImageError(_))));
    }

    #[test]
    fn test_page_from_invalid_jpeg() {
        let data = vec![0xFF, 0xD8, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00];
        assert!(PageRecord::from_jpeg(&data).is_err());
    }

    #[test]
    fn test_page_size_validation() {
        assert!(PageSize::new(2, 2).validate().is_ok());
        assert!(PageSize::new(1, 500).validate().is_err());
        assert!(PageSize::new(500, 0).validate().is_err());

        match PageRecord::new(1, 1, vec![1, 2, 3]) {
            Err(PdfError::InvalidDimensions {
                width,
                height,
                minimum,
            }) => {
                assert_eq!((width, height, minimum), (1, 1, MIN_PAGE_DIMENSION));
            }
            other => panic!("Expected InvalidDimensions, got {other:?}"),
        }
    }

    #[test]
    fn test_page_requires_image_data() {
        assert!(matches!(
            PageRecord::new(10, 10, Vec::new()),
            Err(PdfError::ImageError(_))
        ));
    }

    #[test]
    fn test_page_from_image_encodes_jpeg() {
        let img = DynamicImage::new_rgb8(32, 16);
        let page = PageRecord::from_image(&img, 80).unwrap();

        assert_eq!(page.size(), PageSize::new(32, 16));
        assert_eq!(detect_format(page.image_bytes()).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_page_from_png_bytes() {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::new(20, 10);
        let mut png = Vec::new();
        img.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .unwrap();

        let page = PageRecord::from_image_bytes(&png, 0).unwrap();
        assert_eq!(page.size(), PageSize::new(20, 10));
        assert_eq!(detect_format(page.image_bytes()).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_transparent_pixels_become_white() {
        let img = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(4, 4, Rgba([0, 0, 0, 0])));
        let rgb = flatten_to_rgb(&img);
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
    }

    #[test]
    fn test_placement_operators() {
        assert_eq!(
            placement_operators("Img3", 640, 480),
            "q 640 0 0 480 0 0 cm /Img3 Do Q\n"
        );
    }
}
