//! Reading back documents produced by this crate
//!
//! The reader only understands the layout written by [`crate::builder`]. It
//! locates literal markers in the file instead of parsing PDF syntax:
//!
//! 1. the last `/Count` gives the page count,
//! 2. successive `/Width`, `/Height`, `/BitsPerComponent` markers give each
//!    page's size, with the image stream skipped by its `/Length`,
//! 3. the entries after the `65535 f ` free-list head give the offsets of
//!    the image objects and the image container,
//! 4. everything before the image container (found through its
//!    `/XObject <<` marker) is carried into the next build verbatim.
//!
//! Every image and image container entry must point at its own object
//! header. Any missing marker, malformed number or misplaced object fails
//! the whole read.

use crate::image::PageSize;
use crate::xref::{XrefEntry, FREE_LIST_MARKER};
use crate::{PdfError, Result};
use log::debug;

const COUNT: &[u8] = b"/Count";
const DICT_END: &[u8] = b">>";
const WIDTH: &[u8] = b"/Width";
const HEIGHT: &[u8] = b"/Height";
const BITS_PER_COMPONENT: &[u8] = b"/BitsPerComponent";
const LENGTH: &[u8] = b"/Length";
const STREAM: &[u8] = b"stream";
const ENDOBJ: &[u8] = b"endobj";
const IMAGE_CONTAINER: &[u8] = b"/XObject <<";

/// Separator written after every object
pub(crate) const OBJECT_SEPARATOR: &[u8] = b"\n\n";

/// What an append needs to know about an existing document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedState {
    /// Page sizes in page order
    page_sizes: Vec<PageSize>,
    /// Entries for objects 1..=page_count + 1 (images, then image container)
    xref_entries: Vec<XrefEntry>,
    /// Header and image objects, copied unchanged into the next build
    carried_section: Vec<u8>,
}

impl ParsedState {
    /// Assemble a state, checking that its parts agree with each other
    pub fn new(
        page_sizes: Vec<PageSize>,
        xref_entries: Vec<XrefEntry>,
        carried_section: Vec<u8>,
    ) -> Result<Self> {
        if page_sizes.is_empty() {
            return Err(PdfError::NoPages);
        }

        let page_count = page_sizes.len();
        if xref_entries.len() != page_count + 1 {
            return Err(PdfError::ParseError(format!(
                "expected {} xref entries for {} pages, found {}",
                page_count + 1,
                page_count,
                xref_entries.len()
            )));
        }

        // The first object of the next build lands where the old image
        // container started, so the two must coincide
        let container = xref_entries[page_count];
        if container.offset != carried_section.len() {
            return Err(PdfError::ParseError(format!(
                "image container at offset {} does not follow the image objects (ending at {})",
                container.offset,
                carried_section.len()
            )));
        }

        if let Some(entry) = xref_entries[..page_count]
            .iter()
            .find(|e| e.offset >= carried_section.len())
        {
            return Err(PdfError::ParseError(format!(
                "image object offset {} lies outside the carried section",
                entry.offset
            )));
        }

        Ok(Self {
            page_sizes,
            xref_entries,
            carried_section,
        })
    }

    pub fn page_count(&self) -> usize {
        self.page_sizes.len()
    }

    pub fn page_sizes(&self) -> &[PageSize] {
        &self.page_sizes
    }

    pub fn page_widths(&self) -> Vec<u32> {
        self.page_sizes.iter().map(|s| s.width).collect()
    }

    pub fn page_heights(&self) -> Vec<u32> {
        self.page_sizes.iter().map(|s| s.height).collect()
    }

    pub fn xref_entries(&self) -> &[XrefEntry] {
        &self.xref_entries
    }

    /// Entries of the image objects, which keep their offsets on append
    pub fn image_entries(&self) -> &[XrefEntry] {
        &self.xref_entries[..self.page_count()]
    }

    pub fn carried_section(&self) -> &[u8] {
        &self.carried_section
    }
}

/// Read the state of a document previously written by this crate
pub fn parse(data: &[u8]) -> Result<ParsedState> {
    let page_count = read_page_count(data)?;
    debug!("existing document declares {page_count} pages");

    // Each page needs at least its own /Width marker
    if page_count > data.len() / WIDTH.len() {
        return Err(PdfError::ParseError(format!(
            "/Count {page_count} is more pages than a {} byte file can hold",
            data.len()
        )));
    }

    let mut cursor = 0;
    let mut page_sizes = Vec::with_capacity(page_count.min(1024));
    for page in 0..page_count {
        let (size, next) = read_image_header(data, cursor, page + 1)?;
        debug!("page {}: {}x{}", page + 1, size.width, size.height);
        page_sizes.push(size);
        cursor = next;
    }

    let xref_entries = read_xref_entries(data, cursor, page_count + 1)?;
    let carried_section = read_carried_section(data)?;
    debug!(
        "carrying {} bytes of image objects into the next build",
        carried_section.len()
    );

    let state = ParsedState::new(page_sizes, xref_entries, carried_section)?;
    check_object_offsets(data, state.xref_entries())?;
    Ok(state)
}

/// Entry `i` must point at the header of object `i + 1`
fn check_object_offsets(data: &[u8], entries: &[XrefEntry]) -> Result<()> {
    for (i, entry) in entries.iter().enumerate() {
        let header = format!("{} 0 obj\n", i + 1);
        let found = data
            .get(entry.offset..)
            .is_some_and(|rest| rest.starts_with(header.as_bytes()));
        if !found {
            return Err(PdfError::ParseError(format!(
                "xref entry for object {} does not point at its definition (offset {})",
                i + 1,
                entry.offset
            )));
        }
    }
    Ok(())
}

fn read_page_count(data: &[u8]) -> Result<usize> {
    let marker = rfind(data, COUNT).ok_or(PdfError::MissingMarker("/Count"))?;
    let start = marker + COUNT.len();
    let end = find(data, DICT_END, start).ok_or(PdfError::MissingMarker(">>"))?;
    parse_number("/Count", &data[start..end])
}

/// Read one image dictionary starting at `from`; returns the page size and
/// the offset just past the object's `endobj`
fn read_image_header(data: &[u8], from: usize, page: usize) -> Result<(PageSize, usize)> {
    let width_at = find(data, WIDTH, from).ok_or(PdfError::MissingMarker("/Width"))?;
    let height_at = find(data, HEIGHT, width_at).ok_or(PdfError::MissingMarker("/Height"))?;
    let bits_at = find(data, BITS_PER_COMPONENT, height_at)
        .ok_or(PdfError::MissingMarker("/BitsPerComponent"))?;

    let width = parse_number("/Width", &data[width_at + WIDTH.len()..height_at])?;
    let height = parse_number("/Height", &data[height_at + HEIGHT.len()..bits_at])?;
    let size = PageSize::new(to_u32("/Width", width)?, to_u32("/Height", height)?);
    size.validate()?;

    let length_at = find(data, LENGTH, bits_at).ok_or(PdfError::MissingMarker("/Length"))?;
    let length = parse_leading_number("/Length", &data[length_at + LENGTH.len()..])?;

    let stream_at =
        find(data, STREAM, length_at).ok_or(PdfError::MissingMarker("stream"))?;
    let body_start = skip_eol(data, stream_at + STREAM.len()).ok_or_else(|| {
        PdfError::ParseError(format!("stream keyword of page {page} is not followed by a newline"))
    })?;
    let body_end = body_start
        .checked_add(length)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            PdfError::ParseError(format!(
                "image stream of page {page} runs past the end of the file"
            ))
        })?;

    let endobj_at = find(data, ENDOBJ, body_end).ok_or(PdfError::MissingMarker("endobj"))?;
    Ok((size, endobj_at + ENDOBJ.len()))
}

fn read_xref_entries(data: &[u8], from: usize, count: usize) -> Result<Vec<XrefEntry>> {
    let head = find(data, FREE_LIST_MARKER, from).ok_or(PdfError::MissingMarker("65535 f "))?;
    let rest = &data[head + FREE_LIST_MARKER.len()..];

    // First piece is the end of the free-list line itself
    let entries = rest
        .split(|&b| b == b'\n')
        .skip(1)
        .take(count)
        .map(XrefEntry::parse)
        .collect::<Result<Vec<_>>>()?;

    if entries.len() != count {
        return Err(PdfError::ParseError(format!(
            "xref table has {} entries, expected at least {count}",
            entries.len()
        )));
    }
    if let Some(free) = entries.iter().find(|e| !e.in_use) {
        return Err(PdfError::ParseError(format!(
            "unexpected free xref entry at offset {}",
            free.offset
        )));
    }

    Ok(entries)
}

fn read_carried_section(data: &[u8]) -> Result<Vec<u8>> {
    let container = rfind(data, IMAGE_CONTAINER).ok_or(PdfError::MissingMarker("/XObject <<"))?;
    let last_endobj = rfind(&data[..container], ENDOBJ).ok_or(PdfError::MissingMarker("endobj"))?;

    let end = last_endobj + ENDOBJ.len();
    let mut carried = Vec::with_capacity(end + OBJECT_SEPARATOR.len());
    carried.extend_from_slice(&data[..end]);
    carried.extend_from_slice(OBJECT_SEPARATOR);
    Ok(carried)
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|pos| pos + from)
}

fn rfind(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

fn skip_eol(data: &[u8], at: usize) -> Option<usize> {
    match data.get(at..) {
        Some([b'\r', b'\n', ..]) => Some(at + 2),
        Some([b'\n', ..]) => Some(at + 1),
        _ => None,
    }
}

/// Parse a whole token, surrounding whitespace allowed
fn parse_number(marker: &'static str, token: &[u8]) -> Result<usize> {
    let text = String::from_utf8_lossy(token);
    text.trim()
        .parse()
        .map_err(|_| PdfError::InvalidNumber {
            marker,
            token: text.trim().to_string(),
        })
}

/// Parse the digits following optional leading whitespace
fn parse_leading_number(marker: &'static str, rest: &[u8]) -> Result<usize> {
    let start = rest
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(rest.len());
    let digits = rest[start..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    parse_number(marker, &rest[start..start + digits])
}

fn to_u32(marker: &'static str, value: usize) -> Result<u32> {
    u32::try_from(value).map_err(|_| PdfError::InvalidNumber {
        marker,
        token: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_find_and_rfind() {
        let data = b"a /Count 1 >> b /Count 2 >>";
        assert_eq!(find(data, COUNT, 0), Some(2));
        assert_eq!(find(data, COUNT, 3), Some(16));
        assert_eq!(rfind(data, COUNT), Some(16));
        assert_eq!(find(data, b"missing", 0), None);
        assert_eq!(find(data, COUNT, 100), None);
    }

    #[test]
    fn test_page_count_uses_last_marker() {
        let data = b"<< /Count 1 >> ... << /Type /Pages /Count 3\n>>";
        assert_eq!(read_page_count(data).unwrap(), 3);
    }

    #[test]
    fn test_page_count_missing() {
        let result = read_page_count(b"<< /Type /Pages >>");
        assert!(matches!(result, Err(PdfError::MissingMarker("/Count"))));
    }

    #[test]
    fn test_page_count_not_a_number() {
        let result = read_page_count(b"/Count abc >>");
        match result {
            Err(PdfError::InvalidNumber { marker, token }) => {
                assert_eq!(marker, "/Count");
                assert_eq!(token, "abc");
            }
            other => panic!("Expected InvalidNumber, got {other:?}"),
        }
    }

    #[test]
    fn test_image_header_skips_stream_body() {
        // Stream body contains marker-like bytes that must be skipped
        let data = b"1 0 obj\n<<\n   /Width 40\n   /Height 30\n   /BitsPerComponent 8\n   \
                     /Length 14\n>>\nstream\n/Width 1 /Hei\nendstream\nendobj\n\n";
        let (size, next) = read_image_header(data, 0, 1).unwrap();
        assert_eq!(size, PageSize::new(40, 30));
        assert_eq!(&data[next - ENDOBJ.len()..next], ENDOBJ);
    }

    #[test]
    fn test_image_header_stream_past_end() {
        let data = b"/Width 40 /Height 30 /BitsPerComponent 8 /Length 999 >>\nstream\nabc";
        assert!(matches!(
            read_image_header(data, 0, 1),
            Err(PdfError::ParseError(_))
        ));
    }

    #[test]
    fn test_image_header_huge_length() {
        let data = format!(
            "/Width 40 /Height 30 /BitsPerComponent 8 /Length {} >>\nstream\nabc",
            usize::MAX
        );
        assert!(matches!(
            read_image_header(data.as_bytes(), 0, 1),
            Err(PdfError::ParseError(_))
        ));
    }

    #[test]
    fn test_parse_rejects_count_larger_than_file() {
        let data = b"/Width 40 /Height 30 /Count 4000000000000000000\n>>";
        assert!(matches!(parse(data), Err(PdfError::ParseError(_))));
    }

    #[test]
    fn test_object_offsets_checked() {
        let data = b"%PDF-1.7\n\n1 0 obj\n<< >>\nendobj\n\n2 0 obj\n<< >>\nendobj\n\n";
        let good = [XrefEntry::in_use(10), XrefEntry::in_use(32)];
        assert!(check_object_offsets(data, &good).is_ok());

        let wrong = [XrefEntry::in_use(3), XrefEntry::in_use(32)];
        assert!(matches!(
            check_object_offsets(data, &wrong),
            Err(PdfError::ParseError(_))
        ));

        let past_end = [XrefEntry::in_use(10), XrefEntry::in_use(9999)];
        assert!(check_object_offsets(data, &past_end).is_err());
    }

    #[test]
    fn test_image_header_rejects_tiny_page() {
        let data = b"/Width 1 /Height 30 /BitsPerComponent 8 /Length 0 >>\nstream\n\nendobj";
        assert!(matches!(
            read_image_header(data, 0, 1),
            Err(PdfError::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn test_xref_entries_short_table() {
        let data = b"xref\n0 3\n0000000000 65535 f \n0000000010 00000 n \n";
        // Two lines follow the head but only one is an entry
        assert!(read_xref_entries(data, 0, 2).is_err());
    }

    #[test]
    fn test_xref_entries() {
        let data = b"xref\n0 4\n0000000000 65535 f \n0000000010 00000 n \n0000000200 00000 n \n0000000300 00000 n \n";
        let entries = read_xref_entries(data, 0, 2).unwrap();
        assert_eq!(entries, vec![XrefEntry::in_use(10), XrefEntry::in_use(200)]);
    }

    #[test]
    fn test_carried_section_ends_before_container() {
        let data = b"%PDF-1.7\n\n1 0 obj\n<< >>\nendobj\n\n2 0 obj\n<<\n   /XObject <<\n   >>\n>> \nendobj\n\n";
        let carried = read_carried_section(data).unwrap();
        assert_eq!(carried, b"%PDF-1.7\n\n1 0 obj\n<< >>\nendobj\n\n".to_vec());
    }

    #[test]
    fn test_state_rejects_misplaced_container() {
        let result = ParsedState::new(
            vec![PageSize::new(10, 10)],
            vec![XrefEntry::in_use(10), XrefEntry::in_use(99)],
            vec![0; 50],
        );
        assert!(matches!(result, Err(PdfError::ParseError(_))));
    }

    #[test]
    fn test_state_accessors() {
        let state = ParsedState::new(
            vec![PageSize::new(10, 20), PageSize::new(30, 40)],
            vec![
                XrefEntry::in_use(10),
                XrefEntry::in_use(20),
                XrefEntry::in_use(50),
            ],
            vec![0; 50],
        )
        .unwrap();

        assert_eq!(state.page_count(), 2);
        assert_eq!(state.page_widths(), vec![10, 30]);
        assert_eq!(state.page_heights(), vec![20, 40]);
        assert_eq!(state.image_entries().len(), 2);
    }
}
