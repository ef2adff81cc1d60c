//! Document assembly
//!
//! A build writes the whole file into one in-memory buffer, in this order:
//! header (or the carried image section), new image objects, image
//! container, catalog, page tree, page objects, content streams, xref,
//! trailer. The buffer length before an object is written is its xref
//! offset.

use crate::image::{PageRecord, PageSize};
use crate::objects::{ObjectId, ObjectLayout};
use crate::reader::{ParsedState, OBJECT_SEPARATOR};
use crate::xref::{XrefEntry, XrefTable};
use crate::{PdfError, Result, PDF_HEADER};
use log::debug;
use std::io::Write;

/// Name of the image resource for the page at 0-based `index`
fn image_name(index: usize) -> String {
    format!("Img{}", index + 1)
}

/// Output of one build
#[derive(Debug, Clone)]
pub struct BuiltDocument {
    bytes: Vec<u8>,
    layout: ObjectLayout,
    page_sizes: Vec<PageSize>,
    xref: XrefTable,
    startxref: usize,
}

impl BuiltDocument {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn layout(&self) -> ObjectLayout {
        self.layout
    }

    /// Sizes of every page in the document, old and new
    pub fn page_sizes(&self) -> &[PageSize] {
        &self.page_sizes
    }

    pub fn xref(&self) -> &XrefTable {
        &self.xref
    }

    /// Offset of the `xref` keyword
    pub fn startxref(&self) -> usize {
        self.startxref
    }

    /// State for appending to this document without re-reading it
    pub fn append_state(&self) -> Result<ParsedState> {
        let pages = self.layout.total_pages();
        let entries = self.xref.entries()[..=pages].to_vec();
        let container_offset = entries[pages].offset;

        ParsedState::new(
            self.page_sizes.clone(),
            entries,
            self.bytes[..container_offset].to_vec(),
        )
    }
}

/// Build a document from `pages`, appended to `parsed` when given
///
/// Appending copies the carried image section of `parsed` unchanged and
/// numbers the new objects after the existing images. All validation
/// happens before the first byte is written.
pub fn build(parsed: Option<&ParsedState>, pages: &[PageRecord]) -> Result<BuiltDocument> {
    let existing = parsed.map_or(0, ParsedState::page_count);
    if existing + pages.len() == 0 {
        return Err(PdfError::NoPages);
    }
    for page in pages {
        page.size().validate()?;
    }

    let mut ctx = BuildContext::new(parsed, pages)?;
    debug!(
        "building document: {} existing pages, {} new pages",
        existing,
        pages.len()
    );

    ctx.write_start(parsed)?;
    for (i, page) in pages.iter().enumerate() {
        ctx.write_image(existing + i, page)?;
    }
    ctx.write_image_container()?;
    ctx.write_catalog()?;
    ctx.write_page_tree()?;
    for i in 0..ctx.layout.total_pages() {
        ctx.write_page(i)?;
    }
    for i in 0..ctx.layout.total_pages() {
        ctx.write_content(i)?;
    }
    ctx.finish()
}

/// Mutable state of one build
struct BuildContext {
    out: Vec<u8>,
    layout: ObjectLayout,
    page_sizes: Vec<PageSize>,
    xref: XrefTable,
    next_object: ObjectId,
}

impl BuildContext {
    fn new(parsed: Option<&ParsedState>, pages: &[PageRecord]) -> Result<Self> {
        let existing = parsed.map_or(0, ParsedState::page_count);
        let layout = ObjectLayout::new(existing, pages.len())?;

        let mut page_sizes = Vec::with_capacity(layout.total_pages());
        let mut xref = XrefTable::new();
        if let Some(state) = parsed {
            page_sizes.extend_from_slice(state.page_sizes());
            xref.extend(state.image_entries().iter().copied());
        }
        page_sizes.extend(pages.iter().map(PageRecord::size));

        let image_bytes: usize = pages.iter().map(|p| p.image_bytes().len()).sum();
        let carried = parsed.map_or(0, |s| s.carried_section().len());

        Ok(Self {
            out: Vec::with_capacity(carried + image_bytes + 1024 * layout.total_pages()),
            layout,
            page_sizes,
            xref,
            next_object: layout.first_new_object(),
        })
    }

    /// Record the offset of `id` and open its definition
    fn begin_object(&mut self, id: ObjectId) -> Result<()> {
        debug_assert_eq!(id, self.next_object, "objects must be written in order");
        self.xref.push(XrefEntry::in_use(self.out.len()));
        self.next_object = ObjectId(id.number() + 1);
        writeln!(self.out, "{id} 0 obj")?;
        Ok(())
    }

    fn end_object(&mut self) -> Result<()> {
        self.out.extend_from_slice(b"endobj");
        self.out.extend_from_slice(OBJECT_SEPARATOR);
        Ok(())
    }

    fn write_start(&mut self, parsed: Option<&ParsedState>) -> Result<()> {
        match parsed {
            Some(state) => self.out.extend_from_slice(state.carried_section()),
            None => self.out.extend_from_slice(PDF_HEADER),
        }
        Ok(())
    }

    fn write_image(&mut self, index: usize, page: &PageRecord) -> Result<()> {
        let id = self.layout.image(index);
        self.begin_object(id)?;
        write!(
            self.out,
            "<<\n\
             \x20  /Type              /XObject\n\
             \x20  /Subtype           /Image\n\
             \x20  /Width             {}\n\
             \x20  /Height            {}\n\
             \x20  /BitsPerComponent  8\n\
             \x20  /ColorSpace        /DeviceRGB\n\
             \x20  /Filter            /DCTDecode\n\
             \x20  /Length            {}\n\
             >>\n\
             stream\n",
            page.width(),
            page.height(),
            page.image_bytes().len()
        )?;
        self.out.extend_from_slice(page.image_bytes());
        self.out.extend_from_slice(b"\nendstream\n");
        debug!(
            "image object {id}: {}x{}, {} bytes",
            page.width(),
            page.height(),
            page.image_bytes().len()
        );
        self.end_object()
    }

    /// Resource dictionary shared by every page
    fn write_image_container(&mut self) -> Result<()> {
        self.begin_object(self.layout.image_container())?;
        self.out.extend_from_slice(b"<<\n   /XObject <<\n");
        for i in 0..self.layout.total_pages() {
            writeln!(
                self.out,
                "      /{} {}",
                image_name(i),
                self.layout.image(i).reference()
            )?;
        }
        self.out.extend_from_slice(b"   >>\n>> \n");
        self.end_object()
    }

    fn write_catalog(&mut self) -> Result<()> {
        self.begin_object(self.layout.catalog())?;
        write!(
            self.out,
            "<<\n   /Type /Catalog\n   /Pages {}\n>>\n",
            self.layout.page_tree().reference()
        )?;
        self.end_object()
    }

    fn write_page_tree(&mut self) -> Result<()> {
        self.begin_object(self.layout.page_tree())?;
        self.out.extend_from_slice(b"<<\n   /Type /Pages\n   /Kids [");
        for i in 0..self.layout.total_pages() {
            write!(self.out, " {}", self.layout.page(i).reference())?;
        }
        write!(
            self.out,
            " ]\n   /Count {}\n>>\n",
            self.layout.total_pages()
        )?;
        self.end_object()
    }

    fn write_page(&mut self, index: usize) -> Result<()> {
        let size = self.page_sizes[index];
        self.begin_object(self.layout.page(index))?;
        write!(
            self.out,
            "<<\n\
             \x20  /Type /Page\n\
             \x20  /Parent {}\n\
             \x20  /MediaBox  [0 0 {} {}] \n\
             \x20  /Rotate 0\n\
             \x20  /Contents {}\n\
             \x20  /Resources {}\n\
             >>\n",
            self.layout.page_tree().reference(),
            size.width,
            size.height,
            self.layout.content(index).reference(),
            self.layout.image_container().reference()
        )?;
        self.end_object()
    }

    fn write_content(&mut self, index: usize) -> Result<()> {
        let size = self.page_sizes[index];
        let placement =
            crate::image::placement_operators(&image_name(index), size.width, size.height);
        let body = format!("BT\n{placement}ET");

        self.begin_object(self.layout.content(index))?;
        write!(
            self.out,
            "<<\n   /Length {}\n>>\nstream\n{body}\nendstream\n",
            body.len()
        )?;
        self.end_object()
    }

    /// Write xref and trailer and hand over the finished buffer
    fn finish(mut self) -> Result<BuiltDocument> {
        debug_assert_eq!(self.xref.size() as u32, self.layout.xref_size());

        let startxref = self.out.len();
        self.xref.write_to(&mut self.out)?;
        write!(
            self.out,
            "trailer\n<<\n   /Size {}\n   /Root {}\n>>\nstartxref\n{}\n%%EOF\n",
            self.xref.size(),
            self.layout.catalog().reference(),
            startxref
        )?;
        debug!(
            "document complete: {} objects, xref at {}, {} bytes",
            self.xref.len(),
            startxref,
            self.out.len()
        );

        Ok(BuiltDocument {
            bytes: self.out,
            layout: self.layout,
            page_sizes: self.page_sizes,
            xref: self.xref,
            startxref,
        })
    }
}
