//! Object numbering for image-page documents
//!
//! Every document produced by this crate uses the same fixed layout, so all
//! object numbers follow from two counts: pages already in the file and
//! pages after the build.
//!
//! ```text
//! 1 ..= T            image XObjects, one per page
//! T + 1              image container (shared /Resources)
//! T + 2              catalog
//! T + 3              page tree
//! T + 4 ..= 2T + 3   page objects
//! 2T + 4 ..= 3T + 3  content streams
//! ```

use crate::{PdfError, Result};
use std::fmt;

/// Number of an indirect object (generation is always 0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// Object number as an index into a 1-based object table
    pub fn number(self) -> u32 {
        self.0
    }

    /// Reference syntax used inside dictionaries, e.g. `7 0 R`
    pub fn reference(self) -> String {
        format!("{} 0 R", self.0)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Object numbers derived from the page counts of one build
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectLayout {
    existing_pages: u32,
    total_pages: u32,
}

impl ObjectLayout {
    /// Layout for a document that already holds `existing_pages` pages and
    /// gains `new_pages` more
    ///
    /// Fails when the highest object number would not fit in a `u32`.
    pub fn new(existing_pages: usize, new_pages: usize) -> Result<Self> {
        let too_many = || PdfError::TooManyPages(existing_pages.saturating_add(new_pages));
        let total = existing_pages.checked_add(new_pages).ok_or_else(too_many)?;
        let total_pages = u32::try_from(total).map_err(|_| too_many())?;
        let existing_pages = u32::try_from(existing_pages).map_err(|_| too_many())?;
        if total_pages.checked_mul(3).and_then(|n| n.checked_add(4)).is_none() {
            return Err(too_many());
        }

        Ok(Self {
            existing_pages,
            total_pages,
        })
    }

    /// Pages carried over from the existing document
    pub fn existing_pages(&self) -> usize {
        self.existing_pages as usize
    }

    /// Pages added by this build
    pub fn new_pages(&self) -> usize {
        (self.total_pages - self.existing_pages) as usize
    }

    /// Running total of pages (`/Count` of the page tree)
    pub fn total_pages(&self) -> usize {
        self.total_pages as usize
    }

    /// Image XObject of the page at 0-based `index`
    pub fn image(&self, index: usize) -> ObjectId {
        ObjectId(index as u32 + 1)
    }

    /// Shared resource dictionary listing every image
    pub fn image_container(&self) -> ObjectId {
        ObjectId(self.total_pages + 1)
    }

    pub fn catalog(&self) -> ObjectId {
        ObjectId(self.total_pages + 2)
    }

    pub fn page_tree(&self) -> ObjectId {
        ObjectId(self.total_pages + 3)
    }

    /// Page object of the page at 0-based `index`
    pub fn page(&self, index: usize) -> ObjectId {
        ObjectId(self.page_tree().0 + 1 + index as u32)
    }

    /// Content stream of the page at 0-based `index`
    pub fn content(&self, index: usize) -> ObjectId {
        ObjectId(self.page_tree().0 + 1 + self.total_pages + index as u32)
    }

    /// First object number written by this build
    pub fn first_new_object(&self) -> ObjectId {
        ObjectId(self.existing_pages + 1)
    }

    /// Highest object number in the document
    pub fn last_object(&self) -> ObjectId {
        ObjectId(3 * self.total_pages + 3)
    }

    /// `/Size` of the xref table: every object plus the free-list head
    pub fn xref_size(&self) -> u32 {
        self.last_object().0 + 1
    }

    /// Objects that keep their xref entries when appending (old images)
    pub fn carried_objects(&self) -> usize {
        self.existing_pages as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_single_page_layout() {
        let layout = ObjectLayout::new(0, 1).unwrap();

        assert_eq!(layout.image(0), ObjectId(1));
        assert_eq!(layout.image_container(), ObjectId(2));
        assert_eq!(layout.catalog(), ObjectId(3));
        assert_eq!(layout.page_tree(), ObjectId(4));
        assert_eq!(layout.page(0), ObjectId(5));
        assert_eq!(layout.content(0), ObjectId(6));
        assert_eq!(layout.xref_size(), 7);
    }

    #[test]
    fn test_append_layout() {
        // Two pages on disk, three more appended
        let layout = ObjectLayout::new(2, 3).unwrap();

        assert_eq!(layout.total_pages(), 5);
        assert_eq!(layout.new_pages(), 3);
        assert_eq!(layout.first_new_object(), ObjectId(3));
        assert_eq!(layout.image(4), ObjectId(5));
        assert_eq!(layout.image_container(), ObjectId(6));
        assert_eq!(layout.catalog(), ObjectId(7));
        assert_eq!(layout.page_tree(), ObjectId(8));
        assert_eq!(layout.page(0), ObjectId(9));
        assert_eq!(layout.page(4), ObjectId(13));
        assert_eq!(layout.content(0), ObjectId(14));
        assert_eq!(layout.content(4), ObjectId(18));
        assert_eq!(layout.last_object(), ObjectId(18));
        assert_eq!(layout.xref_size(), 19);
    }

    #[test]
    fn test_layout_is_contiguous() {
        let layout = ObjectLayout::new(1, 2).unwrap();
        let mut ids = Vec::new();
        for i in 0..layout.total_pages() {
            ids.push(layout.image(i).number());
        }
        ids.push(layout.image_container().number());
        ids.push(layout.catalog().number());
        ids.push(layout.page_tree().number());
        for i in 0..layout.total_pages() {
            ids.push(layout.page(i).number());
        }
        for i in 0..layout.total_pages() {
            ids.push(layout.content(i).number());
        }

        let expected: Vec<u32> = (1..=layout.last_object().number()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn test_layout_rejects_unnumberable_counts() {
        assert!(matches!(
            ObjectLayout::new(0, u32::MAX as usize / 3),
            Err(PdfError::TooManyPages(_))
        ));
        assert!(matches!(
            ObjectLayout::new(usize::MAX, 1),
            Err(PdfError::TooManyPages(usize::MAX))
        ));
        assert!(ObjectLayout::new(u32::MAX as usize / 3 - 2, 0).is_ok());
    }

    #[test]
    fn test_reference_syntax() {
        assert_eq!(ObjectId(12).reference(), "12 0 R");
        assert_eq!(ObjectId(3).to_string(), "3");
    }
}
