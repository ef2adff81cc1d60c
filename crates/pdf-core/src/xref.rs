//! Cross-reference table formatting and parsing

use crate::{PdfError, Result};
use std::fmt;
use std::io::Write;

/// Free-list head, always the first line of the table
pub(crate) const FREE_LIST_HEAD: &[u8] = b"0000000000 65535 f \n";

/// Marker the reader uses to find the start of the table
pub(crate) const FREE_LIST_MARKER: &[u8] = b"65535 f ";

/// One cross-reference line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XrefEntry {
    /// Byte offset of the `N 0 obj` token
    pub offset: usize,
    pub generation: u16,
    pub in_use: bool,
}

impl XrefEntry {
    /// In-use entry at `offset` with generation 0
    pub fn in_use(offset: usize) -> Self {
        Self {
            offset,
            generation: 0,
            in_use: true,
        }
    }

    /// Parse one entry, ignoring the trailing space and line terminator
    pub fn parse(line: &[u8]) -> Result<Self> {
        let trimmed = trim_end(line);
        let malformed = || {
            PdfError::ParseError(format!(
                "malformed xref entry {:?}",
                String::from_utf8_lossy(line)
            ))
        };

        if trimmed.len() != 18 || trimmed[10] != b' ' || trimmed[16] != b' ' {
            return Err(malformed());
        }

        let offset = parse_digits(&trimmed[..10]).ok_or_else(malformed)?;
        let generation = parse_digits(&trimmed[11..16]).ok_or_else(malformed)?;
        let in_use = match trimmed[17] {
            b'n' => true,
            b'f' => false,
            _ => return Err(malformed()),
        };

        Ok(Self {
            offset,
            generation: u16::try_from(generation).map_err(|_| malformed())?,
            in_use,
        })
    }
}

impl fmt::Display for XrefEntry {
    /// Exactly 20 bytes: `oooooooooo ggggg n \n`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = if self.in_use { 'n' } else { 'f' };
        writeln!(f, "{:010} {:05} {} ", self.offset, self.generation, flag)
    }
}

/// Cross-reference section for objects 1..=N
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XrefTable {
    entries: Vec<XrefEntry>,
}

impl XrefTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: XrefEntry) {
        self.entries.push(entry);
    }

    pub fn extend<I: IntoIterator<Item = XrefEntry>>(&mut self, entries: I) {
        self.entries.extend(entries);
    }

    pub fn entries(&self) -> &[XrefEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Value of `/Size`: every entry plus object 0
    pub fn size(&self) -> usize {
        self.entries.len() + 1
    }

    /// Write the `xref` keyword, subsection header, free-list head and
    /// every entry
    pub fn write_to<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        writeln!(out, "xref\n0 {}", self.size())?;
        out.write_all(FREE_LIST_HEAD)?;
        for entry in &self.entries {
            write!(out, "{entry}")?;
        }
        Ok(())
    }
}

fn trim_end(line: &[u8]) -> &[u8] {
    let end = line
        .iter()
        .rposition(|b| !matches!(b, b' ' | b'\r' | b'\n'))
        .map_or(0, |i| i + 1);
    &line[..end]
}

fn parse_digits(digits: &[u8]) -> Option<usize> {
    if digits.is_empty() || !digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    std::str::from_utf8(digits).ok()?.parse().ok()
}
