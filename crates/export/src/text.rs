//! Plain text files

use crate::paths::{output_path, validate_directory};
use crate::{ExportError, Result};
use log::info;
use pdf_core::write_replacing;
use std::fs;
use std::path::{Path, PathBuf};

/// Save `text` to `<dir>/<file_name><extension>`
///
/// Without `overwrite` the text is appended to the existing contents on a
/// new line. Appending to a file that does not exist writes it fresh.
pub fn save_text(
    text: &str,
    dir: &Path,
    file_name: &str,
    overwrite: bool,
    extension: &str,
) -> Result<PathBuf> {
    validate_directory(dir)?;
    let path = output_path(dir, file_name, extension);

    let contents = if !overwrite && path.is_file() {
        let existing = fs::read_to_string(&path)?;
        format!("{existing}\n{text}")
    } else {
        text.to_string()
    };

    fs::create_dir_all(dir)?;
    write_replacing(&path, contents.as_bytes())?;
    info!("saved {} bytes of text to {}", contents.len(), path.display());
    Ok(path)
}

/// Load the text stored in `<dir>/<file_name><extension>`
pub fn load_text(dir: &Path, file_name: &str, extension: &str) -> Result<String> {
    validate_directory(dir)?;
    if !dir.is_dir() {
        return Err(ExportError::WrongDirectory(dir.display().to_string()));
    }

    let path = output_path(dir, file_name, extension);
    if !path.is_file() {
        return Err(ExportError::FileNotFound(path));
    }
    Ok(fs::read_to_string(&path)?)
}
