//! Output path helpers

use crate::{ExportError, Result};
use std::path::{Path, PathBuf};

/// Characters never allowed in an output directory
const INVALID_PATH_CHARS: &[char] = &['"', '<', '>', '|', '*', '?'];

/// Characters replaced in file names
const INVALID_FILE_NAME_CHARS: &[char] = &['"', '<', '>', '|', '*', '?', ':', '/', '\\'];

/// Check that `dir` is usable as an output directory
///
/// The directory does not need to exist; it is rejected when empty or when
/// it contains control or reserved characters.
pub fn validate_directory(dir: &Path) -> Result<()> {
    let text = dir.to_string_lossy();
    if text.trim().is_empty()
        || text
            .chars()
            .any(|c| c.is_control() || INVALID_PATH_CHARS.contains(&c))
    {
        return Err(ExportError::WrongDirectory(text.into_owned()));
    }
    Ok(())
}

/// Replace characters that cannot appear in a file name with `_`
pub fn make_valid_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_control() || INVALID_FILE_NAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Normalize an extension to start with a dot (empty stays empty)
pub fn normalize_extension(extension: &str) -> String {
    if extension.is_empty() || extension.starts_with('.') {
        extension.to_string()
    } else {
        format!(".{extension}")
    }
}

/// `<dir>/<sanitized name><extension>`
pub fn output_path(dir: &Path, name: &str, extension: &str) -> PathBuf {
    dir.join(format!(
        "{}{}",
        make_valid_file_name(name),
        normalize_extension(extension)
    ))
}

/// First of `name.ext`, `name1.ext`, `name2.ext`, ... that does not exist
pub fn next_free_path(dir: &Path, name: &str, extension: &str) -> PathBuf {
    let first = output_path(dir, name, extension);
    if !first.exists() {
        return first;
    }

    (1u32..)
        .map(|i| output_path(dir, &format!("{name}{i}"), extension))
        .find(|candidate| !candidate.exists())
        .unwrap_or(first)
}
