//! File and directory removal

use crate::{ExportError, Result};
use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

fn delete_error(path: &Path, err: io::Error) -> ExportError {
    ExportError::Delete {
        path: path.to_path_buf(),
        code: err.raw_os_error().unwrap_or(-1),
    }
}

/// Delete a single file
pub fn delete_file(path: &Path) -> Result<PathBuf> {
    if !path.is_file() {
        return Err(ExportError::FileNotFound(path.to_path_buf()));
    }
    fs::remove_file(path).map_err(|e| delete_error(path, e))?;
    info!("deleted {}", path.display());
    Ok(path.to_path_buf())
}

/// Remove everything inside `dir`, leaving it empty
///
/// The directory itself is removed with its contents and created again.
pub fn clear_directory(dir: &Path) -> Result<PathBuf> {
    if dir.as_os_str().is_empty() || !dir.is_dir() {
        return Err(ExportError::WrongDirectory(dir.display().to_string()));
    }
    fs::remove_dir_all(dir).map_err(|e| delete_error(dir, e))?;
    fs::create_dir_all(dir)?;
    info!("cleared {}", dir.display());
    Ok(dir.to_path_buf())
}
