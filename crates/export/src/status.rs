//! Outcome reporting for callers that want a single line of text

use crate::Result;
use std::fmt;
use std::path::{Path, PathBuf};

/// Outcome of an export operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    /// Operation finished; holds the path written or removed
    Success(PathBuf),
    /// Operation failed; holds the reason
    Failed(String),
}

impl ExportStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ExportStatus::Success(_))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ExportStatus::Success(path) => Some(path),
            ExportStatus::Failed(_) => None,
        }
    }
}

impl From<Result<PathBuf>> for ExportStatus {
    fn from(result: Result<PathBuf>) -> Self {
        match result {
            Ok(path) => ExportStatus::Success(path),
            Err(e) => ExportStatus::Failed(e.to_string()),
        }
    }
}

impl fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportStatus::Success(path) => write!(f, "Success: {}", path.display()),
            ExportStatus::Failed(reason) => write!(f, "Failed: {reason}"),
        }
    }
}
