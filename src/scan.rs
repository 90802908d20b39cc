//! Input collection: turn command-line paths into [`SourceImage`]s.
//!
//! - A **file** argument is always taken, whatever its extension. An unknown
//!   extension gets the generic `application/octet-stream` type, so the file
//!   shows up as a failed item instead of silently disappearing.
//! - A **directory** argument contributes the supported images directly in it
//!   (or below it, with `recursive`), sorted by path. Hidden entries are
//!   skipped.
//!
//! Each source gets a sequential id (`1`, `2`, …) in discovery order. The
//! same file reached twice is only read once.

use crate::imaging::rust_backend::{mime_for_extension, supported_input_extensions};
use crate::types::{ImageId, SourceImage};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use walkdir::WalkDir;

/// MIME type for files whose extension names no known image format.
pub const UNKNOWN_MIME: &str = "application/octet-stream";

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Input not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Collect sources from `inputs` in order.
pub fn collect_sources(inputs: &[PathBuf], recursive: bool) -> Result<Vec<SourceImage>, ScanError> {
    let mut seen = HashSet::new();
    let mut sources = Vec::new();

    for input in inputs {
        if !input.exists() {
            return Err(ScanError::NotFound(input.clone()));
        }
        let paths = if input.is_dir() {
            image_files_in(input, recursive)?
        } else {
            vec![input.clone()]
        };

        for path in paths {
            let key = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
            if !seen.insert(key) {
                debug!(path = %path.display(), "skipping duplicate input");
                continue;
            }
            let id = ImageId::new((sources.len() + 1).to_string());
            sources.push(read_source(&path, id)?);
        }
    }

    Ok(sources)
}

/// Read one file into a [`SourceImage`].
pub fn read_source(path: &Path, id: ImageId) -> Result<SourceImage, ScanError> {
    let bytes = fs::read(path).map_err(|source| ScanError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(SourceImage::new(id, name, mime_for_path(path), bytes))
}

/// MIME type implied by a path's extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(mime_for_extension)
        .unwrap_or(UNKNOWN_MIME)
}

fn image_files_in(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>, ScanError> {
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(if recursive { usize::MAX } else { 1 })
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry?;
        if entry.file_type().is_file() && is_supported(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn is_supported(path: &Path) -> bool {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    supported_input_extensions().contains(&ext.as_str())
}
