//! Archive builder: bundle successful results into one ZIP.
//!
//! Entries are written in result order under a single folder:
//!
//! ```text
//! picsqueeze-2026-10-16T09-30-00.zip
//! └── picsqueeze-images/
//!     ├── processed_beach.jpg
//!     ├── processed_beach-2.jpg     # second source also named beach.*
//!     └── processed_logo.jpg
//! ```
//!
//! Failed and cancelled items contribute no entries. Compression is Deflate
//! at a fixed level of 6; it is not a setting.

use crate::naming::{self, ARCHIVE_FOLDER, UniqueNames};
use crate::types::ProcessedResult;
use chrono::NaiveDateTime;
use std::io::{Cursor, Write};
use thiserror::Error;
use tracing::{debug, info};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Deflate level for every entry.
pub const COMPRESSION_LEVEL: i64 = 6;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One file to place in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveEntry<'a> {
    pub output_name: &'a str,
    pub bytes: &'a [u8],
}

impl<'a> ArchiveEntry<'a> {
    /// Entries for the successful results, in order.
    pub fn from_results(results: &'a [ProcessedResult]) -> Vec<Self> {
        results
            .iter()
            .filter_map(ProcessedResult::processed)
            .map(|image| ArchiveEntry {
                output_name: &image.output_name,
                bytes: &image.bytes,
            })
            .collect()
    }
}

/// A finished in-memory archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Archive {
    pub filename: String,
    /// Paths of the entries inside the archive, in write order.
    pub entries: Vec<String>,
    pub bytes: Vec<u8>,
}

/// Build a ZIP of `entries`, named for the time `at`.
///
/// An empty `entries` list yields a valid, empty archive. Any failure aborts
/// the whole archive; there is no partial result.
pub fn build_archive(
    entries: &[ArchiveEntry<'_>],
    at: &NaiveDateTime,
) -> Result<Archive, ArchiveError> {
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL));

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let mut names = UniqueNames::new();
    let mut paths = Vec::with_capacity(entries.len());

    for entry in entries {
        let path = format!("{ARCHIVE_FOLDER}/{}", names.claim(entry.output_name));
        debug!(%path, size = entry.bytes.len(), "adding archive entry");
        zip.start_file(path.as_str(), options)?;
        zip.write_all(entry.bytes)?;
        paths.push(path);
    }

    let bytes = zip.finish()?.into_inner();
    let filename = naming::archive_filename(at);
    info!(
        %filename,
        entries = paths.len(),
        size = bytes.len(),
        "archive built"
    );

    Ok(Archive {
        filename,
        entries: paths,
        bytes,
    })
}
