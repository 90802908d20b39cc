//! Shared types passed between the sequencer, the archive builder and callers.
//!
//! A [`SourceImage`] goes in, exactly one [`ProcessedResult`] comes out per
//! input, and a [`ProgressMap`] tracks each item from 0 to 100 along the way.

use crate::imaging::Quality;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Opaque, caller-generated identifier for one source image.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageId(String);

impl ImageId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A user-selected image. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    id: ImageId,
    display_name: String,
    mime_type: String,
    bytes: Vec<u8>,
    declared_size: Option<u64>,
}

impl SourceImage {
    pub fn new(
        id: ImageId,
        display_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            mime_type: mime_type.into(),
            bytes,
            declared_size: None,
        }
    }

    /// Record the size the caller reported for the original file, when it
    /// differs from the bytes handed over.
    pub fn with_declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }

    pub fn id(&self) -> &ImageId {
        &self.id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Original size in bytes: the declared size if one was given.
    pub fn byte_size(&self) -> u64 {
        self.declared_size.unwrap_or(self.bytes.len() as u64)
    }

    /// Whether the declared MIME type is an image type at all.
    pub fn claims_image(&self) -> bool {
        self.mime_type
            .split('/')
            .next()
            .is_some_and(|kind| kind.trim().eq_ignore_ascii_case("image"))
    }
}

/// Stage B could not get under its size cap; the result is best effort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeShortfall {
    pub limit: u64,
    pub actual: u64,
}

/// A successfully re-encoded image.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedImage {
    pub output_name: String,
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Quality the user asked for, not the one Stage B finished at.
    pub quality: Quality,
    pub original_size: u64,
    pub shortfall: Option<SizeShortfall>,
}

impl ProcessedImage {
    pub fn encoded_size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Terminal outcome for one item.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(ProcessedImage),
    Failed { message: String },
    /// The batch was cancelled before or while this item ran.
    Cancelled,
}

/// Exactly one of these exists per [`SourceImage`] after a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedResult {
    pub id: ImageId,
    /// Display name of the source, kept for reporting failures.
    pub name: String,
    pub outcome: Outcome,
}

impl ProcessedResult {
    pub fn processed(&self) -> Option<&ProcessedImage> {
        match &self.outcome {
            Outcome::Success(image) => Some(image),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, Outcome::Failed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.outcome, Outcome::Cancelled)
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            Outcome::Failed { message } => Some(message),
            _ => None,
        }
    }
}

/// Per-item progress percentages.
///
/// Values never decrease, and only [`finish`](Self::finish) sets 100, so a
/// value of 100 always means the item reached a terminal outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressMap {
    entries: HashMap<ImageId, u8>,
}

impl ProgressMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize an item at 0.
    pub fn start(&mut self, id: &ImageId) {
        self.entries.insert(id.clone(), 0);
    }

    /// Raise an item's progress, capped below 100.
    ///
    /// Returns the new value if it changed.
    pub fn advance(&mut self, id: &ImageId, percent: u8) -> Option<u8> {
        let capped = percent.min(99);
        let entry = self.entries.entry(id.clone()).or_insert(0);
        if capped > *entry {
            *entry = capped;
            Some(capped)
        } else {
            None
        }
    }

    /// Mark an item terminal.
    pub fn finish(&mut self, id: &ImageId) {
        self.entries.insert(id.clone(), 100);
    }

    pub fn get(&self, id: &ImageId) -> Option<u8> {
        self.entries.get(id).copied()
    }

    pub fn is_complete(&self, id: &ImageId) -> bool {
        self.get(id) == Some(100)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ImageId, u8)> {
        self.entries.iter().map(|(id, pct)| (id, *pct))
    }
}
