//! CLI output formatting.
//!
//! # Output Format
//!
//! ```text
//! Squeezing 3 images
//! 001 beach.jpg
//!     2.4 MB → 312.5 KB (87.3% smaller), 1080x1080
//! 002 notes.txt
//!     Failed: Decode failed: unsupported type 'application/octet-stream'
//! 003 huge.tiff
//!     14.2 MB → 10.3 MB (27.5% smaller), 1080x1080
//!     Over size cap: 10.3 MB > 10 MB
//!
//! Done: 2 squeezed, 1 failed, 0 cancelled
//! Saved 6.3 MB (38.6% reduction)
//! Archive: picsqueeze-2026-10-16T09-30-00.zip (2 files, 10.6 MB)
//! ```
//!
//! Items lead with their 1-based position and display name; results follow as
//! indented context lines. Per-pass progress is not printed.
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::archive::Archive;
use crate::process::{BatchReport, ItemStatus, ProcessEvent};
use crate::types::Outcome;
use serde::Serialize;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Human-readable size with 1024-based units and at most one decimal.
///
/// ```text
/// 0        → 0 Bytes
/// 1536     → 1.5 KB
/// 10485760 → 10 MB
/// ```
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let rounded = (value * 10.0).round() / 10.0;
    if rounded.fract() == 0.0 {
        format!("{} {}", rounded as u64, UNITS[unit])
    } else {
        format!("{:.1} {}", rounded, UNITS[unit])
    }
}

/// Percentage saved going from `original` to `compressed` bytes.
///
/// Negative when the output grew; 0 for an empty original.
pub fn compression_ratio(original: u64, compressed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    (original as f64 - compressed as f64) / original as f64 * 100.0
}

fn describe_change(original: u64, encoded: u64) -> String {
    let ratio = compression_ratio(original, encoded);
    let direction = if ratio >= 0.0 { "smaller" } else { "larger" };
    format!(
        "{} → {} ({:.1}% {})",
        format_file_size(original),
        format_file_size(encoded),
        ratio.abs(),
        direction
    )
}

// ============================================================================
// Progress events
// ============================================================================

/// Format a single progress event as display lines.
///
/// Item start and per-pass progress produce no lines; an item is printed
/// once, when its outcome is known.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::BatchStarted { total } => {
            let noun = if *total == 1 { "image" } else { "images" };
            vec![format!("Squeezing {total} {noun}")]
        }
        ProcessEvent::ItemStarted { .. } | ProcessEvent::ItemProgress { .. } => Vec::new(),
        ProcessEvent::ItemFinished {
            index,
            name,
            status,
            ..
        } => {
            let mut lines = vec![format!("{} {}", format_index(*index), name)];
            match status {
                ItemStatus::Succeeded {
                    original_size,
                    encoded_size,
                    width,
                    height,
                    shortfall,
                } => {
                    lines.push(format!(
                        "    {}, {}x{}",
                        describe_change(*original_size, *encoded_size),
                        width,
                        height
                    ));
                    if let Some(shortfall) = shortfall {
                        lines.push(format!(
                            "    Over size cap: {} > {}",
                            format_file_size(shortfall.actual),
                            format_file_size(shortfall.limit)
                        ));
                    }
                }
                ItemStatus::Failed { message } => lines.push(format!("    Failed: {message}")),
                ItemStatus::Cancelled => lines.push("    Cancelled".to_string()),
            }
            lines
        }
        ProcessEvent::BatchFinished {
            succeeded,
            failed,
            cancelled,
        } => vec![
            String::new(),
            format!("Done: {succeeded} squeezed, {failed} failed, {cancelled} cancelled"),
        ],
    }
}

pub fn print_process_event(event: &ProcessEvent) {
    for line in format_process_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Batch summary
// ============================================================================

/// Machine-readable summary of a run, printed with `--json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Source bytes of the successful items.
    pub original_bytes: u64,
    /// Output bytes of the successful items.
    pub encoded_bytes: u64,
    pub reduction_percent: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive: Option<ArchiveSummary>,
    pub items: Vec<ItemSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArchiveSummary {
    pub filename: String,
    pub entries: usize,
    pub bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSummary {
    pub id: String,
    pub name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encoded_size: Option<u64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub over_size_cap: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchSummary {
    pub fn new(report: &BatchReport, archive: Option<&Archive>) -> Self {
        let original_bytes = report.succeeded().map(|img| img.original_size).sum();
        let encoded_bytes = report.succeeded().map(|img| img.encoded_size()).sum();

        let items = report
            .results
            .iter()
            .map(|result| {
                let mut item = ItemSummary {
                    id: result.id.to_string(),
                    name: result.name.clone(),
                    status: "",
                    output_name: None,
                    width: None,
                    height: None,
                    encoded_size: None,
                    over_size_cap: false,
                    error: None,
                };
                match &result.outcome {
                    Outcome::Success(img) => {
                        item.status = "success";
                        item.output_name = Some(img.output_name.clone());
                        item.width = Some(img.width);
                        item.height = Some(img.height);
                        item.encoded_size = Some(img.encoded_size());
                        item.over_size_cap = img.shortfall.is_some();
                    }
                    Outcome::Failed { message } => {
                        item.status = "failed";
                        item.error = Some(message.clone());
                    }
                    Outcome::Cancelled => item.status = "cancelled",
                }
                item
            })
            .collect();

        Self {
            total: report.results.len(),
            succeeded: report.success_count(),
            failed: report.failure_count(),
            cancelled: report.cancelled_count(),
            original_bytes,
            encoded_bytes,
            reduction_percent: compression_ratio(original_bytes, encoded_bytes),
            archive: archive.map(|a| ArchiveSummary {
                filename: a.filename.clone(),
                entries: a.entries.len(),
                bytes: a.bytes.len() as u64,
            }),
            items,
        }
    }
}

/// Totals and archive lines shown after the per-item output.
pub fn format_batch_summary(summary: &BatchSummary) -> Vec<String> {
    let mut lines = Vec::new();
    if summary.succeeded > 0 {
        let saved = summary.original_bytes.saturating_sub(summary.encoded_bytes);
        lines.push(format!(
            "Saved {} ({:.1}% reduction)",
            format_file_size(saved),
            summary.reduction_percent.max(0.0)
        ));
    }
    match &summary.archive {
        Some(archive) => {
            let noun = if archive.entries == 1 { "file" } else { "files" };
            lines.push(format!(
                "Archive: {} ({} {}, {})",
                archive.filename,
                archive.entries,
                noun,
                format_file_size(archive.bytes)
            ));
        }
        None if summary.succeeded == 0 => {
            lines.push("No images were squeezed; no archive written".to_string());
        }
        None => {}
    }
    lines
}

pub fn print_batch_summary(summary: &BatchSummary) {
    for line in format_batch_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Presets
// ============================================================================

/// One line per preset: id, box, description.
pub fn format_presets() -> Vec<String> {
    use crate::config::Preset;
    Preset::ALL
        .iter()
        .map(|preset| {
            let size = match preset.dimensions() {
                Some((w, h)) => format!("{w}x{h}"),
                None => "-".to_string(),
            };
            format!(
                "{:<10} {:>9}  {}: {}",
                preset.id(),
                size,
                preset.label(),
                preset.description()
            )
        })
        .collect()
}

pub fn print_presets() {
    for line in format_presets() {
        println!("{}", line);
    }
}
