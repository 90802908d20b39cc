//! # picsqueeze
//!
//! Batch-resize and compress images, then bundle the results into a single
//! ZIP archive.
//!
//! # Architecture: One Pipeline Per Image, One Image at a Time
//!
//! ```text
//! inputs ─▶ scan ─▶ Sequencer ─┬─▶ Fit ─▶ Rasterize ─▶ Stage A ─▶ Stage B ─┐
//!                              │          (per item, in order)             │
//!                              └────────────── results ◀───────────────────┘
//!                                                 │
//!                                                 ▼
//!                                          archive (successes only)
//! ```
//!
//! - **Fit** computes the canvas and the drawn rectangle from the source size
//!   and the target box. Pure arithmetic.
//! - **Rasterize** draws the source onto a white canvas.
//! - **Stage A** encodes the canvas as JPEG at the requested quality.
//! - **Stage B** re-compresses that blob until it fits the size cap, shrinking
//!   dimensions and quality a little on each pass.
//!
//! A failing item never stops the batch; it is reported and skipped by the
//! archive.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`imaging`] | Fit math, the [`ImageBackend`](imaging::ImageBackend) trait, and the pure-Rust backend |
//! | [`process`] | Batch sequencer: run state, progress events, per-item outcomes |
//! | [`archive`] | ZIP of the successful results |
//! | [`config`] | `picsqueeze.toml` loading, presets, validation |
//! | [`scan`] | Turn files and directories into source images |
//! | [`types`] | Shared types: `SourceImage`, `ProcessedResult`, `ProgressMap` |
//! | [`interrupt`] | Cancellation token and per-item deadlines |
//! | [`naming`] | Output, entry and archive file names |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Sequential, Not Parallel
//!
//! Decoded rasters are large. Processing strictly one item at a time keeps
//! peak memory at a single image's working set no matter how many images are
//! queued, and makes progress reporting trivially ordered.
//!
//! ## JPEG-Only Output
//!
//! Every output is a JPEG, whatever the input format. Transparent inputs are
//! flattened onto the white canvas, and output names always end in `.jpg`.
//!
//! ## Best-Effort Size Cap
//!
//! When Stage B runs out of passes above the cap, the smallest result it
//! reached is kept and flagged with a
//! [`SizeShortfall`](types::SizeShortfall) instead of failing the item.

pub mod archive;
pub mod config;
pub mod imaging;
pub mod interrupt;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
