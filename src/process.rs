//! Batch sequencing: run every source image through the pipeline, one at a time.
//!
//! ## Run States
//!
//! ```text
//! Idle ──run()──▶ Running ──all items done──▶ Completed
//!                    │
//!                    └──cancelled──▶ Idle
//! ```
//!
//! A second [`Sequencer::run`] while one is in flight is rejected with
//! [`ProcessError::AlreadyRunning`]; nothing is queued.
//!
//! ## Sequential Processing
//!
//! Items are processed strictly in input order, never in parallel. Only one
//! decoded raster and its two encode buffers are alive at any moment, which
//! bounds peak memory regardless of batch size.
//!
//! ## Outcomes
//!
//! Every input yields exactly one [`ProcessedResult`]:
//!
//! - **Success**: the re-encoded image.
//! - **Failed**: decode/encode error or per-item timeout; the batch goes on.
//! - **Cancelled**: the [`CancelToken`] fired before or during the item.
//!
//! ## Progress
//!
//! Progress is published as [`ProcessEvent`]s on an optional channel. All
//! events for item N are sent before item N+1 starts, and each item's
//! percentage only reaches 100 on its terminal event.

use crate::config::ProcessingSettings;
use crate::imaging::{BackendError, ImageBackend, process_image};
use crate::interrupt::{CancelToken, Interrupt, Interrupted};
use crate::types::{
    ImageId, Outcome, ProcessedImage, ProcessedResult, ProgressMap, SizeShortfall, SourceImage,
};
use std::collections::HashSet;
use std::sync::mpsc::Sender;
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProcessError {
    #[error("a batch is already running")]
    AlreadyRunning,
    #[error("duplicate image id in batch: {0}")]
    DuplicateId(ImageId),
}

/// Lifecycle of a [`Sequencer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    BatchStarted {
        total: usize,
    },
    ItemStarted {
        /// 1-based position in the batch.
        index: usize,
        total: usize,
        id: ImageId,
        name: String,
    },
    ItemProgress {
        id: ImageId,
        percent: u8,
    },
    ItemFinished {
        index: usize,
        id: ImageId,
        name: String,
        status: ItemStatus,
    },
    BatchFinished {
        succeeded: usize,
        failed: usize,
        cancelled: usize,
    },
}

/// Display-oriented summary of an item's outcome (no pixel data).
#[derive(Debug, Clone, PartialEq)]
pub enum ItemStatus {
    Succeeded {
        original_size: u64,
        encoded_size: u64,
        width: u32,
        height: u32,
        shortfall: Option<SizeShortfall>,
    },
    Failed {
        message: String,
    },
    Cancelled,
}

impl ItemStatus {
    fn of(outcome: &Outcome) -> Self {
        match outcome {
            Outcome::Success(image) => Self::Succeeded {
                original_size: image.original_size,
                encoded_size: image.encoded_size(),
                width: image.width,
                height: image.height,
                shortfall: image.shortfall,
            },
            Outcome::Failed { message } => Self::Failed {
                message: message.clone(),
            },
            Outcome::Cancelled => Self::Cancelled,
        }
    }
}

/// Everything a finished run produced.
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One entry per input, in input order.
    pub results: Vec<ProcessedResult>,
    pub progress: ProgressMap,
    /// State the sequencer settled in: `Completed`, or `Idle` if cancelled.
    pub state: RunState,
}

impl BatchReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &ProcessedImage> {
        self.results.iter().filter_map(ProcessedResult::processed)
    }

    pub fn failed(&self) -> impl Iterator<Item = &ProcessedResult> {
        self.results.iter().filter(|r| r.is_failed())
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failed()).count()
    }

    pub fn cancelled_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_cancelled()).count()
    }
}

/// Drives the per-image pipeline over a batch.
pub struct Sequencer<B: ImageBackend> {
    backend: B,
    state: Mutex<RunState>,
}

/// Restores the sequencer state when a run ends, including by panic.
struct RunGuard<'a> {
    state: &'a Mutex<RunState>,
    /// State before this run claimed the sequencer.
    previous: RunState,
    finish_as: RunState,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = self.finish_as;
    }
}

impl<B: ImageBackend> Sequencer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: Mutex::new(RunState::Idle),
        }
    }

    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn begin(&self) -> Result<RunGuard<'_>, ProcessError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state == RunState::Running {
            return Err(ProcessError::AlreadyRunning);
        }
        let previous = std::mem::replace(&mut *state, RunState::Running);
        Ok(RunGuard {
            state: &self.state,
            previous,
            finish_as: RunState::Idle,
        })
    }

    /// Process `images` in order and return one result per image.
    ///
    /// `settings` is taken by value: it is the snapshot for the whole run, so
    /// later changes by the caller cannot affect items still to come.
    pub fn run(
        &self,
        images: &[SourceImage],
        settings: ProcessingSettings,
        cancel: &CancelToken,
        events: Option<Sender<ProcessEvent>>,
    ) -> Result<BatchReport, ProcessError> {
        let mut guard = self.begin()?;
        let mut seen = HashSet::new();
        if let Some(dup) = images.iter().find(|img| !seen.insert(img.id())) {
            guard.finish_as = guard.previous;
            return Err(ProcessError::DuplicateId(dup.id().clone()));
        }

        let emit = |event: ProcessEvent| {
            if let Some(tx) = &events {
                // A dropped receiver only means nobody is watching.
                let _ = tx.send(event);
            }
        };

        let total = images.len();
        info!(
            total,
            width = ?settings.resize.target_width,
            height = ?settings.resize.target_height,
            quality = settings.resize.quality.value(),
            "batch started"
        );
        emit(ProcessEvent::BatchStarted { total });

        let mut progress = ProgressMap::new();
        let mut results = Vec::with_capacity(total);

        for (i, image) in images.iter().enumerate() {
            let id = image.id();
            let index = i + 1;
            progress.start(id);
            emit(ProcessEvent::ItemStarted {
                index,
                total,
                id: id.clone(),
                name: image.display_name().to_string(),
            });

            let outcome = if cancel.is_cancelled() {
                Outcome::Cancelled
            } else {
                self.process_one(image, &settings, cancel, &mut progress, &emit)
            };

            match &outcome {
                Outcome::Success(processed) => debug!(
                    %id,
                    size = processed.encoded_size(),
                    width = processed.width,
                    height = processed.height,
                    "item done"
                ),
                Outcome::Failed { message } => {
                    warn!(%id, name = image.display_name(), error = %message, "item failed")
                }
                Outcome::Cancelled => debug!(%id, "item cancelled"),
            }

            progress.finish(id);
            emit(ProcessEvent::ItemProgress {
                id: id.clone(),
                percent: 100,
            });
            emit(ProcessEvent::ItemFinished {
                index,
                id: id.clone(),
                name: image.display_name().to_string(),
                status: ItemStatus::of(&outcome),
            });

            results.push(ProcessedResult {
                id: id.clone(),
                name: image.display_name().to_string(),
                outcome,
            });
        }

        let report_state = if cancel.is_cancelled() {
            RunState::Idle
        } else {
            RunState::Completed
        };
        guard.finish_as = report_state;

        let report = BatchReport {
            results,
            progress,
            state: report_state,
        };
        info!(
            succeeded = report.success_count(),
            failed = report.failure_count(),
            cancelled = report.cancelled_count(),
            "batch finished"
        );
        emit(ProcessEvent::BatchFinished {
            succeeded: report.success_count(),
            failed: report.failure_count(),
            cancelled: report.cancelled_count(),
        });

        Ok(report)
    }

    fn process_one(
        &self,
        image: &SourceImage,
        settings: &ProcessingSettings,
        cancel: &CancelToken,
        progress: &mut ProgressMap,
        emit: &dyn Fn(ProcessEvent),
    ) -> Outcome {
        let id = image.id();
        let interrupt = Interrupt::start(cancel, settings.item_timeout);
        let mut on_progress = |fraction: f32| {
            let percent = (fraction.clamp(0.0, 1.0) * 100.0).round() as u8;
            if let Some(percent) = progress.advance(id, percent) {
                emit(ProcessEvent::ItemProgress {
                    id: id.clone(),
                    percent,
                });
            }
        };

        match process_image(
            &self.backend,
            image,
            &settings.resize,
            &interrupt,
            &mut on_progress,
        ) {
            Ok(processed) => Outcome::Success(processed),
            Err(BackendError::Interrupted(Interrupted::Cancelled)) => Outcome::Cancelled,
            Err(e) => Outcome::Failed {
                message: e.to_string(),
            },
        }
    }
}
