//! Cancellation and per-item deadlines.
//!
//! A [`CancelToken`] is shared between the caller and a running batch. The
//! sequencer checks it before each item; Stage B checks it between passes via
//! an [`Interrupt`], which also carries the item's deadline.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Cloneable cancellation flag. All clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Why work stopped early.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    #[error("cancelled")]
    Cancelled,
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

/// Stop conditions for one item: the batch token plus an optional deadline.
#[derive(Debug, Clone)]
pub struct Interrupt {
    token: CancelToken,
    deadline: Option<(Instant, Duration)>,
}

impl Interrupt {
    /// Start the clock for an item. `timeout = None` means no deadline.
    pub fn start(token: &CancelToken, timeout: Option<Duration>) -> Self {
        Self {
            token: token.clone(),
            deadline: timeout.map(|t| (Instant::now() + t, t)),
        }
    }

    /// An interrupt that never fires.
    pub fn never() -> Self {
        Self {
            token: CancelToken::new(),
            deadline: None,
        }
    }

    /// Cancellation wins over timeout when both apply.
    pub fn check(&self) -> Result<(), Interrupted> {
        if self.token.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }
        if let Some((at, limit)) = self.deadline {
            if Instant::now() >= at {
                return Err(Interrupted::TimedOut(limit));
            }
        }
        Ok(())
    }
}
