//! Cooperative progress reporting and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};

/// Progress/cancellation token polled by long-running operations.
///
/// Cancellation is cooperative: the engine checks [`Progress::canceled`]
/// between work batches and stops enqueueing further work, keeping whatever
/// was already produced.
pub trait Progress: Sync {
    fn set_range(&self, _min: i64, _max: i64) {}
    fn set_value(&self, _value: i64) {}
    fn set_text(&self, _text: &str) {}
    fn set_cancelable(&self, _cancelable: bool) {}
    fn set_modal(&self, _modal: bool) {}

    fn canceled(&self) -> bool {
        false
    }
}

/// Token that ignores progress and never cancels.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl Progress for NullProgress {}

/// Token cancelable from another thread.
#[derive(Debug, Default)]
pub struct CancelFlag {
    canceled: AtomicBool,
}

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_cancel(&self) {
        self.canceled.store(true, Ordering::Relaxed);
    }
}

impl Progress for CancelFlag {
    fn canceled(&self) -> bool {
        self.canceled.load(Ordering::Relaxed)
    }
}
