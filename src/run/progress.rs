use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Points in a run a progress display may want to know about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent<'a> {
    /// Emitted once, before any file is dispatched.
    Started { total: usize },
    Inspected { file: &'a str },
    /// The file has offenses the allow-list doesn't cover, or could not be processed.
    Failed { file: &'a str },
    Interrupted,
    Finished { inspected: usize },
}

/// Receives events from worker threads; implementations must be thread-safe.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent<'_>);
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _event: ProgressEvent<'_>) {}
}

/// Shared cancellation flag. Setting it stops new files from being
/// dispatched; files already started run to completion.
#[derive(Debug, Clone, Default)]
pub struct InterruptFlag(Arc<AtomicBool>);

impl InterruptFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}
