use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Maximum iterations of any single loop before it is stopped.
pub const DEFAULT_ITERATION_CAP: u64 = 10_000;

/// Shared flag that stops a run from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        CancelToken::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Limits applied while a program runs.
///
/// The iteration cap applies to each loop on its own, so nested loops can
/// run up to `cap^depth` iterations in total. `time_limit` and `cancel` are
/// checked once per loop iteration.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub iteration_cap: u64,
    pub time_limit: Option<Duration>,
    pub cancel: Option<CancelToken>,
}

impl Default for RunConfig {
    fn default() -> Self {
        RunConfig {
            iteration_cap: DEFAULT_ITERATION_CAP,
            time_limit: None,
            cancel: None,
        }
    }
}

impl RunConfig {
    pub fn with_iteration_cap(mut self, cap: u64) -> Self {
        self.iteration_cap = cap;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit = Some(limit);
        self
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }
}
