//! Cooperative cancellation for long runs.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared flag checked by workers before each batch and after each trial.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// Stop condition for one run: external token plus optional wall-clock deadline.
#[derive(Debug, Clone)]
pub(crate) struct StopSignal {
    token: CancelToken,
    deadline: Option<Instant>,
}

impl StopSignal {
    pub(crate) fn new(token: CancelToken, deadline_ms: Option<u64>) -> Self {
        let deadline = deadline_ms.and_then(|ms| Instant::now().checked_add(Duration::from_millis(ms)));
        Self { token, deadline }
    }

    pub(crate) fn should_stop(&self) -> bool {
        self.token.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}
