use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use personsearch_core::error::{Result, SearchError};

/// Caller-owned cancellation handle, checked by the coordinator between phases.
///
/// Clones share the same flag, so one clone can be handed to another thread
/// and used to abort a search running on this one.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self { Self::default() }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { flag: Arc::new(AtomicBool::new(false)), deadline: Some(Instant::now() + timeout) }
    }

    pub fn cancel(&self) { self.flag.store(true, Ordering::SeqCst); }

    pub fn is_cancelled(&self) -> bool { self.flag.load(Ordering::SeqCst) }

    pub fn is_expired(&self) -> bool { self.deadline.is_some_and(|d| Instant::now() >= d) }

    /// `Cancelled` on explicit cancellation, `IndexUnavailable` once the
    /// deadline has passed.
    pub fn check(&self, stage: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(SearchError::Cancelled(stage.to_string()));
        }
        if self.is_expired() {
            return Err(SearchError::IndexUnavailable(format!("timed out before {stage}")));
        }
        Ok(())
    }
}
