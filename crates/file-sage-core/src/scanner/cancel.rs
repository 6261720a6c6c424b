use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Cooperative cancellation shared between a caller and scan workers.
///
/// Workers poll [`CancelToken::is_cancelled`] between entries, so a cancelled
/// scan stops after the file it is currently looking at. Clones share the
/// flag; a deadline only applies to the token it was attached to.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token sharing this one's flag that also expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        };
        Self {
            flag: Arc::clone(&self.flag),
            deadline: Some(deadline),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.flag.load(Ordering::Relaxed) {
            return true;
        }
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancelToken::new();
        let worker = token.clone();
        assert!(!worker.is_cancelled());
        token.cancel();
        assert!(worker.is_cancelled());
    }

    #[test]
    fn test_expired_deadline_cancels_derived_token_only() {
        let token = CancelToken::new();
        let expired = token.with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(expired.is_cancelled());
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_derived_token_keeps_earliest_deadline() {
        let token = CancelToken::new().with_deadline(Instant::now() - Duration::from_millis(1));
        let relaxed = token.with_timeout(Duration::from_secs(3600));
        assert!(relaxed.is_cancelled());
    }
}
