//! Cooperative cancellation for long-running searches.
//!
//! Searches poll a `SearchBudget` inside their main loops. A budget trips
//! either when its `CancellationToken` is cancelled from another thread or
//! when its deadline passes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use super::{SearchConfig, SearchError};

/// Shared flag a caller can flip to abort a running query.
///
/// Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Limits on a single query: an optional token and an optional deadline.
#[derive(Debug, Clone, Default)]
pub struct SearchBudget {
    token: Option<CancellationToken>,
    deadline: Option<Instant>,
}

impl SearchBudget {
    /// A budget that never trips.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// A budget with the configured timeout starting now.
    pub fn from_config(config: &SearchConfig) -> Self {
        match config.timeout() {
            Some(timeout) => Self::unlimited().with_timeout(timeout),
            None => Self::unlimited(),
        }
    }

    pub fn with_token(mut self, token: CancellationToken) -> Self {
        self.token = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Set the deadline `timeout` from now. Saturates if it would overflow.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        let now = Instant::now();
        let deadline = now.checked_add(timeout).unwrap_or(now + Duration::from_secs(86_400));
        self.with_deadline(deadline)
    }

    /// Returns `Err` once the query should stop.
    ///
    /// Cancellation wins over timeout when both apply.
    pub fn check(&self) -> Result<(), SearchError> {
        if self.token.as_ref().is_some_and(CancellationToken::is_cancelled) {
            return Err(SearchError::Cancelled);
        }
        if self.deadline.is_some_and(|d| Instant::now() >= d) {
            return Err(SearchError::Timeout);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlimited_never_trips() {
        assert!(SearchBudget::unlimited().check().is_ok());
        assert!(SearchBudget::from_config(&SearchConfig::default()).check().is_ok());
    }

    #[test]
    fn cancelled_token_trips_every_clone() {
        let token = CancellationToken::new();
        let budget = SearchBudget::unlimited().with_token(token.clone());
        assert!(budget.check().is_ok());

        token.cancel();
        assert!(token.is_cancelled());
        assert_eq!(budget.check(), Err(SearchError::Cancelled));
        assert_eq!(budget.clone().check(), Err(SearchError::Cancelled));
    }

    #[test]
    fn past_deadline_times_out() {
        let budget = SearchBudget::unlimited().with_deadline(Instant::now());
        assert_eq!(budget.check(), Err(SearchError::Timeout));

        let budget = SearchBudget::unlimited().with_timeout(Duration::from_secs(3600));
        assert!(budget.check().is_ok());
    }

    #[test]
    fn cancellation_reported_before_timeout() {
        let token = CancellationToken::new();
        token.cancel();
        let budget = SearchBudget::unlimited()
            .with_deadline(Instant::now())
            .with_token(token);
        assert_eq!(budget.check(), Err(SearchError::Cancelled));
    }

    #[test]
    fn zero_timeout_from_config() {
        let config = SearchConfig::new(3, 300, 5, 10, 5, Some(0));
        assert_eq!(SearchBudget::from_config(&config).check(), Err(SearchError::Timeout));
    }
}
