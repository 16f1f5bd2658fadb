//! Graph construction errors.

use crate::domain::StopId;
use crate::schedule::RepositoryError;

/// Errors raised while building a transit graph or its caches.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Following parent stations from `stop` never reaches a top-level stop
    #[error("station hierarchy contains a cycle through stop {stop}")]
    CyclicStationHierarchy { stop: StopId },

    /// The schedule store failed
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
