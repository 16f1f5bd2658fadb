//! Search errors.

use crate::domain::{MalformedTime, StopId};
use crate::graph::GraphError;
use crate::schedule::RepositoryError;

/// Error from itinerary search.
///
/// "No route" and "no trip fits" are not errors; they come back as empty
/// results.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    /// The stop is not on any route running that day
    #[error("stop {stop} is not served on this date")]
    StopNotInGraph { stop: StopId },

    /// The query ran past its deadline
    #[error("search timed out")]
    Timeout,

    /// The caller cancelled the query
    #[error("search cancelled")]
    Cancelled,

    /// Graph construction failed
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// The schedule store failed
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// A query or schedule time could not be parsed
    #[error(transparent)]
    MalformedTime(#[from] MalformedTime),
}
