//! Repository error types.

use crate::domain::MalformedTime;

/// Errors raised by a schedule or stop repository.
///
/// The router never retries: these bubble to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// The backing store could not be reached or queried
    #[error("repository unavailable: {message}")]
    Unavailable { message: String },

    /// Stored data could not be decoded into typed records
    #[error("corrupt schedule data: {message}")]
    Corrupt { message: String },

    /// A stop time in the store is not a valid GTFS time
    #[error(transparent)]
    MalformedTime(#[from] MalformedTime),
}
