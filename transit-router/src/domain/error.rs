//! Domain error types.
//!
//! These errors represent validation failures when assembling paths and
//! itineraries. They are distinct from repository and search errors.

use super::StopId;

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Invalid leg construction (e.g., alight before board)
    #[error("invalid leg: {0}")]
    InvalidLeg(&'static str),

    /// A leg departs before the previous one arrives
    #[error("connection at {at} departs before the previous leg arrives")]
    MissedConnection { at: StopId },

    /// A route segment has no room for both a boarding and an alighting stop
    #[error("route segment needs at least two stops, got {stops}")]
    ShortSegment { stops: usize },

    /// Itinerary has no legs
    #[error("itinerary must have at least one leg")]
    EmptyItinerary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidLeg("alight must not be before board");
        assert_eq!(err.to_string(), "invalid leg: alight must not be before board");

        let err = DomainError::MissedConnection {
            at: StopId::from("B"),
        };
        assert_eq!(
            err.to_string(),
            "connection at B departs before the previous leg arrives"
        );

        let err = DomainError::ShortSegment { stops: 1 };
        assert_eq!(err.to_string(), "route segment needs at least two stops, got 1");

        let err = DomainError::EmptyItinerary;
        assert_eq!(err.to_string(), "itinerary must have at least one leg");
    }
}
