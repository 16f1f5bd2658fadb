//! Search configuration for the itinerary planner.

use chrono::Duration;
use serde::Deserialize;

/// Configuration parameters for itinerary search.
///
/// Every field has a default, so a host can deserialize a partial JSON
/// object and get the rest filled in.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Maximum number of transfers allowed.
    pub max_transfers: usize,

    /// Minimum time between alighting one vehicle and boarding the next
    /// (seconds). Connections tighter than this are rejected.
    pub min_transfer_secs: u32,

    /// Maximum number of itineraries to return.
    pub max_results: usize,

    /// Maximum number of route segments a partial path may accumulate
    /// while searching the topology graph.
    pub max_search_depth: usize,

    /// Transfer edges kept per arrival in the time-expanded graph.
    /// Only the earliest feasible departures at the same stop are linked.
    pub transfer_candidates: usize,

    /// Wall-clock budget for one query (milliseconds). `None` means no limit.
    pub timeout_ms: Option<u64>,
}

impl SearchConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(
        max_transfers: usize,
        min_transfer_secs: u32,
        max_results: usize,
        max_search_depth: usize,
        transfer_candidates: usize,
        timeout_ms: Option<u64>,
    ) -> Self {
        Self {
            max_transfers,
            min_transfer_secs,
            max_results,
            max_search_depth,
            transfer_candidates,
            timeout_ms,
        }
    }

    /// Returns the minimum transfer time as a Duration.
    pub fn min_transfer(&self) -> Duration {
        Duration::seconds(i64::from(self.min_transfer_secs))
    }

    /// Returns the query timeout, if any.
    pub fn timeout(&self) -> Option<std::time::Duration> {
        self.timeout_ms.map(std::time::Duration::from_millis)
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_transfers: 3,
            min_transfer_secs: 300, // 5 minutes
            max_results: 5,
            max_search_depth: 10,
            transfer_candidates: 5,
            timeout_ms: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SearchConfig::default();

        assert_eq!(config.max_transfers, 3);
        assert_eq!(config.min_transfer_secs, 300);
        assert_eq!(config.max_results, 5);
        assert_eq!(config.max_search_depth, 10);
        assert_eq!(config.transfer_candidates, 5);
        assert_eq!(config.timeout_ms, None);
    }

    #[test]
    fn duration_methods() {
        let config = SearchConfig::default();

        assert_eq!(config.min_transfer(), Duration::minutes(5));
        assert_eq!(config.timeout(), None);

        let config = SearchConfig::new(3, 300, 5, 10, 5, Some(1500));
        assert_eq!(config.timeout(), Some(std::time::Duration::from_millis(1500)));
    }

    #[test]
    fn custom_config() {
        let config = SearchConfig::new(1, 120, 2, 4, 3, None);

        assert_eq!(config.max_transfers, 1);
        assert_eq!(config.min_transfer_secs, 120);
        assert_eq!(config.max_results, 2);
        assert_eq!(config.max_search_depth, 4);
        assert_eq!(config.transfer_candidates, 3);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: SearchConfig =
            serde_json::from_str(r#"{"max_transfers": 1, "timeout_ms": 250}"#).unwrap();

        assert_eq!(config.max_transfers, 1);
        assert_eq!(config.timeout_ms, Some(250));
        assert_eq!(config.min_transfer_secs, 300);
        assert_eq!(config.max_results, 5);
    }
}
