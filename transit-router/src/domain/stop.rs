//! Stop records.

use serde::{Deserialize, Serialize};

use super::StopId;

/// A stop, platform, entrance or station from the schedule feed.
///
/// Child stops (platforms, entrances) point at their station through
/// `parent_station`. Following that chain must terminate; a cycle is a feed
/// defect reported when the hierarchy is resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: StopId,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub parent_station: Option<StopId>,
}

impl Stop {
    /// Creates a top-level stop with no parent station.
    pub fn new(id: impl Into<StopId>, name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            lat,
            lon,
            parent_station: None,
        }
    }

    /// Places this stop under a parent station.
    pub fn with_parent(mut self, parent: impl Into<StopId>) -> Self {
        self.parent_station = Some(parent.into());
        self
    }

    /// Returns true if this stop has no parent station.
    pub fn is_top_level(&self) -> bool {
        self.parent_station.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_parent() {
        let platform = Stop::new("P1", "Central platform 1", 51.5, -0.1).with_parent("CENTRAL");
        assert_eq!(platform.parent_station, Some(StopId::from("CENTRAL")));
        assert!(!platform.is_top_level());
        assert!(Stop::new("CENTRAL", "Central", 51.5, -0.1).is_top_level());
    }

    #[test]
    fn deserializes_without_parent() {
        let stop: Stop =
            serde_json::from_str(r#"{"id":"A","name":"Alpha","lat":1.0,"lon":2.0}"#).unwrap();
        assert_eq!(stop.id, StopId::from("A"));
        assert!(stop.parent_station.is_none());
    }
}
