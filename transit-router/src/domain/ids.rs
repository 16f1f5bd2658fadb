//! Identifier types for schedule records.
//!
//! GTFS identifiers are opaque strings. Each kind of record gets its own
//! newtype so a stop id can never be passed where a trip id is expected.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from any string-like value.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Identifier of a stop, platform, entrance or parent station.
    StopId
);
string_id!(
    /// Identifier of a route.
    RouteId
);
string_id!(
    /// Identifier of a single scheduled trip.
    TripId
);
string_id!(
    /// Identifier of a day-type service pattern (e.g. "weekday").
    ServiceId
);

/// GTFS `direction_id`: which way along a route a trip travels.
///
/// Feeds may omit it; trips without one are treated as direction 0.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct DirectionId(pub u8);

impl fmt::Display for DirectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The set of services active on one calendar date.
///
/// Ordered so that two equal sets always hash and compare the same, which
/// makes it usable as a cache key for per-day graphs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceSet(BTreeSet<ServiceId>);

impl ServiceSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a service, returning `false` if it was already present.
    pub fn insert(&mut self, id: ServiceId) -> bool {
        self.0.insert(id)
    }

    /// Removes a service, returning `true` if it was present.
    pub fn remove(&mut self, id: &ServiceId) -> bool {
        self.0.remove(id)
    }

    /// Returns true if the service is active.
    pub fn contains(&self, id: &ServiceId) -> bool {
        self.0.contains(id)
    }

    /// Returns the number of active services.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if nothing runs.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the services in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &ServiceId> {
        self.0.iter()
    }
}

impl FromIterator<ServiceId> for ServiceSet {
    fn from_iter<I: IntoIterator<Item = ServiceId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for ServiceSet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        iter.into_iter().map(ServiceId::from).collect()
    }
}
