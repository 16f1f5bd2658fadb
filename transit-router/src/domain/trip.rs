//! Route, trip and stop-time records.

use serde::{Deserialize, Serialize};

use super::{DirectionId, RouteId, ServiceId, ServiceTime, StopId, TripId};

/// A route as published in the feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: RouteId,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub long_name: Option<String>,
}

impl Route {
    /// Creates a route with only an id.
    pub fn new(id: impl Into<RouteId>) -> Self {
        Self {
            id: id.into(),
            short_name: None,
            long_name: None,
        }
    }
}

/// A single scheduled run of a vehicle along a route.
///
/// Belongs to exactly one route and one service pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: TripId,
    pub route_id: RouteId,
    pub service_id: ServiceId,
    #[serde(default)]
    pub direction_id: Option<DirectionId>,
    #[serde(default)]
    pub headsign: Option<String>,
}

impl Trip {
    /// Creates a trip with no direction or headsign.
    pub fn new(
        id: impl Into<TripId>,
        route_id: impl Into<RouteId>,
        service_id: impl Into<ServiceId>,
    ) -> Self {
        Self {
            id: id.into(),
            route_id: route_id.into(),
            service_id: service_id.into(),
            direction_id: None,
            headsign: None,
        }
    }

    /// Sets the direction.
    pub fn with_direction(mut self, direction: u8) -> Self {
        self.direction_id = Some(DirectionId(direction));
        self
    }

    /// Sets the headsign.
    pub fn with_headsign(mut self, headsign: impl Into<String>) -> Self {
        self.headsign = Some(headsign.into());
        self
    }

    /// Returns the direction, defaulting to 0 when the feed omits it.
    pub fn direction(&self) -> DirectionId {
        self.direction_id.unwrap_or_default()
    }
}

/// One stop on one trip.
///
/// `stop_sequence` orders rows within a trip; values are trip-local and need
/// not be contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTime {
    pub trip_id: TripId,
    pub stop_id: StopId,
    pub stop_sequence: u32,
    pub arrival_time: ServiceTime,
    pub departure_time: ServiceTime,
}

impl StopTime {
    /// Creates a stop time.
    pub fn new(
        trip_id: impl Into<TripId>,
        stop_id: impl Into<StopId>,
        stop_sequence: u32,
        arrival_time: ServiceTime,
        departure_time: ServiceTime,
    ) -> Self {
        Self {
            trip_id: trip_id.into(),
            stop_id: stop_id.into(),
            stop_sequence,
            arrival_time,
            departure_time,
        }
    }
}

/// A trip together with its stop times, sorted by `stop_sequence`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledTrip {
    pub trip: Trip,
    pub stop_times: Vec<StopTime>,
}

impl ScheduledTrip {
    /// Returns the first departure of the trip, if it has any stops.
    pub fn first_departure(&self) -> Option<ServiceTime> {
        self.stop_times.first().map(|st| st.departure_time)
    }
}
