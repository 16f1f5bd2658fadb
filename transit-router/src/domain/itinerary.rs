//! Itinerary types.
//!
//! An `Itinerary` is a complete, time-feasible trip from origin to
//! destination: one `Leg` per boarded vehicle and one `Transfer` at every
//! boundary between legs.

use chrono::Duration;
use serde::Serialize;

use super::{DirectionId, DomainError, RouteId, ServiceTime, StopId, TripId};

/// A timed stop along a leg.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopCall {
    pub stop_id: StopId,
    pub arrival_time: ServiceTime,
    pub departure_time: ServiceTime,
}

impl StopCall {
    /// Creates a stop call.
    pub fn new(stop_id: StopId, arrival_time: ServiceTime, departure_time: ServiceTime) -> Self {
        Self {
            stop_id,
            arrival_time,
            departure_time,
        }
    }
}

/// One continuous ride on a single trip.
///
/// # Invariants
///
/// - The alighting arrival is not before the boarding departure
/// - Intermediate stops are in travel order, strictly between board and alight
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Leg {
    trip_id: TripId,
    route_id: RouteId,
    direction_id: DirectionId,
    headsign: Option<String>,
    board: StopCall,
    alight: StopCall,
    intermediate_stops: Vec<StopCall>,
}

impl Leg {
    /// Construct a leg, validating that it moves forward in time.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the alighting arrival precedes the boarding departure.
    pub fn new(
        trip_id: TripId,
        route_id: RouteId,
        direction_id: DirectionId,
        headsign: Option<String>,
        board: StopCall,
        alight: StopCall,
        intermediate_stops: Vec<StopCall>,
    ) -> Result<Self, DomainError> {
        if alight.arrival_time < board.departure_time {
            return Err(DomainError::InvalidLeg("alight must not be before board"));
        }

        Ok(Self {
            trip_id,
            route_id,
            direction_id,
            headsign,
            board,
            alight,
            intermediate_stops,
        })
    }

    /// Returns the trip ridden on this leg.
    pub fn trip_id(&self) -> &TripId {
        &self.trip_id
    }

    /// Returns the route of the trip.
    pub fn route_id(&self) -> &RouteId {
        &self.route_id
    }

    /// Returns the direction of the trip.
    pub fn direction_id(&self) -> DirectionId {
        self.direction_id
    }

    /// Returns the headsign shown on the vehicle, if any.
    pub fn headsign(&self) -> Option<&str> {
        self.headsign.as_deref()
    }

    /// Returns the boarding stop call.
    pub fn board(&self) -> &StopCall {
        &self.board
    }

    /// Returns the alighting stop call.
    pub fn alight(&self) -> &StopCall {
        &self.alight
    }

    /// Returns the stops passed between boarding and alighting.
    pub fn intermediate_stops(&self) -> &[StopCall] {
        &self.intermediate_stops
    }

    /// Returns the boarding departure time.
    pub fn departure_time(&self) -> ServiceTime {
        self.board.departure_time
    }

    /// Returns the alighting arrival time.
    pub fn arrival_time(&self) -> ServiceTime {
        self.alight.arrival_time
    }

    /// Returns the in-vehicle time in seconds.
    pub fn duration_secs(&self) -> u32 {
        self.arrival_time().as_seconds() - self.departure_time().as_seconds()
    }

    /// Returns the in-vehicle time.
    pub fn duration(&self) -> Duration {
        Duration::seconds(i64::from(self.duration_secs()))
    }
}

/// The gap between two consecutive legs.
///
/// `from_stop` and `to_stop` may differ when the change happens between
/// platforms of the same station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transfer {
    pub from_stop: StopId,
    pub to_stop: StopId,
    pub arrival_time: ServiceTime,
    pub departure_time: ServiceTime,
    pub wait_secs: u32,
}

impl Transfer {
    /// Returns the waiting time.
    pub fn wait(&self) -> Duration {
        Duration::seconds(i64::from(self.wait_secs))
    }
}

/// A complete itinerary from origin to destination.
///
/// # Invariants
///
/// - At least one leg
/// - Each leg boards no earlier than the previous leg alights
/// - `transfers.len() == legs.len() - 1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Itinerary {
    legs: Vec<Leg>,
    transfers: Vec<Transfer>,
    departure_time: ServiceTime,
    arrival_time: ServiceTime,
    total_duration_secs: u32,
    in_vehicle_secs: u32,
    waiting_secs: u32,
    number_of_transfers: usize,
}

impl Itinerary {
    /// Builds an itinerary from legs in travel order, deriving the transfers
    /// and summary statistics.
    ///
    /// # Errors
    ///
    /// Returns `Err` if there are no legs or a leg departs before the
    /// previous one arrives.
    pub fn from_legs(legs: Vec<Leg>) -> Result<Self, DomainError> {
        let (Some(first), Some(last)) = (legs.first(), legs.last()) else {
            return Err(DomainError::EmptyItinerary);
        };
        let departure_time = first.departure_time();
        let arrival_time = last.arrival_time();

        let mut transfers = Vec::with_capacity(legs.len().saturating_sub(1));
        for pair in legs.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.departure_time() < prev.arrival_time() {
                return Err(DomainError::MissedConnection {
                    at: prev.alight.stop_id.clone(),
                });
            }
            transfers.push(Transfer {
                from_stop: prev.alight.stop_id.clone(),
                to_stop: next.board.stop_id.clone(),
                arrival_time: prev.arrival_time(),
                departure_time: next.departure_time(),
                wait_secs: next.departure_time().as_seconds() - prev.arrival_time().as_seconds(),
            });
        }

        let in_vehicle_secs = legs.iter().map(Leg::duration_secs).sum();
        let waiting_secs = transfers.iter().map(|t| t.wait_secs).sum();
        let number_of_transfers = legs.len() - 1;

        Ok(Self {
            total_duration_secs: arrival_time.as_seconds() - departure_time.as_seconds(),
            legs,
            transfers,
            departure_time,
            arrival_time,
            in_vehicle_secs,
            waiting_secs,
            number_of_transfers,
        })
    }

    /// Returns all legs in order.
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Returns the transfers between legs, in order.
    pub fn transfers(&self) -> &[Transfer] {
        &self.transfers
    }

    /// Returns the departure time of the first leg.
    pub fn departure_time(&self) -> ServiceTime {
        self.departure_time
    }

    /// Returns the arrival time of the last leg.
    pub fn arrival_time(&self) -> ServiceTime {
        self.arrival_time
    }

    /// Returns the number of transfers (legs - 1).
    pub fn number_of_transfers(&self) -> usize {
        self.number_of_transfers
    }

    /// Returns the door-to-door duration in seconds.
    pub fn total_duration_secs(&self) -> u32 {
        self.total_duration_secs
    }

    /// Returns the door-to-door duration.
    pub fn total_duration(&self) -> Duration {
        Duration::seconds(i64::from(self.total_duration_secs))
    }

    /// Returns the summed leg durations.
    pub fn in_vehicle_time(&self) -> Duration {
        Duration::seconds(i64::from(self.in_vehicle_secs))
    }

    /// Returns the summed transfer waits.
    pub fn waiting_time(&self) -> Duration {
        Duration::seconds(i64::from(self.waiting_secs))
    }

    /// Returns the boarding stop of the first leg.
    pub fn origin(&self) -> &StopId {
        // Safe: validated non-empty at construction
        &self.legs[0].board.stop_id
    }

    /// Returns the alighting stop of the last leg.
    pub fn destination(&self) -> &StopId {
        &self.legs[self.legs.len() - 1].alight.stop_id
    }

    /// Returns true if this itinerary needs no transfers.
    pub fn is_direct(&self) -> bool {
        self.number_of_transfers == 0
    }

    /// Returns the trips boarded, in order.
    pub fn trip_ids(&self) -> impl Iterator<Item = &TripId> {
        self.legs.iter().map(Leg::trip_id)
    }
}
