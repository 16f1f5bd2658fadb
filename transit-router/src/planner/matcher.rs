//! Attaching concrete trips to a route-level path.
//!
//! The pathfinder only knows which routes connect which stations. The
//! matcher walks the path segment by segment and picks a scheduled trip for
//! each one that boards after the previous segment's arrival plus the
//! minimum transfer time.
//!
//! The Nth option takes the Nth candidate at every segment independently.
//! This is not a joint search across legs, so a later option can miss a
//! connection an earlier candidate combination would have made.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::domain::{
    DirectionId, RouteId, ScheduledTrip, ServiceSet, ServiceTime, StopCall, StopId, TripId,
};
use crate::graph::{ParentStops, RouteEdge, TransitGraph};
use crate::schedule::ScheduleRepository;

use super::{ItineraryPath, RouteSegment, SearchBudget, SearchError};

/// One ride on a concrete trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripSegment {
    pub trip_id: TripId,
    pub route_id: RouteId,
    pub direction_id: DirectionId,
    pub headsign: Option<String>,
    pub board: StopCall,
    pub alight: StopCall,
    /// Calls strictly between board and alight, in travel order.
    pub intermediate_stops: Vec<StopCall>,
}

/// One timed realisation of a path: a trip for every segment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TripOption {
    pub segments: Vec<TripSegment>,
}

impl TripOption {
    /// Returns the first boarding time, or `None` for an empty option.
    pub fn departure_time(&self) -> Option<ServiceTime> {
        self.segments.first().map(|s| s.board.departure_time)
    }

    /// Returns the final alighting time, or `None` for an empty option.
    pub fn arrival_time(&self) -> Option<ServiceTime> {
        self.segments.last().map(|s| s.alight.arrival_time)
    }
}

/// Board and alight positions within one trip's stop times.
#[derive(Debug, Clone, Copy)]
struct Candidate<'a> {
    trip: &'a ScheduledTrip,
    board_idx: usize,
    alight_idx: usize,
}

impl Candidate<'_> {
    fn board_time(&self) -> ServiceTime {
        self.trip.stop_times[self.board_idx].departure_time
    }

    fn into_segment(self) -> TripSegment {
        ride_segment(self.trip, self.board_idx, self.alight_idx)
    }
}

/// The ride on `trip` from row `board_idx` to row `alight_idx`.
pub(super) fn ride_segment(trip: &ScheduledTrip, board_idx: usize, alight_idx: usize) -> TripSegment {
    let rows = &trip.stop_times;
    let call = |i: usize| {
        StopCall::new(
            rows[i].stop_id.clone(),
            rows[i].arrival_time,
            rows[i].departure_time,
        )
    };

    TripSegment {
        trip_id: trip.trip.id.clone(),
        route_id: trip.trip.route_id.clone(),
        direction_id: trip.trip.direction(),
        headsign: trip.trip.headsign.clone(),
        board: call(board_idx),
        alight: call(alight_idx),
        intermediate_stops: (board_idx + 1..alight_idx).map(call).collect(),
    }
}

/// Matches paths against the schedule for one set of services.
///
/// Trips are fetched once per (route, direction) and reused across every
/// segment and option the matcher handles.
pub struct TripMatcher<'a, S: ScheduleRepository + ?Sized> {
    schedule: &'a S,
    parents: &'a ParentStops,
    services: &'a ServiceSet,
    min_transfer_secs: u32,
    trips: HashMap<RouteEdge, Vec<ScheduledTrip>>,
}

impl<'a, S: ScheduleRepository + ?Sized> TripMatcher<'a, S> {
    pub fn new(
        schedule: &'a S,
        parents: &'a ParentStops,
        services: &'a ServiceSet,
        min_transfer_secs: u32,
    ) -> Self {
        Self {
            schedule,
            parents,
            services,
            min_transfer_secs,
            trips: HashMap::new(),
        }
    }

    /// Build up to `max_options` options for `path`, boarding strictly after
    /// `after`.
    ///
    /// Option `n` takes the `n`th candidate at every segment. Matching stops
    /// at the first option that cannot be completed, so fewer options than
    /// asked for is a normal outcome. A trivial path has no options.
    ///
    /// # Errors
    ///
    /// Returns the repository's error, or `Timeout`/`Cancelled` from `budget`.
    pub fn match_options(
        &mut self,
        path: &ItineraryPath,
        after: ServiceTime,
        max_options: usize,
        budget: &SearchBudget,
    ) -> Result<Vec<TripOption>, SearchError> {
        if path.is_trivial() {
            return Ok(Vec::new());
        }

        let mut options = Vec::new();
        for skip in 0..max_options {
            budget.check()?;
            match self.match_option(path, after, skip)? {
                Some(option) => options.push(option),
                None => {
                    debug!(option = skip, "No further trip options");
                    break;
                }
            }
        }
        Ok(options)
    }

    /// Build the option that takes the `skip`th candidate at each segment.
    ///
    /// Returns `Ok(None)` if any segment has too few candidates.
    pub fn match_option(
        &mut self,
        path: &ItineraryPath,
        after: ServiceTime,
        skip: usize,
    ) -> Result<Option<TripOption>, SearchError> {
        let mut earliest = after;
        let mut segments = Vec::with_capacity(path.segments.len());

        for segment in &path.segments {
            let Some(ride) = self.match_segment(segment, earliest, skip)? else {
                trace!(
                    route = %segment.route_id,
                    board = %segment.board_stop(),
                    after = %earliest,
                    skip,
                    "Segment has no matching trip"
                );
                return Ok(None);
            };
            earliest = ride.alight.arrival_time.add_seconds(self.min_transfer_secs);
            segments.push(ride);
        }

        Ok(Some(TripOption { segments }))
    }

    fn match_segment(
        &mut self,
        segment: &RouteSegment,
        earliest: ServiceTime,
        skip: usize,
    ) -> Result<Option<TripSegment>, SearchError> {
        let parents = self.parents;
        let trips = self.trips_for(segment)?;

        let mut candidates: Vec<Candidate<'_>> = trips
            .iter()
            .filter_map(|trip| {
                find_ride(trip, parents, segment.board_stop(), segment.alight_stop(), earliest)
            })
            .collect();
        candidates.sort_by(|a, b| {
            a.board_time()
                .cmp(&b.board_time())
                .then_with(|| a.trip.trip.id.cmp(&b.trip.trip.id))
        });

        Ok(candidates.into_iter().nth(skip).map(Candidate::into_segment))
    }

    fn trips_for(&mut self, segment: &RouteSegment) -> Result<&[ScheduledTrip], SearchError> {
        let key = RouteEdge::new(segment.route_id.clone(), segment.direction_id);
        if !self.trips.contains_key(&key) {
            let trips = self.schedule.trips_for_route_direction(
                &key.route_id,
                key.direction_id,
                self.services,
            )?;
            trace!(
                route = %key.route_id,
                direction = %key.direction_id,
                trips = trips.len(),
                "Loaded route trips"
            );
            self.trips.insert(key.clone(), trips);
        }
        Ok(self.trips.get(&key).map(|v| v.as_slice()).unwrap_or(&[]))
    }
}

/// Earliest boarding at `board` strictly after `earliest`, then the first
/// later call at `alight`.
fn find_ride<'t>(
    trip: &'t ScheduledTrip,
    parents: &ParentStops,
    board: &StopId,
    alight: &StopId,
    earliest: ServiceTime,
) -> Option<Candidate<'t>> {
    let rows = &trip.stop_times;
    let board_idx = rows.iter().position(|st| {
        st.departure_time > earliest && parents.is_under(&st.stop_id, board)
    })?;
    let alight_idx = rows[board_idx + 1..]
        .iter()
        .position(|st| parents.is_under(&st.stop_id, alight))
        .map(|offset| board_idx + 1 + offset)?;

    Some(Candidate {
        trip,
        board_idx,
        alight_idx,
    })
}

/// Match trips for `path` using the graph's parent-stop map.
///
/// # Errors
///
/// Returns the repository's error unchanged.
pub fn match_trips<S: ScheduleRepository + ?Sized>(
    schedule: &S,
    graph: &TransitGraph,
    path: &ItineraryPath,
    services: &ServiceSet,
    after: ServiceTime,
    max_options: usize,
    min_transfer_secs: u32,
) -> Result<Vec<TripOption>, SearchError> {
    TripMatcher::new(schedule, graph.parents(), services, min_transfer_secs).match_options(
        path,
        after,
        max_options,
        &SearchBudget::unlimited(),
    )
}
