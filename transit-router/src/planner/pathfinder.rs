//! Shortest route-level path over the topology graph.
//!
//! Every edge weighs one hop, so the search is Dijkstra degenerating to a
//! breadth-first expansion. Ties are broken by stop id, which keeps results
//! reproducible between runs.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use serde::Serialize;
use tracing::{debug, trace};

use crate::domain::{DirectionId, DomainError, RouteId, StopId};
use crate::graph::{RouteEdge, TransitGraph};

use super::{SearchBudget, SearchError};

/// A maximal run of hops on one (route, direction).
///
/// # Invariants
///
/// - At least two stops, so there is always a boarding and an alighting stop
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteSegment {
    pub route_id: RouteId,
    pub direction_id: DirectionId,
    /// Parent stops visited, boarding stop first, alighting stop last.
    stops: Vec<StopId>,
}

impl RouteSegment {
    /// Creates a segment riding `route_id` through `stops` in order.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::ShortSegment` if fewer than two stops are given.
    pub fn new(
        route_id: impl Into<RouteId>,
        direction_id: DirectionId,
        stops: Vec<StopId>,
    ) -> Result<Self, DomainError> {
        if stops.len() < 2 {
            return Err(DomainError::ShortSegment { stops: stops.len() });
        }
        Ok(Self {
            route_id: route_id.into(),
            direction_id,
            stops,
        })
    }

    /// Returns the parent stop where the segment is boarded.
    pub fn board_stop(&self) -> &StopId {
        &self.stops[0]
    }

    /// Returns the parent stop where the segment is left.
    pub fn alight_stop(&self) -> &StopId {
        &self.stops[self.stops.len() - 1]
    }

    /// Returns every parent stop on the segment, in travel order.
    pub fn stops(&self) -> &[StopId] {
        &self.stops
    }

    /// Returns the number of graph edges the segment covers.
    pub fn hop_count(&self) -> usize {
        self.stops.len() - 1
    }
}

/// A path through the route graph with no times attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItineraryPath {
    pub origin: StopId,
    pub destination: StopId,
    pub segments: Vec<RouteSegment>,
}

impl ItineraryPath {
    /// Returns the number of route changes (segments - 1).
    pub fn total_transfers(&self) -> usize {
        self.segments.len().saturating_sub(1)
    }

    /// Returns the number of graph edges on the path.
    pub fn hop_count(&self) -> usize {
        self.segments.iter().map(RouteSegment::hop_count).sum()
    }

    /// Returns true if origin and destination are the same stop.
    pub fn is_trivial(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Best known way of reaching a stop.
#[derive(Debug, Clone)]
struct Label {
    hops: usize,
    segments: usize,
    route: Option<RouteEdge>,
    prev: Option<StopId>,
}

/// Find a fewest-hops path between two stops.
///
/// Stops are collapsed to their parent stations first. Returns `Ok(None)`
/// if no path exists or the best one needs more than `max_transfers`
/// changes.
///
/// # Errors
///
/// Returns `SearchError::StopNotInGraph` if either stop is not a node.
pub fn find_path(
    graph: &TransitGraph,
    from: &StopId,
    to: &StopId,
    max_transfers: usize,
) -> Result<Option<ItineraryPath>, SearchError> {
    find_path_bounded(
        graph,
        from,
        to,
        max_transfers,
        usize::MAX,
        &SearchBudget::unlimited(),
    )
}

/// `find_path` with a cap on the segments a partial path may accumulate
/// and a budget polled once per settled stop.
///
/// # Errors
///
/// As for `find_path`, plus `Timeout` or `Cancelled` when `budget` trips.
pub fn find_path_bounded(
    graph: &TransitGraph,
    from: &StopId,
    to: &StopId,
    max_transfers: usize,
    max_search_depth: usize,
    budget: &SearchBudget,
) -> Result<Option<ItineraryPath>, SearchError> {
    let origin = graph.resolve(from);
    let destination = graph.resolve(to);

    for stop in [origin, destination] {
        if !graph.contains(stop) {
            return Err(SearchError::StopNotInGraph { stop: stop.clone() });
        }
    }

    if origin == destination {
        return Ok(Some(ItineraryPath {
            origin: origin.clone(),
            destination: destination.clone(),
            segments: Vec::new(),
        }));
    }

    let mut labels: HashMap<StopId, Label> = HashMap::new();
    let mut heap: BinaryHeap<Reverse<(usize, usize, StopId)>> = BinaryHeap::new();
    let mut settled = 0usize;

    labels.insert(
        origin.clone(),
        Label {
            hops: 0,
            segments: 0,
            route: None,
            prev: None,
        },
    );
    heap.push(Reverse((0, 0, origin.clone())));

    while let Some(Reverse((hops, segments, stop))) = heap.pop() {
        budget.check()?;

        let Some(label) = labels.get(&stop) else {
            continue;
        };
        if (hops, segments) > (label.hops, label.segments) {
            continue;
        }
        settled += 1;
        if &stop == destination {
            break;
        }

        let route = label.route.clone();

        for (next, routes) in graph.neighbors(&stop) {
            let Some(first) = routes.first() else {
                continue;
            };
            let next_segments = if route.as_ref().is_some_and(|r| r.same_route(first)) {
                segments
            } else {
                segments + 1
            };
            if next_segments > max_search_depth {
                trace!(from = %stop, to = %next, "Search depth reached");
                continue;
            }

            let next_hops = hops + 1;
            // Among equally short routes, prefer the one with fewer changes
            if labels
                .get(next)
                .is_none_or(|l| (next_hops, next_segments) < (l.hops, l.segments))
            {
                labels.insert(
                    next.clone(),
                    Label {
                        hops: next_hops,
                        segments: next_segments,
                        route: Some(first.clone()),
                        prev: Some(stop.clone()),
                    },
                );
                heap.push(Reverse((next_hops, next_segments, next.clone())));
            }
        }
    }

    let Some(stops) = reconstruct(&labels, origin, destination) else {
        debug!(origin = %origin, destination = %destination, settled, "No path");
        return Ok(None);
    };

    let segments = segments_along(graph, &stops);
    let path = ItineraryPath {
        origin: origin.clone(),
        destination: destination.clone(),
        segments,
    };

    if path.total_transfers() > max_transfers {
        debug!(
            transfers = path.total_transfers(),
            max_transfers, "Shortest path needs too many transfers"
        );
        return Ok(None);
    }

    debug!(
        origin = %origin,
        destination = %destination,
        hops = path.hop_count(),
        segments = path.segments.len(),
        settled,
        "Found path"
    );
    Ok(Some(path))
}

/// Walk predecessors back from the destination.
fn reconstruct(
    labels: &HashMap<StopId, Label>,
    origin: &StopId,
    destination: &StopId,
) -> Option<Vec<StopId>> {
    let mut stops = vec![destination.clone()];
    let mut current = labels.get(destination)?;

    while let Some(prev) = &current.prev {
        stops.push(prev.clone());
        current = labels.get(prev)?;
    }

    stops.reverse();
    (stops.first() == Some(origin)).then_some(stops)
}

/// Split a stop sequence into segments, taking the first route alternative
/// of every hop and merging consecutive hops on the same route.
fn segments_along(graph: &TransitGraph, stops: &[StopId]) -> Vec<RouteSegment> {
    let mut segments: Vec<RouteSegment> = Vec::new();

    for pair in stops.windows(2) {
        let Some(route) = graph.routes_between(&pair[0], &pair[1]).first() else {
            continue;
        };

        match segments.last_mut() {
            Some(seg) if route.is_route(&seg.route_id, seg.direction_id) => {
                seg.stops.push(pair[1].clone());
            }
            _ => segments.push(RouteSegment {
                route_id: route.route_id.clone(),
                direction_id: route.direction_id,
                stops: pair.to_vec(),
            }),
        }
    }

    segments
}
