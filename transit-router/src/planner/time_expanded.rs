//! Time-expanded search.
//!
//! Every node is a (parent stop, time) event taken from the stop times of
//! trips serving the origin or the destination. Ride edges follow one trip
//! from event to event. Transfer edges link an arrival to the next few
//! departures at the same station that leave at least the minimum transfer
//! time later. Any path through this graph is a schedule that can actually
//! be ridden, at the cost of a graph that grows with the number of events
//! instead of the number of stations.

use std::cmp::Reverse;
use std::collections::{BTreeSet, BinaryHeap, HashMap, HashSet};

use tracing::{debug, trace};

use crate::domain::{DirectionId, RouteId, ScheduledTrip, ServiceSet, ServiceTime, StopId};
use crate::graph::{ParentStops, TransitGraph};
use crate::schedule::ScheduleRepository;

use super::matcher::ride_segment;
use super::{SearchBudget, SearchConfig, SearchError, TripOption};

type NodeIdx = usize;
type TripIdx = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EdgeKind {
    /// Stay on `trip` from stop-time row `from_row` to `to_row`. A dwell
    /// at one stop has `from_row == to_row`.
    Ride {
        trip: TripIdx,
        from_row: usize,
        to_row: usize,
    },
    Transfer,
}

#[derive(Debug, Clone, Copy)]
struct Edge {
    to: NodeIdx,
    weight: u32,
    kind: EdgeKind,
}

/// Search state: where we are, which trip we are on, how many changes so far.
///
/// A trip label lets two trips share an event node without letting a path
/// hop from one to the other without a transfer edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
struct State {
    node: NodeIdx,
    trip: Option<TripIdx>,
    transfers: usize,
}

/// Time-expanded graph for one origin/destination pair.
#[derive(Debug, Clone)]
pub struct TimeExpandedGraph {
    origin: StopId,
    destination: StopId,
    trips: Vec<ScheduledTrip>,
    events: Vec<(StopId, ServiceTime)>,
    edges: Vec<Vec<Edge>>,
    /// Departure events per parent stop, sorted by time.
    departures: HashMap<StopId, Vec<(ServiceTime, NodeIdx)>>,
    edge_count: usize,
}

impl TimeExpandedGraph {
    /// Load the active trips serving `origin` or `destination` and build
    /// their event graph.
    ///
    /// Only the (route, direction) patterns with a topology edge into or out
    /// of either station are fetched from the schedule.
    ///
    /// # Errors
    ///
    /// Returns the repository's error unchanged, or `Timeout`/`Cancelled`
    /// from `budget`.
    pub fn build<S: ScheduleRepository + ?Sized>(
        schedule: &S,
        topology: &TransitGraph,
        services: &ServiceSet,
        origin: &StopId,
        destination: &StopId,
        config: &SearchConfig,
        budget: &SearchBudget,
    ) -> Result<Self, SearchError> {
        let ends = [topology.resolve(origin), topology.resolve(destination)];

        let mut patterns: BTreeSet<(&RouteId, DirectionId)> = BTreeSet::new();
        for stop in topology.nodes() {
            for (next, routes) in topology.neighbors(stop) {
                if ends.contains(&stop) || ends.contains(&next) {
                    patterns.extend(routes.iter().map(|r| (&r.route_id, r.direction_id)));
                }
            }
        }

        let mut scheduled: Vec<ScheduledTrip> = Vec::new();
        for (route_id, direction_id) in patterns {
            budget.check()?;
            scheduled.extend(schedule.trips_for_route_direction(route_id, direction_id, services)?);
        }

        Self::from_trips(
            scheduled,
            topology.parents(),
            origin,
            destination,
            config.min_transfer_secs,
            config.transfer_candidates,
            budget,
        )
    }

    /// Build the event graph from trips already in memory.
    ///
    /// Trips touching neither `origin` nor `destination` (as parent stops)
    /// are left out.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` or `Cancelled` when `budget` trips. It is polled
    /// once per trip.
    pub fn from_trips(
        trips: Vec<ScheduledTrip>,
        parents: &ParentStops,
        origin: &StopId,
        destination: &StopId,
        min_transfer_secs: u32,
        transfer_candidates: usize,
        budget: &SearchBudget,
    ) -> Result<Self, SearchError> {
        let origin = parents.resolve(origin).clone();
        let destination = parents.resolve(destination).clone();

        let mut trips: Vec<ScheduledTrip> = trips
            .into_iter()
            .filter(|t| {
                t.stop_times.iter().any(|st| {
                    let parent = parents.resolve(&st.stop_id);
                    parent == &origin || parent == &destination
                })
            })
            .collect();
        trips.sort_by(|a, b| a.trip.id.cmp(&b.trip.id));

        let mut graph = Self {
            origin,
            destination,
            trips: Vec::new(),
            events: Vec::new(),
            edges: Vec::new(),
            departures: HashMap::new(),
            edge_count: 0,
        };
        let mut index: HashMap<(StopId, ServiceTime), NodeIdx> = HashMap::new();
        let mut arrivals: Vec<NodeIdx> = Vec::new();

        for (trip_idx, trip) in trips.iter().enumerate() {
            budget.check()?;
            let rows = &trip.stop_times;
            let mut prev_departure: Option<(NodeIdx, usize, ServiceTime)> = None;

            for (row, st) in rows.iter().enumerate() {
                let parent = parents.resolve(&st.stop_id).clone();

                if let Some((from, from_row, dep)) = prev_departure {
                    let arr = graph.node(&mut index, parent.clone(), st.arrival_time);
                    graph.add_edge(
                        from,
                        arr,
                        st.arrival_time.as_seconds().saturating_sub(dep.as_seconds()),
                        EdgeKind::Ride {
                            trip: trip_idx,
                            from_row,
                            to_row: row,
                        },
                    );
                    arrivals.push(arr);

                    if row + 1 < rows.len() && st.departure_time != st.arrival_time {
                        let dep_node = graph.node(&mut index, parent.clone(), st.departure_time);
                        let dwell = st
                            .departure_time
                            .as_seconds()
                            .saturating_sub(st.arrival_time.as_seconds());
                        graph.add_edge(
                            arr,
                            dep_node,
                            dwell,
                            EdgeKind::Ride {
                                trip: trip_idx,
                                from_row: row,
                                to_row: row,
                            },
                        );
                    }
                }

                if row + 1 < rows.len() {
                    let dep_node = graph.node(&mut index, parent.clone(), st.departure_time);
                    graph
                        .departures
                        .entry(parent)
                        .or_default()
                        .push((st.departure_time, dep_node));
                    prev_departure = Some((dep_node, row, st.departure_time));
                }
            }
        }

        for list in graph.departures.values_mut() {
            list.sort();
            list.dedup();
        }

        let mut linked: HashSet<NodeIdx> = HashSet::new();
        for arr in arrivals {
            if !linked.insert(arr) {
                continue;
            }
            let (stop, time) = &graph.events[arr];
            let earliest = time.add_seconds(min_transfer_secs);
            let targets: Vec<(ServiceTime, NodeIdx)> = graph
                .departures
                .get(stop)
                .map(|deps| {
                    let start = deps.partition_point(|(t, _)| *t < earliest);
                    deps[start..].iter().take(transfer_candidates).copied().collect()
                })
                .unwrap_or_default();
            let arrived = *time;
            for (dep_time, dep_node) in targets {
                graph.add_edge(
                    arr,
                    dep_node,
                    dep_time.as_seconds() - arrived.as_seconds(),
                    EdgeKind::Transfer,
                );
            }
        }

        graph.trips = trips;

        debug!(
            origin = %graph.origin,
            destination = %graph.destination,
            trips = graph.trips.len(),
            nodes = graph.events.len(),
            edges = graph.edge_count,
            "Built time-expanded graph"
        );

        Ok(graph)
    }

    fn node(
        &mut self,
        index: &mut HashMap<(StopId, ServiceTime), NodeIdx>,
        stop: StopId,
        time: ServiceTime,
    ) -> NodeIdx {
        *index.entry((stop.clone(), time)).or_insert_with(|| {
            self.events.push((stop, time));
            self.edges.push(Vec::new());
            self.events.len() - 1
        })
    }

    fn add_edge(&mut self, from: NodeIdx, to: NodeIdx, weight: u32, kind: EdgeKind) {
        self.edges[from].push(Edge { to, weight, kind });
        self.edge_count += 1;
    }

    /// Returns the number of event nodes.
    pub fn node_count(&self) -> usize {
        self.events.len()
    }

    /// Returns the number of ride, dwell and transfer edges.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Find the earliest arrival at the destination for every departure from
    /// the origin strictly after `after` and no later than `before`.
    ///
    /// Each departure event is searched independently and yields at most one
    /// option. Options come back in departure order, unranked.
    ///
    /// # Errors
    ///
    /// Returns `Timeout` or `Cancelled` when `budget` trips.
    pub fn search(
        &self,
        after: ServiceTime,
        before: Option<ServiceTime>,
        max_transfers: usize,
        budget: &SearchBudget,
    ) -> Result<Vec<TripOption>, SearchError> {
        if self.origin == self.destination {
            return Ok(Vec::new());
        }

        let starts: Vec<NodeIdx> = self
            .departures
            .get(&self.origin)
            .map(|deps| {
                deps.iter()
                    .filter(|(t, _)| *t > after && before.is_none_or(|b| *t <= b))
                    .map(|(_, node)| *node)
                    .collect()
            })
            .unwrap_or_default();

        let mut options = Vec::new();
        for start in starts {
            if let Some(option) = self.earliest_arrival(start, max_transfers, budget)? {
                options.push(option);
            }
        }

        debug!(
            origin = %self.origin,
            destination = %self.destination,
            options = options.len(),
            "Time-expanded search finished"
        );
        Ok(options)
    }

    /// Dijkstra on elapsed seconds from one departure event.
    fn earliest_arrival(
        &self,
        start: NodeIdx,
        max_transfers: usize,
        budget: &SearchBudget,
    ) -> Result<Option<TripOption>, SearchError> {
        let origin_state = State {
            node: start,
            trip: None,
            transfers: 0,
        };
        let mut best: HashMap<State, u32> = HashMap::from([(origin_state, 0)]);
        let mut pred: HashMap<State, (State, Edge)> = HashMap::new();
        let mut heap = BinaryHeap::from([Reverse((0u32, origin_state))]);

        while let Some(Reverse((cost, state))) = heap.pop() {
            budget.check()?;
            if best.get(&state).is_some_and(|&c| cost > c) {
                continue;
            }

            if state.trip.is_some() && self.events[state.node].0 == self.destination {
                trace!(start, cost, transfers = state.transfers, "Reached destination");
                return Ok(Some(self.option_from(&pred, state)));
            }

            for edge in &self.edges[state.node] {
                let next = match (edge.kind, state.trip) {
                    (EdgeKind::Ride { trip, .. }, None) => State {
                        node: edge.to,
                        trip: Some(trip),
                        transfers: state.transfers,
                    },
                    (EdgeKind::Ride { trip, .. }, Some(current)) if trip == current => State {
                        node: edge.to,
                        trip: Some(trip),
                        transfers: state.transfers,
                    },
                    (EdgeKind::Transfer, Some(_)) if state.transfers < max_transfers => State {
                        node: edge.to,
                        trip: None,
                        transfers: state.transfers + 1,
                    },
                    _ => continue,
                };

                let next_cost = cost + edge.weight;
                if best.get(&next).is_none_or(|&c| next_cost < c) {
                    best.insert(next, next_cost);
                    pred.insert(next, (state, *edge));
                    heap.push(Reverse((next_cost, next)));
                }
            }
        }

        Ok(None)
    }

    /// Rebuild the rides from the predecessor chain ending at `end`.
    fn option_from(&self, pred: &HashMap<State, (State, Edge)>, end: State) -> TripOption {
        let mut edges = Vec::new();
        let mut current = end;
        while let Some((prev, edge)) = pred.get(&current) {
            edges.push(*edge);
            current = *prev;
        }
        edges.reverse();

        let mut rides: Vec<(TripIdx, usize, usize)> = Vec::new();
        for edge in edges {
            let EdgeKind::Ride {
                trip,
                from_row,
                to_row,
            } = edge.kind
            else {
                continue;
            };
            match rides.last_mut() {
                Some((t, _, alight)) if *t == trip && *alight == from_row => *alight = to_row,
                _ => rides.push((trip, from_row, to_row)),
            }
        }

        TripOption {
            segments: rides
                .into_iter()
                .map(|(trip, board, alight)| ride_segment(&self.trips[trip], board, alight))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Stop, StopTime, Trip, TripId};
    use crate::graph::build_graph;
    use crate::schedule::fixtures::{date, schedule, stop_times, time};
    use crate::schedule::{InMemorySchedule, RepositoryError};
    use chrono::NaiveDate;
    use std::sync::Mutex;

    fn id(s: &str) -> StopId {
        StopId::from(s)
    }

    fn fixture(from: &str, to: &str, config: &SearchConfig) -> TimeExpandedGraph {
        let repo = schedule();
        let services = repo.active_service_ids(date()).unwrap();
        let topology = build_graph(&repo, &repo, &services).unwrap();
        TimeExpandedGraph::build(
            &repo,
            &topology,
            &services,
            &id(from),
            &id(to),
            config,
            &SearchBudget::unlimited(),
        )
        .unwrap()
    }

    /// Records which patterns are fetched and refuses whole-day loads.
    struct PatternLog {
        inner: InMemorySchedule,
        fetched: Mutex<Vec<String>>,
    }

    impl ScheduleRepository for PatternLog {
        fn active_service_ids(&self, date: NaiveDate) -> Result<ServiceSet, RepositoryError> {
            self.inner.active_service_ids(date)
        }

        fn trips_for_services(&self, _: &ServiceSet) -> Result<Vec<Trip>, RepositoryError> {
            Err(RepositoryError::Unavailable {
                message: "whole-day trip load".into(),
            })
        }

        fn ordered_stop_times(
            &self,
            trip_ids: &[TripId],
        ) -> Result<HashMap<TripId, Vec<StopTime>>, RepositoryError> {
            self.inner.ordered_stop_times(trip_ids)
        }

        fn trips_for_route_direction(
            &self,
            route_id: &RouteId,
            direction_id: DirectionId,
            services: &ServiceSet,
        ) -> Result<Vec<ScheduledTrip>, RepositoryError> {
            self.fetched.lock().unwrap().push(route_id.to_string());
            self.inner.trips_for_route_direction(route_id, direction_id, services)
        }
    }

    fn trips(option: &TripOption) -> Vec<&str> {
        option.segments.iter().map(|s| s.trip_id.as_str()).collect()
    }

    #[test]
    fn only_trips_at_origin_or_destination_are_kept() {
        let graph = fixture("A", "H", &SearchConfig::default());
        // LOCAL 6 + EXPRESS 4 + two R2 trips of 3 events each
        assert_eq!(graph.node_count(), 16);
        // 12 rides, no dwells, 4 transfers
        assert_eq!(graph.edge_count(), 16);
    }

    #[test]
    fn finds_the_early_connection() {
        let graph = fixture("A", "H", &SearchConfig::default());
        let options = graph
            .search(time("08:00:00"), None, 3, &SearchBudget::unlimited())
            .unwrap();

        assert_eq!(options.len(), 2);
        assert_eq!(trips(&options[0]), vec!["LOCAL", "R2_LATE"]);
        assert_eq!(trips(&options[1]), vec!["EXPRESS", "R2_EARLY"]);
        assert_eq!(options[1].arrival_time(), Some(time("08:42:00")));

        let express = &options[1].segments[0];
        assert_eq!(express.board.stop_id, id("A"));
        assert_eq!(express.alight.stop_id, id("E1"));
        assert_eq!(express.intermediate_stops.len(), 1);
        assert_eq!(options[1].segments[1].board.stop_id, id("E2"));
    }

    #[test]
    fn transfers_honour_minimum_wait() {
        let graph = fixture("A", "H", &SearchConfig::default());
        let options = graph
            .search(time("08:00:00"), None, 3, &SearchBudget::unlimited())
            .unwrap();

        for option in &options {
            for pair in option.segments.windows(2) {
                let wait = pair[1].board.departure_time.seconds_since(pair[0].alight.arrival_time);
                assert!(wait >= 300, "wait {wait}s in {:?}", trips(option));
            }
        }
    }

    #[test]
    fn direct_rides_need_no_transfer() {
        let graph = fixture("A", "F", &SearchConfig::default());
        let options = graph
            .search(time("08:00:00"), None, 0, &SearchBudget::unlimited())
            .unwrap();

        assert_eq!(options.len(), 2);
        assert_eq!(trips(&options[0]), vec!["LOCAL"]);
        assert_eq!(trips(&options[1]), vec!["EXPRESS"]);
        assert_eq!(options[0].segments[0].intermediate_stops.len(), 4);
    }

    #[test]
    fn transfer_cap_is_respected() {
        let graph = fixture("A", "H", &SearchConfig::default());
        let options = graph
            .search(time("08:00:00"), None, 0, &SearchBudget::unlimited())
            .unwrap();
        assert!(options.is_empty());
    }

    #[test]
    fn departure_window_limits_starts() {
        let graph = fixture("A", "H", &SearchConfig::default());
        let options = graph
            .search(
                time("08:00:00"),
                Some(time("08:10:00")),
                3,
                &SearchBudget::unlimited(),
            )
            .unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(trips(&options[0]), vec!["LOCAL", "R2_LATE"]);

        // Strictly after the lower bound
        let options = graph
            .search(time("08:05:00"), None, 3, &SearchBudget::unlimited())
            .unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(trips(&options[0]), vec!["EXPRESS", "R2_EARLY"]);
    }

    #[test]
    fn single_transfer_candidate_still_connects() {
        let config = SearchConfig {
            transfer_candidates: 1,
            ..SearchConfig::default()
        };
        let graph = fixture("A", "H", &config);
        assert_eq!(graph.edge_count(), 15);

        let options = graph
            .search(time("08:10:00"), None, 3, &SearchBudget::unlimited())
            .unwrap();
        assert_eq!(trips(&options[0]), vec!["EXPRESS", "R2_EARLY"]);
    }

    #[test]
    fn shared_event_does_not_switch_trips() {
        let stops = vec![
            Stop::new("X", "X", 0.0, 0.0),
            Stop::new("S", "S", 0.0, 0.0),
            Stop::new("Y", "Y", 0.0, 0.0),
            Stop::new("Z", "Z", 0.0, 0.0),
        ];
        let parents = ParentStops::build(&stops).unwrap();
        let scheduled = vec![
            ScheduledTrip {
                trip: Trip::new("P", "RP", "SVC"),
                stop_times: stop_times(
                    "P",
                    &[
                        ("X", "08:00:00", "08:00:00"),
                        ("S", "08:10:00", "08:10:00"),
                        ("Y", "08:20:00", "08:20:00"),
                    ],
                ),
            },
            ScheduledTrip {
                trip: Trip::new("Q", "RQ", "SVC"),
                stop_times: stop_times(
                    "Q",
                    &[("S", "08:10:00", "08:10:00"), ("Z", "08:15:00", "08:15:00")],
                ),
            },
        ];

        let unlimited = SearchBudget::unlimited();
        let strict = TimeExpandedGraph::from_trips(
            scheduled.clone(),
            &parents,
            &id("X"),
            &id("Z"),
            300,
            5,
            &unlimited,
        )
        .unwrap();
        let options = strict
            .search(time("07:00:00"), None, 3, &SearchBudget::unlimited())
            .unwrap();
        assert!(options.is_empty());

        // A zero minimum makes the same-time change a real transfer
        let relaxed =
            TimeExpandedGraph::from_trips(scheduled, &parents, &id("X"), &id("Z"), 0, 5, &unlimited)
                .unwrap();
        let options = relaxed
            .search(time("07:00:00"), None, 3, &SearchBudget::unlimited())
            .unwrap();
        assert_eq!(options.len(), 1);
        assert_eq!(trips(&options[0]), vec!["P", "Q"]);
    }

    #[test]
    fn dwell_time_is_ridden_through() {
        let stops = vec![
            Stop::new("X", "X", 0.0, 0.0),
            Stop::new("M", "M", 0.0, 0.0),
            Stop::new("Y", "Y", 0.0, 0.0),
        ];
        let parents = ParentStops::build(&stops).unwrap();
        let scheduled = vec![ScheduledTrip {
            trip: Trip::new("SLOW", "R", "SVC"),
            stop_times: stop_times(
                "SLOW",
                &[
                    ("X", "09:00:00", "09:00:00"),
                    ("M", "09:10:00", "09:15:00"),
                    ("Y", "09:30:00", "09:30:00"),
                ],
            ),
        }];

        let graph = TimeExpandedGraph::from_trips(
            scheduled,
            &parents,
            &id("X"),
            &id("Y"),
            300,
            5,
            &SearchBudget::unlimited(),
        )
        .unwrap();
        // X, M arrival, M departure, Y
        assert_eq!(graph.node_count(), 4);

        let options = graph
            .search(time("08:00:00"), None, 0, &SearchBudget::unlimited())
            .unwrap();
        assert_eq!(options.len(), 1);
        let ride = &options[0].segments[0];
        assert_eq!(ride.alight.stop_id, id("Y"));
        assert_eq!(ride.intermediate_stops.len(), 1);
        assert_eq!(ride.intermediate_stops[0].departure_time, time("09:15:00"));
    }

    #[test]
    fn same_origin_and_destination_is_empty() {
        let graph = fixture("E1", "E2", &SearchConfig::default());
        let options = graph
            .search(time("08:00:00"), None, 3, &SearchBudget::unlimited())
            .unwrap();
        assert!(options.is_empty());
    }

    #[test]
    fn cancelled_search_stops() {
        let graph = fixture("A", "H", &SearchConfig::default());
        let token = crate::planner::CancellationToken::new();
        token.cancel();
        let budget = SearchBudget::unlimited().with_token(token);
        assert_eq!(
            graph.search(time("08:00:00"), None, 3, &budget),
            Err(SearchError::Cancelled)
        );
    }

    #[test]
    fn only_patterns_at_either_end_are_fetched() {
        let log = PatternLog {
            inner: schedule(),
            fetched: Mutex::new(Vec::new()),
        };
        let services = log.active_service_ids(date()).unwrap();
        let topology = build_graph(&log.inner, &log.inner, &services).unwrap();

        let graph = TimeExpandedGraph::build(
            &log,
            &topology,
            &services,
            &id("A"),
            &id("H"),
            &SearchConfig::default(),
            &SearchBudget::unlimited(),
        )
        .unwrap();

        // R3 runs Y-Z only and is never read
        assert_eq!(*log.fetched.lock().unwrap(), vec!["R1", "R2"]);
        assert_eq!(graph.node_count(), 16);
    }

    #[test]
    fn cancelled_build_stops() {
        let repo = schedule();
        let services = repo.active_service_ids(date()).unwrap();
        let topology = build_graph(&repo, &repo, &services).unwrap();
        let token = crate::planner::CancellationToken::new();
        token.cancel();

        let result = TimeExpandedGraph::build(
            &repo,
            &topology,
            &services,
            &id("A"),
            &id("H"),
            &SearchConfig::default(),
            &SearchBudget::unlimited().with_token(token),
        );
        assert!(matches!(result, Err(SearchError::Cancelled)));

        let token = crate::planner::CancellationToken::new();
        token.cancel();
        let trips = repo
            .trips_for_route_direction(&RouteId::from("R1"), DirectionId(0), &services)
            .unwrap();
        let result = TimeExpandedGraph::from_trips(
            trips,
            topology.parents(),
            &id("A"),
            &id("F"),
            300,
            5,
            &SearchBudget::unlimited().with_token(token),
        );
        assert!(matches!(result, Err(SearchError::Cancelled)));
    }
}
