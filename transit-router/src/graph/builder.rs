//! Topology graph of parent stations for one service day.
//!
//! Nodes are parent stops. A directed edge joins two parent stops that are
//! consecutive on some route's merged stop order, and carries every
//! (route, direction) pair that makes that hop. Edges have unit weight; the
//! graph answers "which routes connect these stations", not "when".

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use crate::domain::{DirectionId, RouteId, ServiceSet, StopId, TripId};
use crate::schedule::{ScheduleRepository, StopRepository};

use super::{GraphError, ParentStops, merge_stop_order};

/// Tuning for graph construction.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Route/direction groups with fewer active trips than this are skipped.
    pub min_trips_per_pattern: usize,
}

impl GraphConfig {
    /// Create a new configuration with the given parameters.
    pub fn new(min_trips_per_pattern: usize) -> Self {
        Self {
            min_trips_per_pattern,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            min_trips_per_pattern: 2,
        }
    }
}

/// One (route, direction) alternative on an edge.
///
/// `intermediate_stops` lists the platform-level stops the pattern calls at
/// while making the hop, in order, leaving out the two parent stations
/// themselves. A route that boards at the parent and alights at the parent
/// has none.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct RouteEdge {
    pub route_id: RouteId,
    pub direction_id: DirectionId,
    pub intermediate_stops: Vec<StopId>,
}

impl RouteEdge {
    pub fn new(route_id: impl Into<RouteId>, direction_id: DirectionId) -> Self {
        Self {
            route_id: route_id.into(),
            direction_id,
            intermediate_stops: Vec::new(),
        }
    }

    pub fn with_intermediate_stops(mut self, stops: Vec<StopId>) -> Self {
        self.intermediate_stops = stops;
        self
    }

    /// Returns true if this is `route_id` in `direction_id`.
    pub fn is_route(&self, route_id: &RouteId, direction_id: DirectionId) -> bool {
        &self.route_id == route_id && self.direction_id == direction_id
    }

    /// Returns true if both alternatives ride the same (route, direction).
    pub fn same_route(&self, other: &RouteEdge) -> bool {
        other.is_route(&self.route_id, self.direction_id)
    }
}

/// Directed multigraph over parent stops.
///
/// Immutable once built. Adjacency is kept in ordered maps so neighbour
/// iteration, and therefore every search over the graph, is deterministic.
#[derive(Debug, Clone)]
pub struct TransitGraph {
    services: ServiceSet,
    parents: ParentStops,
    nodes: BTreeSet<StopId>,
    adjacency: BTreeMap<StopId, BTreeMap<StopId, Vec<RouteEdge>>>,
    edge_count: usize,
}

impl TransitGraph {
    /// Build the graph for the trips running under `services`.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::CyclicStationHierarchy` for a looping station
    /// hierarchy, or the repository's error unchanged.
    pub fn build<St, Sc>(
        stops: &St,
        schedule: &Sc,
        services: &ServiceSet,
        config: &GraphConfig,
    ) -> Result<Self, GraphError>
    where
        St: StopRepository + ?Sized,
        Sc: ScheduleRepository + ?Sized,
    {
        let parents = ParentStops::from_repository(stops)?;
        let trips = schedule.trips_for_services(services)?;

        let mut groups: BTreeMap<RouteEdge, Vec<TripId>> = BTreeMap::new();
        for trip in trips {
            groups
                .entry(RouteEdge::new(trip.route_id.clone(), trip.direction()))
                .or_default()
                .push(trip.id);
        }
        let total_groups = groups.len();
        groups.retain(|_, ids| ids.len() >= config.min_trips_per_pattern);

        let wanted: Vec<TripId> = groups.values().flatten().cloned().collect();
        let stop_times = schedule.ordered_stop_times(&wanted)?;

        let patterns: Vec<(RouteEdge, Vec<StopId>)> = groups
            .into_iter()
            .map(|(route, ids)| {
                let order = merge_stop_order(&ids, &stop_times);
                (route, order)
            })
            .collect();

        debug!(
            trips = wanted.len(),
            patterns = patterns.len(),
            skipped = total_groups - patterns.len(),
            "Merged route patterns"
        );

        Ok(Self::from_patterns(services.clone(), parents, patterns))
    }

    /// Assemble a graph from already-merged stop orders.
    ///
    /// Each stop is collapsed to its parent and consecutive repeats are
    /// dropped, so moving between platforms of one station adds no edge.
    /// The collapsed platform stops are kept on the edge's alternative.
    /// Patterns touching fewer than two parent stops contribute nothing.
    pub fn from_patterns(
        services: ServiceSet,
        parents: ParentStops,
        patterns: impl IntoIterator<Item = (RouteEdge, Vec<StopId>)>,
    ) -> Self {
        let mut graph = Self {
            services,
            parents,
            nodes: BTreeSet::new(),
            adjacency: BTreeMap::new(),
            edge_count: 0,
        };

        for (route, order) in patterns {
            // Consecutive stops sharing a parent form one run
            let mut runs: Vec<(StopId, Vec<StopId>)> = Vec::with_capacity(order.len());
            for stop in order {
                let parent = graph.parents.resolve(&stop).clone();
                match runs.last_mut() {
                    Some((last, members)) if *last == parent => members.push(stop),
                    _ => runs.push((parent, vec![stop])),
                }
            }
            if runs.len() < 2 {
                continue;
            }

            for pair in runs.windows(2) {
                let ((from, from_stops), (to, to_stops)) = (&pair[0], &pair[1]);
                let intermediate = from_stops
                    .iter()
                    .chain(to_stops)
                    .filter(|s| *s != from && *s != to)
                    .cloned()
                    .collect();
                graph.add_edge(from, to, route.clone().with_intermediate_stops(intermediate));
            }
            graph.nodes.extend(runs.into_iter().map(|(parent, _)| parent));
        }

        debug!(
            services = graph.services.len(),
            nodes = graph.nodes.len(),
            edges = graph.edge_count,
            "Built transit graph"
        );

        graph
    }

    fn add_edge(&mut self, from: &StopId, to: &StopId, route: RouteEdge) {
        let alternatives = self
            .adjacency
            .entry(from.clone())
            .or_default()
            .entry(to.clone())
            .or_default();
        if alternatives.is_empty() {
            self.edge_count += 1;
        }
        if !alternatives.iter().any(|r| r.same_route(&route)) {
            alternatives.push(route);
        }
    }

    /// Returns true if `stop` (a parent stop) is a node.
    pub fn contains(&self, stop: &StopId) -> bool {
        self.nodes.contains(stop)
    }

    /// Returns the route alternatives on the edge `from -> to`, in the order
    /// they were added. Empty if there is no such edge.
    pub fn routes_between(&self, from: &StopId, to: &StopId) -> &[RouteEdge] {
        self.adjacency
            .get(from)
            .and_then(|targets| targets.get(to))
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Returns the outgoing edges of `stop`, ordered by target id.
    pub fn neighbors<'a>(
        &'a self,
        stop: &StopId,
    ) -> impl Iterator<Item = (&'a StopId, &'a [RouteEdge])> + use<'a> {
        self.adjacency
            .get(stop)
            .into_iter()
            .flat_map(|targets| targets.iter().map(|(to, routes)| (to, routes.as_slice())))
    }

    /// Returns every node, sorted.
    pub fn nodes(&self) -> impl Iterator<Item = &StopId> {
        self.nodes.iter()
    }

    /// Returns the number of nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of distinct stop pairs joined by an edge.
    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Returns the parent-stop map the graph was built with.
    pub fn parents(&self) -> &ParentStops {
        &self.parents
    }

    /// Collapse any stop to the parent stop the graph uses for it.
    pub fn resolve<'a>(&'a self, stop: &'a StopId) -> &'a StopId {
        self.parents.resolve(stop)
    }

    /// Returns the services the graph was built for.
    pub fn services(&self) -> &ServiceSet {
        &self.services
    }
}

/// Build a graph with the default configuration.
pub fn build_graph<St, Sc>(
    stops: &St,
    schedule: &Sc,
    services: &ServiceSet,
) -> Result<TransitGraph, GraphError>
where
    St: StopRepository + ?Sized,
    Sc: ScheduleRepository + ?Sized,
{
    TransitGraph::build(stops, schedule, services, &GraphConfig::default())
}
