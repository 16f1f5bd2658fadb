//! Interchangeable search strategies.
//!
//! `TopologyFirst` finds the fewest-hops route path and then looks for trips
//! along it. It is cheap but can miss a faster connection that leaves the
//! path, or return nothing when the path has no timetabled realisation.
//! `TimeExpanded` searches (station, time) events directly and only returns
//! rideable schedules, at a higher build cost per query.

use crate::domain::{ServiceSet, ServiceTime, StopId};
use crate::graph::TransitGraph;
use crate::schedule::ScheduleRepository;

use super::{
    SearchBudget, SearchConfig, SearchError, TimeExpandedGraph, TripMatcher, TripOption,
    find_path_bounded,
};

/// Everything a strategy may read for one query.
pub struct SearchContext<'a> {
    pub schedule: &'a dyn ScheduleRepository,
    pub graph: &'a TransitGraph,
    pub services: &'a ServiceSet,
    pub config: &'a SearchConfig,
    pub budget: &'a SearchBudget,
}

/// A way of turning a stop pair and a departure window into trip options.
///
/// `origin` and `destination` are parent stops known to be in the graph.
/// Options need not be ranked or filtered; the engine does that.
pub trait ItinerarySearchStrategy {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    fn search(
        &self,
        ctx: &SearchContext<'_>,
        origin: &StopId,
        destination: &StopId,
        after: ServiceTime,
        before: Option<ServiceTime>,
    ) -> Result<Vec<TripOption>, SearchError>;
}

/// Route path first, trips second.
#[derive(Debug, Clone, Copy, Default)]
pub struct TopologyFirst;

impl ItinerarySearchStrategy for TopologyFirst {
    fn name(&self) -> &'static str {
        "topology-first"
    }

    fn search(
        &self,
        ctx: &SearchContext<'_>,
        origin: &StopId,
        destination: &StopId,
        after: ServiceTime,
        _before: Option<ServiceTime>,
    ) -> Result<Vec<TripOption>, SearchError> {
        let Some(path) = find_path_bounded(
            ctx.graph,
            origin,
            destination,
            ctx.config.max_transfers,
            ctx.config.max_search_depth,
            ctx.budget,
        )?
        else {
            return Ok(Vec::new());
        };

        TripMatcher::new(
            ctx.schedule,
            ctx.graph.parents(),
            ctx.services,
            ctx.config.min_transfer_secs,
        )
        .match_options(&path, after, ctx.config.max_results, ctx.budget)
    }
}

/// Earliest arrival over a time-expanded event graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeExpanded;

impl ItinerarySearchStrategy for TimeExpanded {
    fn name(&self) -> &'static str {
        "time-expanded"
    }

    fn search(
        &self,
        ctx: &SearchContext<'_>,
        origin: &StopId,
        destination: &StopId,
        after: ServiceTime,
        before: Option<ServiceTime>,
    ) -> Result<Vec<TripOption>, SearchError> {
        let graph = TimeExpandedGraph::build(
            ctx.schedule,
            ctx.graph,
            ctx.services,
            origin,
            destination,
            ctx.config,
            ctx.budget,
        )?;
        graph.search(after, before, ctx.config.max_transfers, ctx.budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::build_graph;
    use crate::schedule::fixtures::{date, schedule, time};

    fn run(strategy: &dyn ItinerarySearchStrategy, from: &str, to: &str) -> Vec<Vec<String>> {
        let repo = schedule();
        let services = repo.active_service_ids(date()).unwrap();
        let graph = build_graph(&repo, &repo, &services).unwrap();
        let config = SearchConfig::default();
        let budget = SearchBudget::unlimited();
        let ctx = SearchContext {
            schedule: &repo,
            graph: &graph,
            services: &services,
            config: &config,
            budget: &budget,
        };

        strategy
            .search(
                &ctx,
                &StopId::from(from),
                &StopId::from(to),
                time("08:00:00"),
                None,
            )
            .unwrap()
            .iter()
            .map(|o| o.segments.iter().map(|s| s.trip_id.to_string()).collect())
            .collect()
    }

    #[test]
    fn strategies_agree_on_direct_trips() {
        let expected = vec![vec!["LOCAL".to_string()], vec!["EXPRESS".to_string()]];
        assert_eq!(run(&TopologyFirst, "A", "F"), expected);
        assert_eq!(run(&TimeExpanded, "A", "F"), expected);
    }

    #[test]
    fn time_expanded_finds_what_topology_misses() {
        let topology = run(&TopologyFirst, "A", "H");
        let timed = run(&TimeExpanded, "A", "H");

        let early = vec!["EXPRESS".to_string(), "R2_EARLY".to_string()];
        assert!(!topology.contains(&early));
        assert!(timed.contains(&early));
    }

    #[test]
    fn disconnected_stops_give_nothing() {
        assert!(run(&TopologyFirst, "A", "Y").is_empty());
        assert!(run(&TimeExpanded, "A", "Y").is_empty());
    }

    #[test]
    fn names() {
        assert_eq!(TopologyFirst.name(), "topology-first");
        assert_eq!(TimeExpanded.name(), "time-expanded");
    }
}
