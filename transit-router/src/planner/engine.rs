//! The public entry point: stop pair, date and time window in, ranked
//! itineraries out.

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{Itinerary, MalformedTime, ServiceTime, StopId};
use crate::graph::GraphCache;
use crate::schedule::{ScheduleRepository, StopRepository};

use super::{
    ItinerarySearchStrategy, SearchBudget, SearchConfig, SearchContext, SearchError,
    TopologyFirst, finalize,
};

/// One itinerary request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItineraryQuery {
    pub from: StopId,
    pub to: StopId,
    pub date: NaiveDate,
    /// Boarding must happen strictly after this time.
    pub departure_after: ServiceTime,
    /// First boarding no later than this, when set.
    pub departure_before: Option<ServiceTime>,
}

impl ItineraryQuery {
    pub fn new(
        from: impl Into<StopId>,
        to: impl Into<StopId>,
        date: NaiveDate,
        departure_after: ServiceTime,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            date,
            departure_after,
            departure_before: None,
        }
    }

    /// Build a query from GTFS `HH:MM:SS` strings.
    pub fn parse(
        from: impl Into<StopId>,
        to: impl Into<StopId>,
        date: NaiveDate,
        departure_after: &str,
        departure_before: Option<&str>,
    ) -> Result<Self, MalformedTime> {
        let after = ServiceTime::parse(departure_after)?;
        let before = departure_before.map(ServiceTime::parse).transpose()?;
        Ok(Self::new(from, to, date, after).with_departure_before(before))
    }

    pub fn with_departure_before(mut self, before: Option<ServiceTime>) -> Self {
        self.departure_before = before;
        self
    }
}

/// Itinerary search over one schedule repository.
///
/// Graphs are cached per active service set, so repeated queries for the
/// same day type share one build. The engine is `Sync` when its repository
/// is, and can serve queries from many threads.
pub struct ItineraryEngine<R> {
    repository: R,
    cache: GraphCache,
    config: SearchConfig,
    strategy: Box<dyn ItinerarySearchStrategy + Send + Sync>,
}

impl<R: StopRepository + ScheduleRepository> ItineraryEngine<R> {
    /// Create an engine with default config using the topology-first strategy.
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            cache: GraphCache::default(),
            config: SearchConfig::default(),
            strategy: Box::new(TopologyFirst),
        }
    }

    pub fn with_config(mut self, config: SearchConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_strategy(
        mut self,
        strategy: impl ItinerarySearchStrategy + Send + Sync + 'static,
    ) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    pub fn with_cache(mut self, cache: GraphCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn cache(&self) -> &GraphCache {
        &self.cache
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Compute itineraries using the engine's config.
    ///
    /// An empty result means no service, not failure: the date has no
    /// active services, the stops are not connected, or nothing runs in the
    /// window.
    ///
    /// # Errors
    ///
    /// - `StopNotInGraph` when either stop is not served on the date
    /// - `Timeout` when the config's `timeout_ms` runs out
    /// - repository and graph errors are passed through unchanged
    pub fn compute_itineraries(
        &self,
        query: &ItineraryQuery,
    ) -> Result<Vec<Itinerary>, SearchError> {
        let budget = SearchBudget::from_config(&self.config);
        self.compute_itineraries_with(query, &self.config, &budget)
    }

    /// Compute itineraries with a per-call config and budget.
    pub fn compute_itineraries_with(
        &self,
        query: &ItineraryQuery,
        config: &SearchConfig,
        budget: &SearchBudget,
    ) -> Result<Vec<Itinerary>, SearchError> {
        budget.check()?;

        let services = self.repository.active_service_ids(query.date)?;
        if services.is_empty() {
            debug!(date = %query.date, "No active services");
            return Ok(Vec::new());
        }

        let graph = self
            .cache
            .get_or_build(&self.repository, &self.repository, &services)?;

        let origin = graph.resolve(&query.from).clone();
        let destination = graph.resolve(&query.to).clone();
        for stop in [&origin, &destination] {
            if !graph.contains(stop) {
                return Err(SearchError::StopNotInGraph { stop: stop.clone() });
            }
        }
        if origin == destination {
            return Ok(Vec::new());
        }

        let ctx = SearchContext {
            schedule: &self.repository,
            graph: &graph,
            services: &services,
            config,
            budget,
        };
        let mut options = self.strategy.search(
            &ctx,
            &origin,
            &destination,
            query.departure_after,
            query.departure_before,
        )?;

        if let Some(before) = query.departure_before {
            options.retain(|o| o.departure_time().is_some_and(|t| t <= before));
        }

        let found = options.len();
        let itineraries = finalize(options, config);

        debug!(
            from = %origin,
            to = %destination,
            strategy = self.strategy.name(),
            options = found,
            itineraries = itineraries.len(),
            "Itinerary search complete"
        );

        Ok(itineraries)
    }
}
