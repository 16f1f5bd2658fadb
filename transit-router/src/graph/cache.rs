//! Per-service-day graph cache.
//!
//! Building a `TransitGraph` reads and merges every active trip, so graphs
//! are cached by the exact set of active services. Different dates with the
//! same services share one graph.
//!
//! Concurrent requests for a missing key are coalesced: one caller builds,
//! the rest wait for its result. A failed build is handed to every waiter and
//! is not cached, so the next request retries.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache as MokaCache;
use tracing::{debug, trace};

use crate::domain::ServiceSet;
use crate::schedule::{ScheduleRepository, StopRepository};

use super::{GraphConfig, GraphError, TransitGraph};

/// Configuration for the cache.
///
/// Deserializes from a partial JSON object like `SearchConfig`.
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct GraphCacheConfig {
    /// Maximum number of graphs kept.
    pub max_capacity: u64,

    /// Graphs unused for this long are evicted (seconds).
    pub time_to_idle_secs: u64,

    /// How each graph is built.
    pub graph: GraphConfig,
}

impl GraphCacheConfig {
    /// Returns the idle eviction time as a Duration.
    pub fn time_to_idle(&self) -> Duration {
        Duration::from_secs(self.time_to_idle_secs)
    }
}

impl Default for GraphCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 32,
            time_to_idle_secs: 6 * 60 * 60,
            graph: GraphConfig::default(),
        }
    }
}

/// Compute-once cache of transit graphs keyed by service set.
pub struct GraphCache {
    graphs: MokaCache<ServiceSet, Arc<TransitGraph>>,
    graph_config: GraphConfig,
}

impl GraphCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &GraphCacheConfig) -> Self {
        let graphs = MokaCache::builder()
            .max_capacity(config.max_capacity)
            .time_to_idle(config.time_to_idle())
            .build();

        Self {
            graphs,
            graph_config: config.graph.clone(),
        }
    }

    /// Return the graph for `services`, building it if absent.
    ///
    /// # Errors
    ///
    /// Returns the build's `GraphError`. Every caller that waited on the
    /// failed build receives a copy.
    pub fn get_or_build<St, Sc>(
        &self,
        stops: &St,
        schedule: &Sc,
        services: &ServiceSet,
    ) -> Result<Arc<TransitGraph>, GraphError>
    where
        St: StopRepository + ?Sized,
        Sc: ScheduleRepository + ?Sized,
    {
        if let Some(graph) = self.graphs.get(services) {
            trace!(services = services.len(), "Graph cache hit");
            return Ok(graph);
        }

        self.graphs
            .try_get_with(services.clone(), || {
                debug!(services = services.len(), "Graph cache miss, building");
                TransitGraph::build(stops, schedule, services, &self.graph_config).map(Arc::new)
            })
            .map_err(|err: Arc<GraphError>| (*err).clone())
    }

    /// Returns true if a graph for `services` is cached.
    pub fn contains(&self, services: &ServiceSet) -> bool {
        self.graphs.contains_key(services)
    }

    /// Drop a single cached graph, e.g. after the feed for it changed.
    pub fn invalidate(&self, services: &ServiceSet) {
        self.graphs.invalidate(services);
    }

    /// Drop every cached graph.
    pub fn invalidate_all(&self) {
        self.graphs.invalidate_all();
    }
}

impl Default for GraphCache {
    fn default() -> Self {
        Self::new(&GraphCacheConfig::default())
    }
}
