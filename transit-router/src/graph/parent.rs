//! Parent-station resolution.
//!
//! Platforms and entrances hang under a station through `parent_station`,
//! possibly over several levels. Routing happens between topmost ancestors,
//! so every stop is collapsed to the root of its chain.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use crate::domain::{Stop, StopId};
use crate::schedule::StopRepository;

use super::GraphError;

/// Whole-feed map from every stop to its topmost ancestor.
///
/// Built once per graph build in a single pass over the stop table; each
/// chain is walked at most once thanks to memoisation.
#[derive(Debug, Clone, Default)]
pub struct ParentStops {
    parents: HashMap<StopId, StopId>,
    /// Root -> every stop resolving to it (the root included), sorted.
    children: HashMap<StopId, Vec<StopId>>,
}

impl ParentStops {
    /// Resolve every stop in `stops`.
    ///
    /// A `parent_station` naming a stop that is not in the table ends the
    /// chain at the last known stop.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::CyclicStationHierarchy` if a chain loops.
    pub fn build(stops: &[Stop]) -> Result<Self, GraphError> {
        let by_id: HashMap<&StopId, &Stop> = stops.iter().map(|s| (&s.id, s)).collect();
        let mut parents: HashMap<StopId, StopId> = HashMap::with_capacity(stops.len());

        for stop in stops {
            if parents.contains_key(&stop.id) {
                continue;
            }

            let mut chain: Vec<&StopId> = Vec::new();
            let mut on_chain: HashSet<&StopId> = HashSet::new();
            let mut current = &stop.id;

            let root = loop {
                if let Some(root) = parents.get(current) {
                    break root.clone();
                }
                if !on_chain.insert(current) {
                    return Err(GraphError::CyclicStationHierarchy {
                        stop: current.clone(),
                    });
                }
                chain.push(current);

                match by_id.get(current).and_then(|s| s.parent_station.as_ref()) {
                    None => break current.clone(),
                    Some(parent) if !by_id.contains_key(parent) => {
                        warn!(stop = %current, parent = %parent, "Parent station not in feed");
                        break current.clone();
                    }
                    Some(parent) => current = parent,
                }
            };

            for id in chain {
                parents.insert(id.clone(), root.clone());
            }
        }

        let mut children: HashMap<StopId, Vec<StopId>> = HashMap::new();
        for (child, root) in &parents {
            children.entry(root.clone()).or_default().push(child.clone());
        }
        for list in children.values_mut() {
            list.sort();
        }

        debug!(
            stops = parents.len(),
            stations = children.len(),
            "Resolved parent stations"
        );

        Ok(Self { parents, children })
    }

    /// Load the stop table and resolve it.
    pub fn from_repository<S: StopRepository + ?Sized>(stops: &S) -> Result<Self, GraphError> {
        Self::build(&stops.list_all()?)
    }

    /// Returns the topmost ancestor of a stop.
    ///
    /// Stops unknown to the feed are their own parent.
    pub fn resolve<'a>(&'a self, stop: &'a StopId) -> &'a StopId {
        self.parents.get(stop).unwrap_or(stop)
    }

    /// Returns every stop that resolves to `parent`, including itself.
    ///
    /// Empty if `parent` is not a root in the feed.
    pub fn children(&self, parent: &StopId) -> &[StopId] {
        self.children
            .get(parent)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Returns true if `stop` resolves to `parent`.
    pub fn is_under(&self, stop: &StopId, parent: &StopId) -> bool {
        self.resolve(stop) == parent
    }

    /// Returns the number of stops resolved.
    pub fn len(&self) -> usize {
        self.parents.len()
    }

    /// Returns true if no stops were resolved.
    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

/// Resolve a single stop through the repository, without the whole-feed
/// cache.
///
/// Unknown stops are their own parent, and a dangling `parent_station` ends
/// the chain at the last known stop.
///
/// # Errors
///
/// Returns `GraphError::CyclicStationHierarchy` if the chain loops, or the
/// repository's error unchanged.
pub fn resolve_parent<S: StopRepository + ?Sized>(
    stops: &S,
    stop: &StopId,
) -> Result<StopId, GraphError> {
    let mut visited: HashSet<StopId> = HashSet::new();
    let mut current = stop.clone();

    loop {
        if !visited.insert(current.clone()) {
            return Err(GraphError::CyclicStationHierarchy { stop: current });
        }

        let Some(parent) = stops.get(&current)?.and_then(|s| s.parent_station) else {
            return Ok(current);
        };

        if stops.get(&parent)?.is_none() {
            warn!(stop = %current, parent = %parent, "Parent station not in feed");
            return Ok(current);
        }
        current = parent;
    }
}
