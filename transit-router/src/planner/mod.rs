//! Itinerary planning over a transit graph.
//!
//! This module answers: "leaving stop A after time T on date D, how do I
//! reach stop B?"
//!
//! Two strategies produce candidate trip sequences. The topology-first
//! strategy finds the fewest-hops route path with Dijkstra and then matches
//! concrete trips along it; the time-expanded strategy searches scheduled
//! events directly. Either way, the assembler turns the candidates into
//! ranked, limit-checked itineraries.

mod assemble;
mod cancel;
mod config;
mod engine;
mod error;
mod matcher;
mod pathfinder;
mod strategy;
mod time_expanded;


pub use assemble::{assemble, deduplicate, finalize, rank_itineraries, within_limits};
pub use cancel::{CancellationToken, SearchBudget};
pub use config::SearchConfig;
pub use engine::{ItineraryEngine, ItineraryQuery};
pub use error::SearchError;
pub use matcher::{TripMatcher, TripOption, TripSegment, match_trips};
pub use pathfinder::{ItineraryPath, RouteSegment, find_path, find_path_bounded};
pub use strategy::{ItinerarySearchStrategy, SearchContext, TimeExpanded, TopologyFirst};
pub use time_expanded::TimeExpandedGraph;
