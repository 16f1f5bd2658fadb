//! Route topology for one service day.
//!
//! Stops are collapsed to their parent stations, each route's trips are
//! merged into one stop order, and the result becomes a directed multigraph
//! of stations joined by the routes that serve them. Graphs are cached per
//! set of active services.

mod builder;
mod cache;
mod error;
mod merge;
mod parent;

pub use builder::{GraphConfig, RouteEdge, TransitGraph, build_graph};
pub use cache::{GraphCache, GraphCacheConfig};
pub use error::GraphError;
pub use merge::merge_stop_order;
pub use parent::{ParentStops, resolve_parent};
