//! Domain types for the transit router.
//!
//! This module contains the schedule records the router reads and the
//! itinerary types it produces. Validated types enforce their invariants at
//! construction time, so code that receives them can trust their validity.

mod error;
mod ids;
mod itinerary;
mod stop;
mod time;
mod trip;

pub use error::DomainError;
pub use ids::{DirectionId, RouteId, ServiceId, ServiceSet, StopId, TripId};
pub use itinerary::{Itinerary, Leg, StopCall, Transfer};
pub use stop::Stop;
pub use time::{MalformedTime, ServiceTime, duration, from_seconds, to_seconds};
pub use trip::{Route, ScheduledTrip, StopTime, Trip};
