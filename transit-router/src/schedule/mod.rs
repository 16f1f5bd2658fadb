//! Read-only repository contracts for schedule data.
//!
//! Bulk loading, storage and calendar resolution live outside the router.
//! The router reads through these two traits, which return strongly typed
//! records; any coercion from a storage format happens behind them.
//!
//! `InMemorySchedule` is a complete implementation over owned vectors,
//! used for tests and for hosts that already hold a feed in memory.

mod error;
mod memory;

#[cfg(test)]
pub(crate) mod fixtures;

use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::domain::{DirectionId, RouteId, ScheduledTrip, ServiceSet, Stop, StopId, StopTime, Trip, TripId};

pub use error::RepositoryError;
pub use memory::{CalendarException, ExceptionType, FeedData, InMemorySchedule, ServiceCalendar};

/// Access to the stop table.
pub trait StopRepository {
    /// Look up a single stop. Returns `Ok(None)` if the id is unknown.
    fn get(&self, id: &StopId) -> Result<Option<Stop>, RepositoryError>;

    /// Return every stop in the feed.
    fn list_all(&self) -> Result<Vec<Stop>, RepositoryError>;
}

/// Access to trips, stop times and service calendars.
pub trait ScheduleRepository {
    /// Services running on a calendar date (weekly pattern plus exceptions).
    fn active_service_ids(&self, date: NaiveDate) -> Result<ServiceSet, RepositoryError>;

    /// Trips belonging to any of the services, joined with their routes.
    fn trips_for_services(&self, services: &ServiceSet) -> Result<Vec<Trip>, RepositoryError>;

    /// Stop times for each requested trip, sorted by `stop_sequence`.
    ///
    /// Unknown trip ids are absent from the result.
    fn ordered_stop_times(
        &self,
        trip_ids: &[TripId],
    ) -> Result<HashMap<TripId, Vec<StopTime>>, RepositoryError>;

    /// Trips on one route and direction within the services, with their
    /// full stop-time rows.
    fn trips_for_route_direction(
        &self,
        route_id: &RouteId,
        direction_id: DirectionId,
        services: &ServiceSet,
    ) -> Result<Vec<ScheduledTrip>, RepositoryError>;
}

impl<T: StopRepository + ?Sized> StopRepository for &T {
    fn get(&self, id: &StopId) -> Result<Option<Stop>, RepositoryError> {
        (**self).get(id)
    }

    fn list_all(&self) -> Result<Vec<Stop>, RepositoryError> {
        (**self).list_all()
    }
}

impl<T: StopRepository + ?Sized> StopRepository for Arc<T> {
    fn get(&self, id: &StopId) -> Result<Option<Stop>, RepositoryError> {
        (**self).get(id)
    }

    fn list_all(&self) -> Result<Vec<Stop>, RepositoryError> {
        (**self).list_all()
    }
}

impl<T: ScheduleRepository + ?Sized> ScheduleRepository for &T {
    fn active_service_ids(&self, date: NaiveDate) -> Result<ServiceSet, RepositoryError> {
        (**self).active_service_ids(date)
    }

    fn trips_for_services(&self, services: &ServiceSet) -> Result<Vec<Trip>, RepositoryError> {
        (**self).trips_for_services(services)
    }

    fn ordered_stop_times(
        &self,
        trip_ids: &[TripId],
    ) -> Result<HashMap<TripId, Vec<StopTime>>, RepositoryError> {
        (**self).ordered_stop_times(trip_ids)
    }

    fn trips_for_route_direction(
        &self,
        route_id: &RouteId,
        direction_id: DirectionId,
        services: &ServiceSet,
    ) -> Result<Vec<ScheduledTrip>, RepositoryError> {
        (**self).trips_for_route_direction(route_id, direction_id, services)
    }
}

impl<T: ScheduleRepository + ?Sized> ScheduleRepository for Arc<T> {
    fn active_service_ids(&self, date: NaiveDate) -> Result<ServiceSet, RepositoryError> {
        (**self).active_service_ids(date)
    }

    fn trips_for_services(&self, services: &ServiceSet) -> Result<Vec<Trip>, RepositoryError> {
        (**self).trips_for_services(services)
    }

    fn ordered_stop_times(
        &self,
        trip_ids: &[TripId],
    ) -> Result<HashMap<TripId, Vec<StopTime>>, RepositoryError> {
        (**self).ordered_stop_times(trip_ids)
    }

    fn trips_for_route_direction(
        &self,
        route_id: &RouteId,
        direction_id: DirectionId,
        services: &ServiceSet,
    ) -> Result<Vec<ScheduledTrip>, RepositoryError> {
        (**self).trips_for_route_direction(route_id, direction_id, services)
    }
}
