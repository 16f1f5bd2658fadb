//! In-memory schedule repository.
//!
//! Holds a whole feed in owned vectors with the indexes the router's
//! queries need. Useful for tests and for hosts that load a feed once and
//! keep it resident.

use std::collections::HashMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    DirectionId, Route, RouteId, ScheduledTrip, ServiceId, ServiceSet, ServiceTime, Stop, StopId,
    StopTime, Trip, TripId,
};

use super::{RepositoryError, ScheduleRepository, StopRepository};

/// Weekly operating pattern of a service between two dates (inclusive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceCalendar {
    pub service_id: ServiceId,
    #[serde(default)]
    pub monday: bool,
    #[serde(default)]
    pub tuesday: bool,
    #[serde(default)]
    pub wednesday: bool,
    #[serde(default)]
    pub thursday: bool,
    #[serde(default)]
    pub friday: bool,
    #[serde(default)]
    pub saturday: bool,
    #[serde(default)]
    pub sunday: bool,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl ServiceCalendar {
    /// A Monday-to-Friday service between two dates.
    pub fn weekdays(service_id: impl Into<ServiceId>, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            service_id: service_id.into(),
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            saturday: false,
            sunday: false,
            start_date: start,
            end_date: end,
        }
    }

    /// Does the weekly pattern include this weekday?
    pub fn runs_on_weekday(&self, weekday: Weekday) -> bool {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    /// Does the pattern cover this date, before exceptions are applied?
    pub fn runs_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date && self.runs_on_weekday(date.weekday())
    }
}

/// Whether an exception adds or removes a service on its date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExceptionType {
    Added,
    Removed,
}

/// A single-date override of the weekly pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarException {
    pub service_id: ServiceId,
    pub date: NaiveDate,
    pub exception_type: ExceptionType,
}

/// The raw contents of a feed.
#[derive(Debug, Clone, Default)]
pub struct FeedData {
    pub stops: Vec<Stop>,
    pub routes: Vec<Route>,
    pub trips: Vec<Trip>,
    pub stop_times: Vec<StopTime>,
    pub calendars: Vec<ServiceCalendar>,
    pub calendar_exceptions: Vec<CalendarException>,
}

/// Stop time as stored in JSON, before the times are validated.
#[derive(Debug, Deserialize)]
struct RawStopTime {
    trip_id: TripId,
    stop_id: StopId,
    stop_sequence: u32,
    arrival_time: String,
    departure_time: String,
}

impl RawStopTime {
    fn into_stop_time(self) -> Result<StopTime, RepositoryError> {
        Ok(StopTime {
            arrival_time: ServiceTime::parse(&self.arrival_time)?,
            departure_time: ServiceTime::parse(&self.departure_time)?,
            trip_id: self.trip_id,
            stop_id: self.stop_id,
            stop_sequence: self.stop_sequence,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawFeed {
    #[serde(default)]
    stops: Vec<Stop>,
    #[serde(default)]
    routes: Vec<Route>,
    #[serde(default)]
    trips: Vec<Trip>,
    #[serde(default)]
    stop_times: Vec<RawStopTime>,
    #[serde(default)]
    calendars: Vec<ServiceCalendar>,
    #[serde(default)]
    calendar_exceptions: Vec<CalendarException>,
}

/// A schedule held entirely in memory.
#[derive(Debug, Clone)]
pub struct InMemorySchedule {
    stops: HashMap<StopId, Stop>,
    routes: HashMap<RouteId, Route>,
    trips: Vec<Trip>,
    /// Stop times per trip, sorted by `stop_sequence`.
    stop_times: HashMap<TripId, Vec<StopTime>>,
    calendars: Vec<ServiceCalendar>,
    calendar_exceptions: Vec<CalendarException>,
}

impl InMemorySchedule {
    /// Index a feed.
    pub fn new(feed: FeedData) -> Self {
        let mut stop_times: HashMap<TripId, Vec<StopTime>> = HashMap::new();
        for st in feed.stop_times {
            stop_times.entry(st.trip_id.clone()).or_default().push(st);
        }
        for rows in stop_times.values_mut() {
            rows.sort_by_key(|st| st.stop_sequence);
        }

        debug!(
            stops = feed.stops.len(),
            routes = feed.routes.len(),
            trips = feed.trips.len(),
            "Indexed in-memory schedule"
        );

        Self {
            stops: feed.stops.into_iter().map(|s| (s.id.clone(), s)).collect(),
            routes: feed.routes.into_iter().map(|r| (r.id.clone(), r)).collect(),
            trips: feed.trips,
            stop_times,
            calendars: feed.calendars,
            calendar_exceptions: feed.calendar_exceptions,
        }
    }

    /// Load a feed from a JSON document.
    ///
    /// The document has optional arrays `stops`, `routes`, `trips`,
    /// `stop_times`, `calendars` and `calendar_exceptions`. Stop times carry
    /// GTFS "HH:MM:SS" strings.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::MalformedTime` for an invalid stop time and
    /// `RepositoryError::Corrupt` for any other decoding failure.
    pub fn from_json(json: &str) -> Result<Self, RepositoryError> {
        let raw: RawFeed = serde_json::from_str(json).map_err(|e| RepositoryError::Corrupt {
            message: format!("failed to parse feed JSON: {e}"),
        })?;

        let stop_times = raw
            .stop_times
            .into_iter()
            .map(RawStopTime::into_stop_time)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(FeedData {
            stops: raw.stops,
            routes: raw.routes,
            trips: raw.trips,
            stop_times,
            calendars: raw.calendars,
            calendar_exceptions: raw.calendar_exceptions,
        }))
    }

    fn has_route(&self, trip: &Trip) -> bool {
        self.routes.contains_key(&trip.route_id)
    }
}

impl StopRepository for InMemorySchedule {
    fn get(&self, id: &StopId) -> Result<Option<Stop>, RepositoryError> {
        Ok(self.stops.get(id).cloned())
    }

    fn list_all(&self) -> Result<Vec<Stop>, RepositoryError> {
        let mut stops: Vec<Stop> = self.stops.values().cloned().collect();
        stops.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(stops)
    }
}

impl ScheduleRepository for InMemorySchedule {
    fn active_service_ids(&self, date: NaiveDate) -> Result<ServiceSet, RepositoryError> {
        let mut active: ServiceSet = self
            .calendars
            .iter()
            .filter(|cal| cal.runs_on(date))
            .map(|cal| cal.service_id.clone())
            .collect();

        for exception in self.calendar_exceptions.iter().filter(|e| e.date == date) {
            match exception.exception_type {
                ExceptionType::Added => {
                    active.insert(exception.service_id.clone());
                }
                ExceptionType::Removed => {
                    active.remove(&exception.service_id);
                }
            }
        }

        Ok(active)
    }

    fn trips_for_services(&self, services: &ServiceSet) -> Result<Vec<Trip>, RepositoryError> {
        Ok(self
            .trips
            .iter()
            .filter(|trip| services.contains(&trip.service_id) && self.has_route(trip))
            .cloned()
            .collect())
    }

    fn ordered_stop_times(
        &self,
        trip_ids: &[TripId],
    ) -> Result<HashMap<TripId, Vec<StopTime>>, RepositoryError> {
        Ok(trip_ids
            .iter()
            .filter_map(|id| self.stop_times.get(id).map(|rows| (id.clone(), rows.clone())))
            .collect())
    }

    fn trips_for_route_direction(
        &self,
        route_id: &RouteId,
        direction_id: DirectionId,
        services: &ServiceSet,
    ) -> Result<Vec<ScheduledTrip>, RepositoryError> {
        let mut trips: Vec<ScheduledTrip> = self
            .trips
            .iter()
            .filter(|trip| {
                &trip.route_id == route_id
                    && trip.direction() == direction_id
                    && services.contains(&trip.service_id)
            })
            .map(|trip| ScheduledTrip {
                trip: trip.clone(),
                stop_times: self.stop_times.get(&trip.id).cloned().unwrap_or_default(),
            })
            .collect();

        trips.sort_by(|a, b| {
            a.first_departure()
                .cmp(&b.first_departure())
                .then_with(|| a.trip.id.cmp(&b.trip.id))
        });

        Ok(trips)
    }
}
