//! Itinerary routing over static GTFS schedules.
//!
//! Answers: "how do I get from this stop to that one, leaving after this
//! time on this date?" The schedule is read through the repository traits
//! in [`schedule`]; [`graph`] turns the trips running on a date into a
//! station-level route graph; [`planner`] searches it and returns ranked
//! itineraries.
//!
//! ```
//! use chrono::NaiveDate;
//! use transit_router::planner::{ItineraryEngine, ItineraryQuery};
//! use transit_router::schedule::InMemorySchedule;
//!
//! let json = r#"{
//!     "stops": [
//!         {"id": "A", "name": "Alpha", "lat": 0.0, "lon": 0.0},
//!         {"id": "B", "name": "Bravo", "lat": 0.0, "lon": 0.1}
//!     ],
//!     "routes": [{"id": "R1"}],
//!     "trips": [
//!         {"id": "T1", "route_id": "R1", "service_id": "DAILY"},
//!         {"id": "T2", "route_id": "R1", "service_id": "DAILY"}
//!     ],
//!     "stop_times": [
//!         {"trip_id": "T1", "stop_id": "A", "stop_sequence": 1, "arrival_time": "08:00:00", "departure_time": "08:00:00"},
//!         {"trip_id": "T1", "stop_id": "B", "stop_sequence": 2, "arrival_time": "08:10:00", "departure_time": "08:10:00"},
//!         {"trip_id": "T2", "stop_id": "A", "stop_sequence": 1, "arrival_time": "09:00:00", "departure_time": "09:00:00"},
//!         {"trip_id": "T2", "stop_id": "B", "stop_sequence": 2, "arrival_time": "09:10:00", "departure_time": "09:10:00"}
//!     ],
//!     "calendar_exceptions": [
//!         {"service_id": "DAILY", "date": "2024-03-15", "exception_type": "added"}
//!     ]
//! }"#;
//!
//! let engine = ItineraryEngine::new(InMemorySchedule::from_json(json).unwrap());
//! let date = NaiveDate::from_ymd_opt(2024, 3, 15).unwrap();
//! let query = ItineraryQuery::parse("A", "B", date, "08:30:00", None).unwrap();
//!
//! let itineraries = engine.compute_itineraries(&query).unwrap();
//! assert_eq!(itineraries.len(), 1);
//! assert_eq!(itineraries[0].departure_time().to_string(), "09:00:00");
//! ```

pub mod domain;
pub mod graph;
pub mod planner;
pub mod schedule;
