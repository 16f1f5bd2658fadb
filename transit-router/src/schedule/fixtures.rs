//! Shared test feed.
//!
//! Line R1 runs A - B - C - D - E - F with an all-stops `LOCAL` and an
//! `EXPRESS` calling at A, C, E, F. Station E has two platforms: R1 uses E1,
//! line R2 leaves from E2 towards G and H. Line R3 shuttles between Y and Z
//! and touches nothing else. Stop `UNSERVED` has no trips at all.
//!
//! Everything runs on weekdays in 2024.

use chrono::NaiveDate;

use crate::domain::{Route, ServiceTime, Stop, StopTime, Trip};

use super::{FeedData, InMemorySchedule, ServiceCalendar};

pub fn date() -> NaiveDate {
    // A Friday
    NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
}

pub fn saturday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 16).unwrap()
}

pub fn time(s: &str) -> ServiceTime {
    ServiceTime::parse(s).unwrap()
}

/// Stop times for one trip from `(stop, arrival, departure)` rows.
pub fn stop_times(trip: &str, rows: &[(&str, &str, &str)]) -> Vec<StopTime> {
    rows.iter()
        .enumerate()
        .map(|(i, (stop, arr, dep))| {
            StopTime::new(trip, *stop, (i as u32 + 1) * 10, time(arr), time(dep))
        })
        .collect()
}

pub fn feed() -> FeedData {
    let stops = vec![
        Stop::new("A", "Alpha", 51.50, -0.10),
        Stop::new("B", "Bravo", 51.51, -0.11),
        Stop::new("C", "Charlie", 51.52, -0.12),
        Stop::new("D", "Delta", 51.53, -0.13),
        Stop::new("E", "Echo", 51.54, -0.14),
        Stop::new("E1", "Echo platform 1", 51.54, -0.14).with_parent("E"),
        Stop::new("E2", "Echo platform 2", 51.54, -0.14).with_parent("E"),
        Stop::new("F", "Foxtrot", 51.55, -0.15),
        Stop::new("G", "Golf", 51.56, -0.16),
        Stop::new("H", "Hotel", 51.57, -0.17),
        Stop::new("Y", "Yankee", 52.00, 0.50),
        Stop::new("Z", "Zulu", 52.01, 0.51),
        Stop::new("UNSERVED", "Nowhere", 53.00, 1.00),
    ];

    let routes = vec![Route::new("R1"), Route::new("R2"), Route::new("R3")];

    let trips = vec![
        Trip::new("LOCAL", "R1", "WKDY").with_direction(0).with_headsign("Foxtrot"),
        Trip::new("EXPRESS", "R1", "WKDY").with_direction(0).with_headsign("Foxtrot"),
        Trip::new("R2_EARLY", "R2", "WKDY").with_direction(0).with_headsign("Hotel"),
        Trip::new("R2_LATE", "R2", "WKDY").with_direction(0).with_headsign("Hotel"),
        Trip::new("R3_A", "R3", "WKDY"),
        Trip::new("R3_B", "R3", "WKDY"),
    ];

    let mut rows = Vec::new();
    rows.extend(stop_times(
        "LOCAL",
        &[
            ("A", "08:05:00", "08:05:00"),
            ("B", "08:10:00", "08:10:00"),
            ("C", "08:15:00", "08:15:00"),
            ("D", "08:20:00", "08:20:00"),
            ("E1", "08:25:00", "08:25:00"),
            ("F", "08:30:00", "08:30:00"),
        ],
    ));
    rows.extend(stop_times(
        "EXPRESS",
        &[
            ("A", "08:12:00", "08:12:00"),
            ("C", "08:17:00", "08:17:00"),
            ("E1", "08:22:00", "08:22:00"),
            ("F", "08:26:00", "08:26:00"),
        ],
    ));
    rows.extend(stop_times(
        "R2_EARLY",
        &[
            ("E2", "08:28:00", "08:28:00"),
            ("G", "08:36:00", "08:36:00"),
            ("H", "08:42:00", "08:42:00"),
        ],
    ));
    rows.extend(stop_times(
        "R2_LATE",
        &[
            ("E2", "08:40:00", "08:40:00"),
            ("G", "08:48:00", "08:48:00"),
            ("H", "08:55:00", "08:55:00"),
        ],
    ));
    rows.extend(stop_times(
        "R3_A",
        &[("Y", "09:00:00", "09:00:00"), ("Z", "09:10:00", "09:10:00")],
    ));
    rows.extend(stop_times(
        "R3_B",
        &[("Y", "10:00:00", "10:00:00"), ("Z", "10:10:00", "10:10:00")],
    ));

    FeedData {
        stops,
        routes,
        trips,
        stop_times: rows,
        calendars: vec![ServiceCalendar::weekdays(
            "WKDY",
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 12, 31).unwrap(),
        )],
        calendar_exceptions: Vec::new(),
    }
}

pub fn schedule() -> InMemorySchedule {
    InMemorySchedule::new(feed())
}
