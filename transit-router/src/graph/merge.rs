//! Merging per-trip stop sequences into one route order.
//!
//! Trips on the same route and direction rarely share an identical stop
//! list: expresses skip stops, short workings start or end early, and the
//! odd trip makes a deviation. This module folds all of them into a single
//! duplicate-free sequence consistent with each trip's own order.

use std::collections::{BTreeSet, HashMap};

use tracing::trace;

use crate::domain::{StopId, StopTime, TripId};

/// Merge the stop sequences of `trip_ids` into one ordered stop list.
///
/// Each trip is walked in `stop_sequence` order. A stop not yet placed is
/// inserted directly after the nearest earlier stop of the same trip that is
/// already placed. With no such stop it goes directly before the nearest
/// later placed stop, or at the end if the trip shares nothing yet.
///
/// Trips are processed longest first, ties broken by trip id, so the result
/// does not depend on the order of `trip_ids`. Unknown trip ids are ignored.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use transit_router::domain::{ServiceTime, StopId, StopTime, TripId};
/// use transit_router::graph::merge_stop_order;
///
/// let t = ServiceTime::from_seconds(0);
/// let rows = |trip: &str, stops: &[&str]| -> Vec<StopTime> {
///     stops.iter().enumerate()
///         .map(|(i, s)| StopTime::new(trip, *s, i as u32, t, t))
///         .collect()
/// };
///
/// let mut stop_times = HashMap::new();
/// stop_times.insert(TripId::from("LOCAL"), rows("LOCAL", &["A", "B", "C"]));
/// stop_times.insert(TripId::from("EXPRESS"), rows("EXPRESS", &["A", "C"]));
///
/// let merged = merge_stop_order(
///     &[TripId::from("EXPRESS"), TripId::from("LOCAL")],
///     &stop_times,
/// );
/// let names: Vec<&str> = merged.iter().map(StopId::as_str).collect();
/// assert_eq!(names, vec!["A", "B", "C"]);
/// ```
pub fn merge_stop_order(
    trip_ids: &[TripId],
    stop_times: &HashMap<TripId, Vec<StopTime>>,
) -> Vec<StopId> {
    let unique: BTreeSet<&TripId> = trip_ids.iter().collect();
    let mut trips: Vec<(&TripId, &[StopTime])> = unique
        .into_iter()
        .filter_map(|id| stop_times.get(id).map(|rows| (id, rows.as_slice())))
        .collect();
    trips.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));

    let mut merged: Vec<StopId> = Vec::new();

    for (trip_id, rows) in trips {
        let sequence: Vec<&StopId> = rows.iter().map(|st| &st.stop_id).collect();

        for (i, &stop) in sequence.iter().enumerate() {
            if merged.contains(stop) {
                continue;
            }

            let before = sequence[..i]
                .iter()
                .rev()
                .find_map(|s| position(&merged, s));
            let after = sequence[i + 1..].iter().find_map(|s| position(&merged, s));
            let insert_at = match before {
                Some(b) => b + 1,
                None => after.unwrap_or(merged.len()),
            };

            if let Some(after) = after
                && insert_at > after
            {
                trace!(
                    trip = %trip_id,
                    stop = %stop,
                    "Stop order conflicts with previously merged trips"
                );
            }

            merged.insert(insert_at, stop.clone());
        }
    }

    merged
}

fn position(merged: &[StopId], stop: &StopId) -> Option<usize> {
    merged.iter().position(|s| s == stop)
}
