//! Turning trip options into ranked itineraries.
//!
//! Both search strategies hand over `TripOption`s. Consecutive rides on the
//! same trip become one leg; the gaps between legs become transfers. The
//! final set is filtered against the configured limits, deduplicated,
//! ranked and truncated.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::trace;

use crate::domain::{DomainError, Itinerary, Leg, ServiceTime, TripId};

use super::{SearchConfig, TripOption, TripSegment};

/// Build an itinerary from one option.
///
/// # Errors
///
/// Returns `Err` for an empty option or one whose rides run backwards in
/// time.
pub fn assemble(option: TripOption) -> Result<Itinerary, DomainError> {
    let mut rides: Vec<TripSegment> = Vec::with_capacity(option.segments.len());

    for segment in option.segments {
        match rides.last_mut() {
            Some(prev)
                if prev.trip_id == segment.trip_id
                    && prev.alight.stop_id == segment.board.stop_id =>
            {
                let joint = std::mem::replace(&mut prev.alight, segment.alight);
                prev.intermediate_stops.push(joint);
                prev.intermediate_stops.extend(segment.intermediate_stops);
            }
            _ => rides.push(segment),
        }
    }

    let legs = rides
        .into_iter()
        .map(|r| {
            Leg::new(
                r.trip_id,
                r.route_id,
                r.direction_id,
                r.headsign,
                r.board,
                r.alight,
                r.intermediate_stops,
            )
        })
        .collect::<Result<Vec<_>, _>>()?;

    Itinerary::from_legs(legs)
}

/// Rank itineraries by preference.
///
/// Itineraries are ranked by:
/// 1. Arrival time (earlier is better)
/// 2. Number of transfers (fewer is better)
/// 3. Total duration (shorter is better)
///
/// Returns itineraries sorted best-first.
pub fn rank_itineraries(mut itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
    itineraries.sort_by(compare);
    itineraries
}

fn compare(a: &Itinerary, b: &Itinerary) -> Ordering {
    a.arrival_time()
        .cmp(&b.arrival_time())
        .then_with(|| a.number_of_transfers().cmp(&b.number_of_transfers()))
        .then_with(|| a.total_duration_secs().cmp(&b.total_duration_secs()))
}

/// Drop itineraries that ride the same trips boarded at the same times,
/// keeping the first of each.
pub fn deduplicate(itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
    let mut seen: HashSet<Vec<(TripId, ServiceTime)>> = HashSet::new();
    itineraries
        .into_iter()
        .filter(|it| {
            let key = it
                .legs()
                .iter()
                .map(|leg| (leg.trip_id().clone(), leg.departure_time()))
                .collect();
            seen.insert(key)
        })
        .collect()
}

/// Returns true if the itinerary respects the transfer limits of `config`.
pub fn within_limits(itinerary: &Itinerary, config: &SearchConfig) -> bool {
    itinerary.number_of_transfers() <= config.max_transfers
        && itinerary
            .transfers()
            .iter()
            .all(|t| t.wait() >= config.min_transfer())
}

/// Assemble, filter, deduplicate, rank and truncate a batch of options.
///
/// Options that fail to assemble or break a limit are logged and dropped.
pub fn finalize(options: Vec<TripOption>, config: &SearchConfig) -> Vec<Itinerary> {
    let itineraries: Vec<Itinerary> = options
        .into_iter()
        .filter_map(|option| match assemble(option) {
            Ok(it) => Some(it),
            Err(err) => {
                trace!(error = %err, "Dropping option");
                None
            }
        })
        .filter(|it| {
            let ok = within_limits(it, config);
            if !ok {
                trace!(
                    transfers = it.number_of_transfers(),
                    "Dropping itinerary outside transfer limits"
                );
            }
            ok
        })
        .collect();

    let mut ranked = rank_itineraries(deduplicate(itineraries));
    ranked.truncate(config.max_results);
    ranked
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::domain::{DirectionId, RouteId, StopCall, StopId};
    use proptest::prelude::*;

    fn call(stop: &str, secs: u32) -> StopCall {
        let t = ServiceTime::from_seconds(secs);
        StopCall::new(StopId::from(stop), t, t)
    }

    /// An option of 1-5 rides with random durations and gaps, chained in time.
    fn option_strategy() -> impl Strategy<Value = TripOption> {
        (
            0u32..1000,
            18_000u32..72_000,
            prop::collection::vec((60u32..3600, 0u32..1200), 1..=5),
        )
            .prop_map(|(id, start, rides)| {
                let mut clock = start;
                let mut segments = Vec::new();
                for (i, (ride_secs, gap_secs)) in rides.into_iter().enumerate() {
                    let from = format!("S{i}");
                    let to = format!("S{}", i + 1);
                    segments.push(TripSegment {
                        trip_id: TripId::from(format!("T{id}_{i}")),
                        route_id: RouteId::from("R"),
                        direction_id: DirectionId(0),
                        headsign: None,
                        board: call(&from, clock),
                        alight: call(&to, clock + ride_secs),
                        intermediate_stops: Vec::new(),
                    });
                    clock += ride_secs + gap_secs;
                }
                TripOption { segments }
            })
    }

    fn config_strategy() -> impl Strategy<Value = SearchConfig> {
        (0usize..4, 0u32..900, 1usize..8).prop_map(|(max_transfers, min_transfer, max_results)| {
            SearchConfig {
                max_transfers,
                min_transfer_secs: min_transfer,
                max_results,
                ..SearchConfig::default()
            }
        })
    }

    proptest! {
        #[test]
        fn finalize_respects_transfer_bound(
            options in prop::collection::vec(option_strategy(), 0..12),
            config in config_strategy(),
        ) {
            for it in finalize(options, &config) {
                prop_assert!(it.number_of_transfers() <= config.max_transfers);
            }
        }

        #[test]
        fn finalize_enforces_minimum_transfer(
            options in prop::collection::vec(option_strategy(), 0..12),
            config in config_strategy(),
        ) {
            for it in finalize(options, &config) {
                for transfer in it.transfers() {
                    prop_assert!(transfer.wait_secs >= config.min_transfer_secs);
                }
            }
        }

        #[test]
        fn finalize_is_sorted_and_bounded(
            options in prop::collection::vec(option_strategy(), 0..12),
            config in config_strategy(),
        ) {
            let result = finalize(options, &config);
            prop_assert!(result.len() <= config.max_results);
            for window in result.windows(2) {
                let a = (window[0].arrival_time(), window[0].number_of_transfers(), window[0].total_duration_secs());
                let b = (window[1].arrival_time(), window[1].number_of_transfers(), window[1].total_duration_secs());
                prop_assert!(a <= b, "not sorted: {:?} before {:?}", a, b);
            }
        }

        #[test]
        fn assembled_summary_is_consistent(option in option_strategy()) {
            let rides = option.segments.len();
            let it = assemble(option).unwrap();

            prop_assert_eq!(it.legs().len(), rides);
            prop_assert_eq!(it.transfers().len(), rides - 1);
            prop_assert_eq!(
                it.total_duration(),
                it.in_vehicle_time() + it.waiting_time()
            );
        }
    }
}
