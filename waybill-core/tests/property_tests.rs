//! Property-based tests for stop planning and duty log simulation.
//!
//! # Invariants tested
//!
//! - **Itinerary shape:** plans start with a pickup, end with a dropoff and
//!   number their stops `1..=n`.
//! - **Stop counts:** fuel and rest stops follow the mile-marker cutoffs.
//! - **Segment coverage:** driving chunks of a segment add up to the segment.
//! - **Chunk cap:** no driving event exceeds the daily driving cap.
//! - **Breaks:** eight hours of continuous driving is always followed by a
//!   30 minute break.
//! - **Cycle:** an exhausted cycle never yields logs.

#![expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "properties restate mile and hour arithmetic"
)]

use std::collections::HashMap;

use chrono::NaiveDate;
use geo::Coord;
use proptest::prelude::*;
use waybill_core::{
    CycleExceededError, DutyLogSimulator, EventKind, EventMetadata, LogDay, PlannerConfig, Stop,
    StopKind, StopMetadata, StopPlanner, Trip,
    test_support::{StubServices, straight_route},
};

const CHICAGO: Coord<f64> = Coord { x: -87.63, y: 41.88 };
const DALLAS: Coord<f64> = Coord { x: -96.8, y: 32.78 };

fn expected_markers(count: f64, interval: f64, cutoff: f64) -> usize {
    let mut markers = 0;
    let mut i = 1.0;
    while i <= count.floor() && i * interval < cutoff {
        markers += 1;
        i += 1.0;
    }
    markers
}

fn simulator() -> DutyLogSimulator {
    DutyLogSimulator::new(NaiveDate::from_ymd_opt(2025, 1, 6).expect("valid date"))
}

fn unlocated_stops(count: usize) -> Vec<Stop> {
    (1..=count)
        .map(|i| {
            let kind = match i {
                1 => StopKind::Pickup,
                n if n == count => StopKind::Dropoff,
                n if n % 2 == 0 => StopKind::Fuel,
                _ => StopKind::Rest,
            };
            let sequence = u32::try_from(i).expect("small stop count");
            Stop::new(kind, format!("Stop {i}"), sequence, StopMetadata::default())
        })
        .collect()
}

fn driving_hours_by_destination(logs: &[LogDay]) -> HashMap<String, f64> {
    let mut totals = HashMap::new();
    for event in logs.iter().flat_map(|day| &day.events) {
        if let Some(EventMetadata::Segment(segment)) = &event.metadata {
            *totals.entry(segment.to.clone()).or_insert(0.0) += segment.estimated_miles / 50.0;
        }
    }
    totals
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Property: planned itineraries are well formed and their fuel and rest
    /// counts follow the mile-marker cutoffs.
    #[test]
    fn plans_follow_marker_rules(total_miles in 1.0_f64..5000.0) {
        let stubs = StubServices::default()
            .with_address("Chicago, IL", CHICAGO)
            .with_address("Dallas, TX", DALLAS);
        let config = PlannerConfig::default();
        let trip = Trip::new("Denver, CO", "Chicago, IL", "Dallas, TX", 0.0).expect("valid trip");
        let planner = StopPlanner::new(&stubs.services(), &config);
        let plan = planner.plan(&trip, total_miles, &straight_route(CHICAGO, DALLAS, 40));

        prop_assert!(!plan.is_fallback());
        prop_assert_eq!(plan.stops.first().map(|s| s.stop_type), Some(StopKind::Pickup));
        prop_assert_eq!(plan.stops.last().map(|s| s.stop_type), Some(StopKind::Dropoff));
        for (index, stop) in plan.stops.iter().enumerate() {
            prop_assert_eq!(stop.sequence as usize, index + 1);
        }

        let fuel = plan.stops.iter().filter(|s| s.stop_type == StopKind::Fuel).count();
        let rest = plan.stops.iter().filter(|s| s.stop_type == StopKind::Rest).count();
        prop_assert_eq!(fuel, expected_markers(total_miles / 1000.0, 1000.0, 0.95 * total_miles));
        prop_assert_eq!(rest, expected_markers(total_miles / 50.0 / 8.0, 400.0, 0.9 * total_miles));
    }

    /// Property: the driving chunks for each segment add up to the segment's
    /// drive time, and no single chunk exceeds 11 hours.
    #[test]
    fn driving_covers_each_segment(
        stop_count in 2_usize..7,
        total_miles in 0.0_f64..4000.0,
        cycle_used in 0.0_f64..69.9,
    ) {
        let stops = unlocated_stops(stop_count);
        let logs = simulator().simulate(&stops, total_miles, cycle_used).expect("cycle hours left");
        let per_segment = total_miles / (stop_count - 1) as f64;
        let expected = (per_segment / 50.0 * 100.0).round() / 100.0;
        let totals = driving_hours_by_destination(&logs);
        for stop in stops.iter().skip(1) {
            let driven = totals.get(&stop.location).copied().unwrap_or(0.0);
            prop_assert!(
                (driven - expected).abs() <= 0.01,
                "{} driven {} expected {}", stop.location, driven, expected
            );
        }
        for event in logs.iter().flat_map(|day| &day.events) {
            if event.kind == EventKind::Driving {
                prop_assert!(event.duration() <= 11.0 + 0.01);
            }
        }
    }

    /// Property: once eight hours of continuous driving accumulate, the next
    /// event is a 30 minute on-duty break.
    #[test]
    fn breaks_follow_eight_hours_of_driving(
        stop_count in 2_usize..6,
        total_miles in 0.0_f64..4000.0,
    ) {
        let stops = unlocated_stops(stop_count);
        let logs = simulator().simulate(&stops, total_miles, 0.0).expect("cycle hours left");
        let mut continuous = 0.0;
        let mut day = 1;
        for record in &logs {
            if record.day != day {
                day = record.day;
                continuous = 0.0;
            }
            let mut events = record.events.iter().peekable();
            while let Some(event) = events.next() {
                match event.kind {
                    EventKind::Driving => {
                        continuous += event.duration();
                        if continuous >= 8.0 + 0.05 {
                            let next = events.peek().map(|e| (e.kind, e.duration()));
                            prop_assert!(
                                matches!(next, Some((EventKind::OnDuty, d)) if (d - 0.5).abs() < 1e-9),
                                "no break after {} hours on day {}", continuous, day
                            );
                        }
                    }
                    EventKind::OnDuty => {
                        prop_assert!(continuous >= 8.0 - 0.05);
                        continuous = 0.0;
                    }
                    _ => {}
                }
            }
        }
    }

    /// Property: a driver with no cycle hours left gets no logs.
    #[test]
    fn exhausted_cycle_is_fatal(cycle_used in 70.0_f64..200.0, total_miles in 0.0_f64..3000.0) {
        let result = simulator().simulate(&unlocated_stops(3), total_miles, cycle_used);
        prop_assert_eq!(result, Err(CycleExceededError { cycle_used }));
    }
}
