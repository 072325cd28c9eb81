//! Hours-of-service replay of a planned itinerary.
//!
//! The simulator walks consecutive stop pairs, splits the driving between
//! them into chunks bounded by the daily driving cap, inserts mandatory
//! breaks and rolls over to new days. It emits one [`LogDay`] record per
//! driving chunk and per stop, plus an empty marker record whenever a
//! driving rollover closes a day.
//!
//! Two interactions are replayed as-is rather than tightened into stricter
//! rules: the 14 hour window is checked against a clock that a stop-duration
//! rollover also resets, and that rollover zeroes the driving counter even
//! though no driving cap was reached. The mandatory break zeroes the same
//! counter, so a single day number can carry more than 11 hours of driving
//! spread over several records.

mod types;

use chrono::{Days, NaiveDate};
use thiserror::Error;

use crate::{
    Stop,
    geometry::{great_circle_miles, round2},
    hos::{
        AVERAGE_SPEED_MPH, DUTY_WINDOW_HOURS, HOURS_PER_DAY, MANDATORY_BREAK_HOURS,
        MAX_CONSECUTIVE_DRIVING_HOURS, MAX_CYCLE_HOURS, MAX_DAILY_DRIVING_HOURS,
    },
};

pub use types::{DutyEvent, EventKind, EventMetadata, LogDay, SegmentMetadata};

/// Tolerance for comparing accumulated hours.
const EPSILON: f64 = 1e-9;

/// The driver has no hours left in the 70 hour cycle.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("driver has already used {cycle_used} of {MAX_CYCLE_HOURS} cycle hours")]
pub struct CycleExceededError {
    /// Hours already used when the simulation was requested.
    pub cycle_used: f64,
}

#[derive(Debug)]
struct Shift {
    day: u32,
    clock: f64,
    driven: f64,
    odometer: f64,
}

impl Shift {
    const fn new() -> Self {
        Self {
            day: 1,
            clock: 0.0,
            driven: 0.0,
            odometer: 0.0,
        }
    }

    fn roll_over(&mut self) {
        self.day += 1;
        self.clock = 0.0;
        self.driven = 0.0;
    }

    #[expect(clippy::float_arithmetic, reason = "tolerant comparison")]
    fn needs_new_day(&self) -> bool {
        self.driven + EPSILON >= MAX_DAILY_DRIVING_HOURS || self.clock + EPSILON >= DUTY_WINDOW_HOURS
    }
}

/// Replays stops against the hours-of-service rules.
///
/// # Examples
/// ```
/// use chrono::NaiveDate;
/// use waybill_core::{DutyLogSimulator, EventKind, Stop, StopKind, StopMetadata};
///
/// let stops = vec![
///     Stop::new(StopKind::Pickup, "Chicago, IL", 1, StopMetadata::default()),
///     Stop::new(StopKind::Dropoff, "St. Louis, MO", 2, StopMetadata::default()),
/// ];
/// let start = NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date");
/// let logs = DutyLogSimulator::new(start).simulate(&stops, 300.0, 20.0)?;
/// let kinds: Vec<EventKind> = logs.iter().flat_map(|d| d.events.iter().map(|e| e.kind)).collect();
/// assert_eq!(kinds, vec![EventKind::Pickup, EventKind::Driving, EventKind::Dropoff]);
/// # Ok::<(), waybill_core::CycleExceededError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DutyLogSimulator {
    start_date: NaiveDate,
}

impl DutyLogSimulator {
    /// A simulator whose day 1 falls on `start_date`.
    #[must_use]
    pub const fn new(start_date: NaiveDate) -> Self {
        Self { start_date }
    }

    /// Calendar date of day 1.
    #[must_use]
    pub const fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    /// Simulate the itinerary and return the log records in order.
    ///
    /// `total_miles` is spread evenly over segments whose endpoints lack
    /// coordinates.
    ///
    /// # Errors
    /// [`CycleExceededError`] when `cycle_used` leaves no hours in the
    /// 70 hour cycle. No records are produced in that case.
    #[expect(clippy::float_arithmetic, reason = "remaining cycle hours")]
    pub fn simulate(
        &self,
        stops: &[Stop],
        total_miles: f64,
        cycle_used: f64,
    ) -> Result<Vec<LogDay>, CycleExceededError> {
        if MAX_CYCLE_HOURS - cycle_used <= 0.0 {
            return Err(CycleExceededError { cycle_used });
        }

        let mut logs = Vec::new();
        let mut shift = Shift::new();
        if let Some(first) = stops.first() {
            self.record_stop(&mut logs, &mut shift, first);
        }
        for pair in stops.windows(2) {
            if let [previous, current] = pair {
                let miles = segment_miles(previous, current, total_miles, stops.len());
                self.drive(&mut logs, &mut shift, previous, current, miles);
                self.record_stop(&mut logs, &mut shift, current);
            }
        }
        Ok(logs)
    }

    #[expect(clippy::float_arithmetic, reason = "hours and mileage accumulation")]
    fn drive(
        &self,
        logs: &mut Vec<LogDay>,
        shift: &mut Shift,
        from: &Stop,
        to: &Stop,
        miles: f64,
    ) {
        let mut remaining = round2(miles / AVERAGE_SPEED_MPH);
        while remaining > EPSILON {
            if shift.needs_new_day() {
                logs.push(self.record(shift, Vec::new()));
                shift.roll_over();
            }

            let chunk = (MAX_DAILY_DRIVING_HOURS - shift.driven).min(remaining);
            let start = shift.clock;
            shift.clock += chunk;
            shift.odometer += chunk * AVERAGE_SPEED_MPH;
            shift.driven += chunk;
            remaining -= chunk;

            let mut events = vec![DutyEvent {
                kind: EventKind::Driving,
                start: round2(start),
                end: round2(shift.clock),
                location: format!("Driving to {}", to.location),
                metadata: Some(EventMetadata::Segment(SegmentMetadata {
                    from: from.location.clone(),
                    to: to.location.clone(),
                    estimated_miles: round2(chunk * AVERAGE_SPEED_MPH),
                })),
            }];
            if shift.driven + EPSILON >= MAX_CONSECUTIVE_DRIVING_HOURS {
                events.push(DutyEvent {
                    kind: EventKind::OnDuty,
                    start: round2(shift.clock),
                    end: round2(shift.clock + MANDATORY_BREAK_HOURS),
                    location: "Mandatory 30-minute rest".to_owned(),
                    metadata: None,
                });
                shift.clock += MANDATORY_BREAK_HOURS;
                shift.driven = 0.0;
            }
            logs.push(self.record(shift, events));
        }
    }

    #[expect(clippy::float_arithmetic, reason = "duty clock accumulation")]
    fn record_stop(&self, logs: &mut Vec<LogDay>, shift: &mut Shift, stop: &Stop) {
        let duration = stop.duration_hours();
        if shift.clock + duration > HOURS_PER_DAY {
            shift.roll_over();
        }
        let event = DutyEvent {
            kind: stop.stop_type.into(),
            start: round2(shift.clock),
            end: round2(shift.clock + duration),
            location: stop.location.clone(),
            metadata: Some(EventMetadata::Stop(stop.metadata.clone())),
        };
        logs.push(self.record(shift, vec![event]));
        shift.clock += duration;
    }

    fn record(&self, shift: &Shift, events: Vec<DutyEvent>) -> LogDay {
        LogDay {
            day: shift.day,
            date: self.date_of(shift.day),
            events,
            odometer: round2(shift.odometer),
        }
    }

    fn date_of(&self, day: u32) -> NaiveDate {
        self.start_date
            .checked_add_days(Days::new(u64::from(day.saturating_sub(1))))
            .unwrap_or(NaiveDate::MAX)
    }
}

#[expect(
    clippy::float_arithmetic,
    clippy::cast_precision_loss,
    reason = "stop counts are tiny compared to the f64 mantissa"
)]
fn segment_miles(previous: &Stop, current: &Stop, total_miles: f64, stop_count: usize) -> f64 {
    match (previous.metadata.coordinates, current.metadata.coordinates) {
        (Some(from), Some(to)) => great_circle_miles(from, to),
        _ => total_miles / (stop_count.saturating_sub(1).max(1)) as f64,
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    clippy::indexing_slicing,
    reason = "tests compare hours and index known log records"
)]
mod tests {
    use super::*;
    use crate::{StopKind, StopMetadata};
    use geo::Coord;
    use rstest::{fixture, rstest};

    #[fixture]
    fn simulator() -> DutyLogSimulator {
        DutyLogSimulator::new(NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date"))
    }

    fn endpoints() -> Vec<Stop> {
        vec![
            Stop::new(StopKind::Pickup, "A", 1, StopMetadata::default()),
            Stop::new(StopKind::Dropoff, "B", 2, StopMetadata::default()),
        ]
    }

    type Row = (u32, Vec<(EventKind, f64, f64)>);

    fn rows(logs: &[LogDay]) -> Vec<Row> {
        logs.iter()
            .map(|d| {
                (
                    d.day,
                    d.events.iter().map(|e| (e.kind, e.start, e.end)).collect(),
                )
            })
            .collect()
    }

    #[rstest]
    #[case(70.0)]
    #[case(75.0)]
    fn exhausted_cycle_is_fatal(simulator: DutyLogSimulator, #[case] used: f64) {
        let err = simulator
            .simulate(&endpoints(), 500.0, used)
            .expect_err("no cycle hours left");
        assert_eq!(err, CycleExceededError { cycle_used: used });
    }

    #[rstest]
    fn break_resets_the_counter_within_a_day(simulator: DutyLogSimulator) {
        let logs = simulator.simulate(&endpoints(), 600.0, 0.0).expect("simulate");
        assert_eq!(
            rows(&logs),
            vec![
                (1, vec![(EventKind::Pickup, 0.0, 1.0)]),
                (
                    1,
                    vec![
                        (EventKind::Driving, 1.0, 12.0),
                        (EventKind::OnDuty, 12.0, 12.5)
                    ]
                ),
                (1, vec![(EventKind::Driving, 12.5, 13.5)]),
                (1, vec![(EventKind::Dropoff, 13.5, 14.5)]),
            ]
        );
        let odometers: Vec<f64> = logs.iter().map(|d| d.odometer).collect();
        assert_eq!(odometers, vec![0.0, 550.0, 600.0, 600.0]);
    }

    #[rstest]
    fn duty_window_rolls_over_with_marker(simulator: DutyLogSimulator) {
        let logs = simulator.simulate(&endpoints(), 1500.0, 0.0).expect("simulate");
        assert_eq!(
            rows(&logs),
            vec![
                (1, vec![(EventKind::Pickup, 0.0, 1.0)]),
                (
                    1,
                    vec![
                        (EventKind::Driving, 1.0, 12.0),
                        (EventKind::OnDuty, 12.0, 12.5)
                    ]
                ),
                (
                    1,
                    vec![
                        (EventKind::Driving, 12.5, 23.5),
                        (EventKind::OnDuty, 23.5, 24.0)
                    ]
                ),
                (1, vec![]),
                (
                    2,
                    vec![
                        (EventKind::Driving, 0.0, 8.0),
                        (EventKind::OnDuty, 8.0, 8.5)
                    ]
                ),
                (2, vec![(EventKind::Dropoff, 8.5, 9.5)]),
            ]
        );
        assert_eq!(logs[3].odometer, 1100.0);
        assert_eq!(logs[4].date, NaiveDate::from_ymd_opt(2025, 3, 4).expect("valid date"));
    }

    #[rstest]
    fn stop_past_midnight_rolls_over_without_marker(simulator: DutyLogSimulator) {
        let logs = simulator.simulate(&endpoints(), 1100.0, 0.0).expect("simulate");
        let last = logs.last().expect("dropoff record");
        assert_eq!(logs.len(), 4);
        assert_eq!(last.day, 2);
        assert_eq!(rows(&logs[3..]), vec![(2, vec![(EventKind::Dropoff, 0.0, 1.0)])]);
    }

    #[rstest]
    fn segments_use_coordinates_when_known(simulator: DutyLogSimulator) {
        let chicago = Coord { x: -87.6298, y: 41.8781 };
        let st_louis = Coord { x: -90.1994, y: 38.6270 };
        let stops = vec![
            Stop::new(
                StopKind::Pickup,
                "Chicago",
                1,
                StopMetadata::default().at(Some(chicago)),
            ),
            Stop::new(
                StopKind::Dropoff,
                "St. Louis",
                2,
                StopMetadata::default().at(Some(st_louis)),
            ),
        ];
        let logs = simulator.simulate(&stops, 9999.0, 0.0).expect("simulate");
        let drive = &logs[1].events[0];
        assert_eq!(drive.location, "Driving to St. Louis");
        let expected = round2(great_circle_miles(chicago, st_louis) / AVERAGE_SPEED_MPH);
        assert!((drive.duration() - expected).abs() < 0.011);
        match &drive.metadata {
            Some(EventMetadata::Segment(segment)) => {
                assert_eq!(segment.from, "Chicago");
                assert_eq!(segment.to, "St. Louis");
            }
            other => panic!("expected segment metadata, got {other:?}"),
        }
    }

    #[rstest]
    fn events_serialise_with_type_tag(simulator: DutyLogSimulator) {
        let logs = simulator.simulate(&endpoints(), 100.0, 0.0).expect("simulate");
        let json = serde_json::to_value(&logs[1]).expect("serialise");
        assert_eq!(
            json,
            serde_json::json!({
                "day": 1,
                "date": "2025-03-03",
                "events": [{
                    "type": "driving",
                    "start": 1.0,
                    "end": 3.0,
                    "location": "Driving to B",
                    "metadata": {"from": "A", "to": "B", "estimated_miles": 100.0},
                }],
                "odometer": 100.0,
            })
        );
    }

    #[rstest]
    fn single_stop_logs_only_that_stop(simulator: DutyLogSimulator) {
        let stops = vec![Stop::new(StopKind::Pickup, "A", 1, StopMetadata::default())];
        let logs = simulator.simulate(&stops, 0.0, 0.0).expect("simulate");
        assert_eq!(rows(&logs), vec![(1, vec![(EventKind::Pickup, 0.0, 1.0)])]);
    }
}
