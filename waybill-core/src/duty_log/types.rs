//! Log records and duty events emitted by the simulator.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{StopKind, StopMetadata};

/// Duty status recorded by an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Behind the wheel.
    Driving,
    /// On duty, not driving. Used for mandatory breaks.
    OnDuty,
    /// Loading at the pickup.
    Pickup,
    /// Refuelling.
    Fuel,
    /// Resting at a planned rest stop.
    Rest,
    /// Unloading at the dropoff.
    Dropoff,
}

impl From<StopKind> for EventKind {
    fn from(kind: StopKind) -> Self {
        match kind {
            StopKind::Pickup => Self::Pickup,
            StopKind::Fuel => Self::Fuel,
            StopKind::Rest => Self::Rest,
            StopKind::Dropoff => Self::Dropoff,
        }
    }
}

/// Details of a driving chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentMetadata {
    /// Label of the stop the segment leaves.
    pub from: String,
    /// Label of the stop the segment heads to.
    pub to: String,
    /// Miles covered by this chunk at the average speed.
    pub estimated_miles: f64,
}

/// Metadata attached to an event: segment details for driving, the stop's
/// own metadata for stop events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventMetadata {
    /// Driving chunk.
    Segment(SegmentMetadata),
    /// Stop event.
    Stop(StopMetadata),
}

/// One entry in a duty log. Times are hours since the start of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DutyEvent {
    /// Duty status.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Start hour.
    pub start: f64,
    /// End hour. May exceed 24 when a stop runs past midnight.
    pub end: f64,
    /// Human-readable location.
    pub location: String,
    /// Optional details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<EventMetadata>,
}

impl DutyEvent {
    /// Length of the event in hours.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "event length")]
    pub const fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// A log record for one simulated day.
///
/// Several records may share a day number: each driving chunk and each stop
/// gets its own record, and rollovers leave an empty marker record behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogDay {
    /// One-based day number.
    pub day: u32,
    /// Calendar date of the day.
    pub date: NaiveDate,
    /// Events in time order.
    pub events: Vec<DutyEvent>,
    /// Cumulative miles driven at the end of the record.
    pub odometer: f64,
}

impl LogDay {
    /// Total hours of driving events in this record.
    #[must_use]
    pub fn driving_hours(&self) -> f64 {
        self.events
            .iter()
            .filter(|event| event.kind == EventKind::Driving)
            .map(DutyEvent::duration)
            .sum()
    }
}
