//! Hours-of-service limits and driving assumptions.
//!
//! Only the subset of driver rules that the planner and
//! simulator enforce is modelled here. Restarts and sleeper-berth splits are
//! not.

/// Maximum on-duty hours in the rolling 8-day cycle.
pub const MAX_CYCLE_HOURS: f64 = 70.0;

/// Maximum driving hours before the driver must stop for the day.
pub const MAX_DAILY_DRIVING_HOURS: f64 = 11.0;

/// Continuous driving hours that trigger a mandatory break.
pub const MAX_CONSECUTIVE_DRIVING_HOURS: f64 = 8.0;

/// Length of the daily duty window in hours.
pub const DUTY_WINDOW_HOURS: f64 = 14.0;

/// Length of the mandatory break in hours.
pub const MANDATORY_BREAK_HOURS: f64 = 0.5;

/// Hours in a calendar day.
pub const HOURS_PER_DAY: f64 = 24.0;

/// Assumed average speed in miles per hour.
pub const AVERAGE_SPEED_MPH: f64 = 50.0;

/// Distance between planned fuel stops in miles.
pub const FUEL_INTERVAL_MILES: f64 = 1000.0;

/// Driving hours between planned rest stops.
pub const REST_BREAK_INTERVAL_HOURS: f64 = 8.0;

/// Fuel stops at or beyond this share of the trip are dropped.
pub const FUEL_CUTOFF_RATIO: f64 = 0.95;

/// Rest stops at or beyond this share of the trip are dropped.
pub const REST_CUTOFF_RATIO: f64 = 0.9;
