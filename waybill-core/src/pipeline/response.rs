use serde::{Deserialize, Serialize};

use crate::{LogDay, RouteGeometry, Stop, Trip};

/// Outcome tag carried by every response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// A plan was produced, possibly from fallback data.
    Success,
    /// No plan could be produced.
    Error,
}

/// A complete trip plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TripPlan {
    /// Always [`ResponseStatus::Success`].
    pub status: ResponseStatus,
    /// The validated trip.
    pub trip: Trip,
    /// Route distance in miles, rounded to two decimals.
    pub total_miles: f64,
    /// Duty log records in order.
    pub eld_logs: Vec<LogDay>,
    /// Route polyline, absent when routing failed.
    pub route_geometry: Option<RouteGeometry>,
    /// Planned stops ordered by sequence.
    pub stops: Vec<Stop>,
    /// Human-readable notes about degraded data.
    pub warnings: Vec<String>,
}

/// Error body returned at the request boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always [`ResponseStatus::Error`].
    pub status: ResponseStatus,
    /// Message suitable for end users.
    pub message: String,
    /// Diagnostic detail.
    pub system_message: String,
}

impl ErrorResponse {
    /// Build an error body.
    #[must_use]
    pub fn new(message: impl Into<String>, system_message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            system_message: system_message.into(),
        }
    }
}
