//! Planned stops and their typed metadata.

use std::collections::BTreeMap;

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::geometry::lat_lng;

/// What happens at a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopKind {
    /// Load collection.
    Pickup,
    /// Refuelling.
    Fuel,
    /// Mandatory rest break.
    Rest,
    /// Load delivery.
    Dropoff,
}

impl StopKind {
    /// Fixed time spent at a stop of this kind.
    #[must_use]
    pub const fn duration_minutes(self) -> u32 {
        match self {
            Self::Pickup | Self::Dropoff => 60,
            Self::Fuel | Self::Rest => 30,
        }
    }

    /// Lowercase label used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Fuel => "fuel",
            Self::Rest => "rest",
            Self::Dropoff => "dropoff",
        }
    }
}

impl std::fmt::Display for StopKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Known metadata attached to a stop, plus an open extension map.
///
/// Coordinates serialise as `[latitude, longitude]`. Unknown keys found when
/// deserialising land in [`StopMetadata::extra`] and are written back out
/// unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopMetadata {
    /// Where the stop is, when known.
    #[serde(
        default,
        with = "lat_lng::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub coordinates: Option<Coord<f64>>,
    /// Postal address of a resolved point of interest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Human-readable reason for the stop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
    /// Whether the stop was synthesised instead of resolved.
    #[serde(default)]
    pub is_fallback: bool,
    /// Radius at which the point of interest was found.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_radius_km: Option<f64>,
    /// Projected distance along the route in miles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_mileage: Option<f64>,
    /// Forward-compatible extension fields.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl StopMetadata {
    /// Metadata with only a purpose set.
    #[must_use]
    pub fn with_purpose(purpose: impl Into<String>) -> Self {
        Self {
            purpose: Some(purpose.into()),
            ..Self::default()
        }
    }

    /// Set the coordinates.
    #[must_use]
    pub fn at(mut self, coordinates: Option<Coord<f64>>) -> Self {
        self.coordinates = coordinates;
        self
    }

    /// Mark the stop as synthesised.
    #[must_use]
    pub fn fallback(mut self, is_fallback: bool) -> Self {
        self.is_fallback = is_fallback;
        self
    }
}

/// A stop on a trip's itinerary.
///
/// # Examples
/// ```
/// use waybill_core::{Stop, StopKind, StopMetadata};
///
/// let stop = Stop::new(StopKind::Fuel, "Pilot Travel Center", 2, StopMetadata::default());
/// assert_eq!(stop.duration_minutes, 30);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Display label, usually an address or POI name.
    pub location: String,
    /// What happens at the stop.
    pub stop_type: StopKind,
    /// Time spent at the stop.
    pub duration_minutes: u32,
    /// One-based position in the itinerary.
    pub sequence: u32,
    /// Typed metadata.
    pub metadata: StopMetadata,
}

impl Stop {
    /// Build a stop whose duration follows from its kind.
    #[must_use]
    pub fn new(
        stop_type: StopKind,
        location: impl Into<String>,
        sequence: u32,
        metadata: StopMetadata,
    ) -> Self {
        Self {
            location: location.into(),
            stop_type,
            duration_minutes: stop_type.duration_minutes(),
            sequence,
            metadata,
        }
    }

    /// Time spent at the stop in hours.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "minutes to hours")]
    pub fn duration_hours(&self) -> f64 {
        f64::from(self.duration_minutes) / 60.0
    }
}
