//! Points of interest found near planned stops.

use geo::Coord;
use serde::{Deserialize, Serialize};

use crate::geometry::{great_circle_km, lat_lng};

/// A candidate returned by a [`PoiSearch`](crate::PoiSearch) provider.
///
/// Coordinates are WGS84 with `x = longitude` and `y = latitude`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoiCandidate {
    /// Full display name, typically `"Name, Street, City, ..."`.
    pub display_name: String,
    /// Geospatial position.
    pub location: Coord<f64>,
}

impl PoiCandidate {
    /// Construct a candidate.
    #[must_use]
    pub fn new(display_name: impl Into<String>, location: Coord<f64>) -> Self {
        Self {
            display_name: display_name.into(),
            location,
        }
    }
}

/// A named place resolved near a query point.
///
/// Ephemeral: produced by the resolver, consumed by the stop planner and
/// cached as JSON.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waybill_core::{PoiCandidate, PointOfInterest};
///
/// let candidate = PoiCandidate::new(
///     "Love's Travel Stop, I-70, Hays, Kansas",
///     Coord { x: -99.3, y: 38.9 },
/// );
/// let poi = PointOfInterest::from_candidate(candidate, Coord { x: -99.3, y: 38.9 });
/// assert_eq!(poi.name, "Love's Travel Stop");
/// assert!(poi.distance_km.abs() < 1e-9);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    /// Short name: the first comma-separated segment of the display name.
    pub name: String,
    /// Full display name.
    pub address: String,
    /// Geospatial position.
    #[serde(with = "lat_lng")]
    pub location: Coord<f64>,
    /// Great-circle distance from the query point in kilometres.
    pub distance_km: f64,
}

impl PointOfInterest {
    /// Build a point of interest from a provider candidate and the point it
    /// was searched around.
    #[must_use]
    pub fn from_candidate(candidate: PoiCandidate, query: Coord<f64>) -> Self {
        let name = candidate
            .display_name
            .split(',')
            .next()
            .unwrap_or_default()
            .to_owned();
        let distance_km = great_circle_km(query, candidate.location);
        Self {
            name,
            address: candidate.display_name,
            location: candidate.location,
            distance_km,
        }
    }
}

#[cfg(test)]
#[expect(clippy::float_arithmetic, reason = "tests compare with tolerances")]
mod tests {
    use super::*;

    #[test]
    fn name_without_commas_is_whole_display_name() {
        let poi = PointOfInterest::from_candidate(
            PoiCandidate::new("Rest Area", Coord { x: 1.0, y: 1.0 }),
            Coord { x: 1.0, y: 1.0 },
        );
        assert_eq!(poi.name, "Rest Area");
        assert_eq!(poi.address, "Rest Area");
    }

    #[test]
    fn distance_is_measured_from_query_point() {
        let poi = PointOfInterest::from_candidate(
            PoiCandidate::new("Fuel, Somewhere", Coord { x: 0.0, y: 1.0 }),
            Coord { x: 0.0, y: 0.0 },
        );
        // One degree of latitude is roughly 111 km.
        assert!((poi.distance_km - 111.2).abs() < 0.5);
    }

    #[test]
    fn round_trips_through_cache_encoding() {
        let poi = PointOfInterest::from_candidate(
            PoiCandidate::new("Flying J, Exit 12", Coord { x: -97.1, y: 35.2 }),
            Coord { x: -97.0, y: 35.0 },
        );
        let encoded = serde_json::to_string(&poi).expect("serialise");
        assert!(encoded.contains("[35.2,-97.1]"));
        let decoded: PointOfInterest = serde_json::from_str(&encoded).expect("deserialise");
        assert_eq!(decoded, poi);
    }
}
