//! OpenRouteService response types.
//!
//! Both the Pelias geocoder and the GeoJSON directions endpoint answer with
//! a feature collection; only the fields the adapter reads are modelled.
//!
//! See: <https://openrouteservice.org/dev/#/api-docs>

use serde::{Deserialize, Serialize};

/// Pelias `/geocode/search` response.
#[derive(Debug, Deserialize)]
pub struct GeocodeResponse {
    /// Matches ordered by confidence.
    #[serde(default)]
    pub features: Vec<PointFeature>,
}

/// A geocoder match.
#[derive(Debug, Deserialize)]
pub struct PointFeature {
    /// Point geometry of the match.
    pub geometry: PointGeometry,
}

/// GeoJSON point, `[longitude, latitude]`.
#[derive(Debug, Deserialize)]
pub struct PointGeometry {
    /// Position of the match.
    pub coordinates: [f64; 2],
}

/// `/v2/directions/{profile}/geojson` request body.
#[derive(Debug, Serialize)]
pub struct DirectionsRequest {
    /// Waypoints as `[longitude, latitude]` pairs.
    pub coordinates: Vec<[f64; 2]>,
}

/// `/v2/directions/{profile}/geojson` response.
#[derive(Debug, Deserialize)]
pub struct DirectionsResponse {
    /// One feature per returned route.
    #[serde(default)]
    pub features: Vec<RouteFeature>,
}

/// A routed path.
#[derive(Debug, Deserialize)]
pub struct RouteFeature {
    /// Route metadata.
    pub properties: RouteProperties,
    /// Path polyline.
    pub geometry: LineGeometry,
}

/// Route metadata.
#[derive(Debug, Deserialize)]
pub struct RouteProperties {
    /// Totals for the whole route.
    pub summary: RouteSummaryProperties,
}

/// Route totals. Missing for zero-length routes.
#[derive(Debug, Default, Deserialize)]
pub struct RouteSummaryProperties {
    /// Distance in metres.
    #[serde(default)]
    pub distance: f64,
}

/// GeoJSON line string.
#[derive(Debug, Deserialize)]
pub struct LineGeometry {
    /// `[longitude, latitude]` vertices.
    pub coordinates: Vec<[f64; 2]>,
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    clippy::indexing_slicing,
    reason = "tests index known features"
)]
mod tests {
    use super::*;

    #[test]
    fn deserialise_geocode_response() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {"type": "Feature", "geometry": {"type": "Point", "coordinates": [-87.63, 41.88]},
                 "properties": {"label": "Chicago, IL, USA"}}
            ]
        }"#;

        let response: GeocodeResponse = serde_json::from_str(json).expect("should deserialise");

        assert_eq!(response.features.len(), 1);
        assert_eq!(response.features[0].geometry.coordinates, [-87.63, 41.88]);
    }

    #[test]
    fn deserialise_directions_response() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"summary": {"distance": 160934.0, "duration": 5400.0}},
                "geometry": {"type": "LineString", "coordinates": [[-87.63, 41.88], [-88.0, 41.5]]}
            }]
        }"#;

        let response: DirectionsResponse = serde_json::from_str(json).expect("should deserialise");

        let feature = &response.features[0];
        assert!((feature.properties.summary.distance - 160_934.0).abs() < f64::EPSILON);
        assert_eq!(feature.geometry.coordinates.len(), 2);
    }

    #[test]
    fn directions_request_serialises_coordinates() {
        let body = DirectionsRequest {
            coordinates: vec![[-87.63, 41.88], [-96.8, 32.78]],
        };

        let json = serde_json::to_value(&body).expect("should serialise");

        assert_eq!(json, serde_json::json!({"coordinates": [[-87.63, 41.88], [-96.8, 32.78]]}));
    }
}
