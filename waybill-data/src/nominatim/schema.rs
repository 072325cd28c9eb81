//! Nominatim `jsonv2` response types.
//!
//! See: <https://nominatim.org/release-docs/latest/api/Output/>

use serde::Deserialize;

/// `/reverse` response. Unmapped locations answer `200 OK` with an `error`
/// field instead of a place.
#[derive(Debug, Deserialize)]
pub struct ReverseResponse {
    /// Full place description.
    pub display_name: Option<String>,
    /// Reason no place was found.
    pub error: Option<String>,
}

/// One `/search` hit. Coordinates arrive as decimal strings.
#[derive(Debug, Deserialize)]
pub struct SearchHit {
    /// Full place description.
    pub display_name: String,
    /// Latitude.
    pub lat: String,
    /// Longitude.
    pub lon: String,
}

#[cfg(test)]
#[expect(
    clippy::indexing_slicing,
    reason = "tests index known hits"
)]
mod tests {
    use super::*;

    #[test]
    fn deserialise_reverse_place() {
        let json = r#"{"place_id": 1, "display_name": "I-80, Joliet, Illinois, United States",
                       "lat": "41.5", "lon": "-88.1"}"#;

        let response: ReverseResponse = serde_json::from_str(json).expect("should deserialise");

        assert_eq!(
            response.display_name.as_deref(),
            Some("I-80, Joliet, Illinois, United States")
        );
        assert!(response.error.is_none());
    }

    #[test]
    fn deserialise_reverse_miss() {
        let json = r#"{"error": "Unable to geocode"}"#;

        let response: ReverseResponse = serde_json::from_str(json).expect("should deserialise");

        assert!(response.display_name.is_none());
        assert_eq!(response.error.as_deref(), Some("Unable to geocode"));
    }

    #[test]
    fn deserialise_search_hits() {
        let json = r#"[{"place_id": 9, "display_name": "Pilot, I-35, Oklahoma City",
                        "lat": "35.5", "lon": "-97.5", "category": "amenity"}]"#;

        let hits: Vec<SearchHit> = serde_json::from_str(json).expect("should deserialise");

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].lat, "35.5");
    }
}
