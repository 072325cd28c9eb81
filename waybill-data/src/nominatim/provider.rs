//! HTTP client for Nominatim reverse geocoding and keyword search.

use std::time::Duration;

use geo::Coord;
use log::debug;
use reqwest::Request;
use waybill_core::{
    GeocodingError, PoiCandidate, PoiSearch, ReverseGeocoder, SearchError, SearchQuery,
};

use super::schema::{ReverseResponse, SearchHit};
use crate::http::{Bridge, DEFAULT_USER_AGENT, ProviderBuildError, RequestFailure, endpoint};

/// Public Nominatim endpoint.
pub const DEFAULT_NOMINATIM_BASE_URL: &str = "https://nominatim.openstreetmap.org";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Configuration for [`NominatimClient`].
#[derive(Debug, Clone)]
pub struct NominatimConfig {
    /// Service root, e.g. `"https://nominatim.openstreetmap.org"`.
    pub base_url: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string. The public instance rejects anonymous clients.
    pub user_agent: String,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_NOMINATIM_BASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl NominatimConfig {
    /// Create a configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// Nominatim client implementing [`ReverseGeocoder`] and [`PoiSearch`].
#[derive(Debug)]
pub struct NominatimClient {
    bridge: Bridge,
    config: NominatimConfig,
}

impl NominatimClient {
    /// Create a client with default configuration against `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(NominatimConfig::new(base_url))
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: NominatimConfig) -> Result<Self, ProviderBuildError> {
        let bridge = Bridge::new(&config.user_agent, config.timeout)?;
        Ok(Self { bridge, config })
    }

    fn reverse_request(&self, location: Coord<f64>) -> reqwest::Result<Request> {
        self.bridge
            .client
            .get(endpoint(&self.config.base_url, "reverse"))
            .query(&[
                ("format", "jsonv2".to_owned()),
                ("lat", location.y.to_string()),
                ("lon", location.x.to_string()),
            ])
            .build()
    }

    fn search_request(&self, query: &SearchQuery<'_>) -> reqwest::Result<Request> {
        let min = query.viewbox.min();
        let max = query.viewbox.max();
        self.bridge
            .client
            .get(endpoint(&self.config.base_url, "search"))
            .query(&[
                ("q", query.keyword.to_owned()),
                ("format", "jsonv2".to_owned()),
                ("limit", query.limit.to_string()),
                ("dedupe", "1".to_owned()),
                ("countrycodes", query.countries.join(",")),
                ("viewbox", format!("{},{},{},{}", min.x, min.y, max.x, max.y)),
                ("bounded", "1".to_owned()),
            ])
            .build()
    }

    async fn reverse_async(&self, location: Coord<f64>) -> Result<Option<String>, GeocodingError> {
        let request = self
            .reverse_request(location)
            .map_err(|err| GeocodingError::ParseError {
                message: err.to_string(),
            })?;
        let url = request.url().to_string();
        debug!("reverse geocoding via {url}");

        let response = self
            .bridge
            .client
            .execute(request)
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| RequestFailure::classify(&err, &url, self.config.timeout))?;
        let body: ReverseResponse =
            response
                .json()
                .await
                .map_err(|err| GeocodingError::ParseError {
                    message: err.to_string(),
                })?;

        Ok(convert_reverse(body))
    }

    async fn search_async(
        &self,
        query: &SearchQuery<'_>,
    ) -> Result<Vec<PoiCandidate>, SearchError> {
        let request = self
            .search_request(query)
            .map_err(|err| SearchError::ParseError {
                message: err.to_string(),
            })?;
        let url = request.url().to_string();
        debug!("searching {:?} via {url}", query.keyword);

        let response = self
            .bridge
            .client
            .execute(request)
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| RequestFailure::classify(&err, &url, self.config.timeout))?;
        let hits: Vec<SearchHit> =
            response
                .json()
                .await
                .map_err(|err| SearchError::ParseError {
                    message: err.to_string(),
                })?;

        hits.into_iter().map(convert_hit).collect()
    }
}

fn convert_reverse(response: ReverseResponse) -> Option<String> {
    if let Some(reason) = &response.error {
        debug!("reverse geocode found nothing: {reason}");
    }
    response.display_name.filter(|name| !name.is_empty())
}

fn convert_hit(hit: SearchHit) -> Result<PoiCandidate, SearchError> {
    let parse = |value: &str, axis: &str| {
        value.parse::<f64>().map_err(|err| SearchError::ParseError {
            message: format!("invalid {axis} {value:?}: {err}"),
        })
    };
    let y = parse(&hit.lat, "latitude")?;
    let x = parse(&hit.lon, "longitude")?;
    Ok(PoiCandidate::new(hit.display_name, Coord { x, y }))
}

impl ReverseGeocoder for NominatimClient {
    fn reverse_geocode(&self, location: Coord<f64>) -> Result<Option<String>, GeocodingError> {
        self.bridge.block_on(self.reverse_async(location))
    }
}

impl PoiSearch for NominatimClient {
    fn search(&self, query: &SearchQuery<'_>) -> Result<Vec<PoiCandidate>, SearchError> {
        self.bridge.block_on(self.search_async(query))
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    clippy::indexing_slicing,
    reason = "tests compare viewbox corners"
)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use waybill_core::viewbox;

    #[fixture]
    fn client() -> NominatimClient {
        NominatimClient::new("https://nominatim.example.org/").expect("client should build")
    }

    #[rstest]
    fn reverse_request_sends_lat_then_lon(client: NominatimClient) {
        let request = client
            .reverse_request(Coord { x: -88.1, y: 41.5 })
            .expect("request");

        assert_eq!(
            request.url().as_str(),
            "https://nominatim.example.org/reverse?format=jsonv2&lat=41.5&lon=-88.1"
        );
    }

    #[rstest]
    fn search_request_is_bounded_to_the_viewbox(client: NominatimClient) {
        let countries = vec!["us".to_owned(), "ca".to_owned()];
        let query = SearchQuery {
            keyword: "truck stop",
            viewbox: viewbox(Coord { x: -90.0, y: 40.0 }, 10.0),
            countries: &countries,
            limit: 1,
        };

        let request = client.search_request(&query).expect("request");

        let pairs: Vec<(String, String)> = request
            .url()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        let value = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
                .expect("query parameter")
        };
        assert_eq!(request.url().path(), "/search");
        assert_eq!(value("q"), "truck stop");
        assert_eq!(value("limit"), "1");
        assert_eq!(value("dedupe"), "1");
        assert_eq!(value("countrycodes"), "us,ca");
        assert_eq!(value("bounded"), "1");
        let corners: Vec<f64> = value("viewbox")
            .split(',')
            .map(|v| v.parse().expect("number"))
            .collect();
        assert_eq!(corners.len(), 4);
        assert!((corners[0] - -90.09).abs() < 1e-9);
        assert!((corners[1] - 39.91).abs() < 1e-9);
        assert!((corners[2] - -89.91).abs() < 1e-9);
        assert!((corners[3] - 40.09).abs() < 1e-9);
    }

    #[rstest]
    fn reverse_miss_is_none() {
        let response = ReverseResponse {
            display_name: None,
            error: Some("Unable to geocode".to_owned()),
        };

        assert_eq!(convert_reverse(response), None);
    }

    #[rstest]
    fn reverse_hit_is_the_display_name() {
        let response = ReverseResponse {
            display_name: Some("Joliet, Illinois".to_owned()),
            error: None,
        };

        assert_eq!(convert_reverse(response).as_deref(), Some("Joliet, Illinois"));
    }

    #[rstest]
    fn search_hits_parse_string_coordinates() {
        let hit = SearchHit {
            display_name: "Pilot, I-35".to_owned(),
            lat: "35.5".to_owned(),
            lon: "-97.25".to_owned(),
        };

        let candidate = convert_hit(hit).expect("candidate");

        assert_eq!(candidate.location, Coord { x: -97.25, y: 35.5 });
        assert_eq!(candidate.display_name, "Pilot, I-35");
    }

    #[rstest]
    fn malformed_coordinates_are_parse_errors() {
        let hit = SearchHit {
            display_name: "Nowhere".to_owned(),
            lat: "north".to_owned(),
            lon: "0".to_owned(),
        };

        assert!(matches!(convert_hit(hit), Err(SearchError::ParseError { .. })));
    }
}
