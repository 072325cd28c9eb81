//! HTTP client for the OpenRouteService geocoding and directions APIs.

use std::time::Duration;

use geo::Coord;
use log::debug;
use reqwest::{Request, header::AUTHORIZATION};
use waybill_core::{Geocoder, GeocodingError, RouteSummary, Router, RoutingError};

use super::schema::{DirectionsRequest, DirectionsResponse, GeocodeResponse};
use crate::http::{
    Bridge, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT, ProviderBuildError, RequestFailure, endpoint,
};

/// Public OpenRouteService endpoint.
pub const DEFAULT_ORS_BASE_URL: &str = "https://api.openrouteservice.org";

const METERS_PER_MILE: f64 = 1609.34;

/// Configuration for [`OrsClient`].
#[derive(Debug, Clone)]
pub struct OrsConfig {
    /// Service root, e.g. `"https://api.openrouteservice.org"`.
    pub base_url: String,
    /// API key sent in the `Authorization` header.
    pub api_key: String,
    /// Request timeout.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl Default for OrsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ORS_BASE_URL.to_owned(),
            api_key: String::new(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }
}

impl OrsConfig {
    /// Create a configuration for the public service with `api_key`.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Default::default()
        }
    }

    /// Point the client at a different deployment.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
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

/// OpenRouteService client implementing [`Geocoder`] and [`Router`].
///
/// Requests run on an internal Tokio runtime unless the caller is already
/// inside a multi-threaded runtime, in which case that runtime is borrowed.
#[derive(Debug)]
pub struct OrsClient {
    bridge: Bridge,
    config: OrsConfig,
}

impl OrsClient {
    /// Create a client for the public service.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(OrsConfig::new(api_key))
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client or Tokio runtime fails to build.
    pub fn with_config(config: OrsConfig) -> Result<Self, ProviderBuildError> {
        let bridge = Bridge::new(&config.user_agent, config.timeout)?;
        Ok(Self { bridge, config })
    }

    fn geocode_request(&self, address: &str) -> reqwest::Result<Request> {
        self.bridge
            .client
            .get(endpoint(&self.config.base_url, "geocode/search"))
            .query(&[("text", address), ("size", "1")])
            .header(AUTHORIZATION, &self.config.api_key)
            .build()
    }

    fn directions_request(&self, waypoints: &[Coord<f64>]) -> reqwest::Result<Request> {
        let body = DirectionsRequest {
            coordinates: waypoints.iter().map(|c| [c.x, c.y]).collect(),
        };
        self.bridge
            .client
            .post(endpoint(&self.config.base_url, "v2/directions/driving-car/geojson"))
            .header(AUTHORIZATION, &self.config.api_key)
            .json(&body)
            .build()
    }

    async fn geocode_async(&self, address: &str) -> Result<Coord<f64>, GeocodingError> {
        let request = self
            .geocode_request(address)
            .map_err(|err| GeocodingError::ParseError {
                message: err.to_string(),
            })?;
        let url = request.url().to_string();
        debug!("geocoding {address:?} via {url}");

        let response = self
            .bridge
            .client
            .execute(request)
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| RequestFailure::classify(&err, &url, self.config.timeout))?;
        let body: GeocodeResponse =
            response
                .json()
                .await
                .map_err(|err| GeocodingError::ParseError {
                    message: err.to_string(),
                })?;

        convert_geocode(address, body)
    }

    async fn route_async(&self, waypoints: &[Coord<f64>]) -> Result<RouteSummary, RoutingError> {
        let request = self
            .directions_request(waypoints)
            .map_err(|err| RoutingError::ParseError {
                message: err.to_string(),
            })?;
        let url = request.url().to_string();
        debug!("routing {} waypoints via {url}", waypoints.len());

        let response = self
            .bridge
            .client
            .execute(request)
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|err| RequestFailure::classify(&err, &url, self.config.timeout))?;
        let body: DirectionsResponse =
            response
                .json()
                .await
                .map_err(|err| RoutingError::ParseError {
                    message: err.to_string(),
                })?;

        convert_directions(body)
    }
}

fn convert_geocode(
    address: &str,
    response: GeocodeResponse,
) -> Result<Coord<f64>, GeocodingError> {
    let feature = response
        .features
        .into_iter()
        .next()
        .ok_or_else(|| GeocodingError::NoMatch {
            address: address.to_owned(),
        })?;
    let [x, y] = feature.geometry.coordinates;
    Ok(Coord { x, y })
}

#[expect(clippy::float_arithmetic, reason = "metres to rounded miles")]
fn convert_directions(response: DirectionsResponse) -> Result<RouteSummary, RoutingError> {
    let feature = response
        .features
        .into_iter()
        .next()
        .ok_or_else(|| RoutingError::NoRoute {
            message: "directions response contained no features".to_owned(),
        })?;
    let miles = feature.properties.summary.distance / METERS_PER_MILE;
    Ok(RouteSummary {
        distance_miles: (miles * 100.0).round() / 100.0,
        geometry: feature
            .geometry
            .coordinates
            .into_iter()
            .map(|[x, y]| Coord { x, y })
            .collect(),
    })
}

impl Geocoder for OrsClient {
    fn geocode(&self, address: &str) -> Result<Coord<f64>, GeocodingError> {
        self.bridge.block_on(self.geocode_async(address))
    }
}

impl Router for OrsClient {
    /// Route through `waypoints` with the `driving-car` profile.
    ///
    /// The directions endpoint cannot reorder waypoints, so `optimize` is
    /// logged and otherwise ignored.
    fn route(
        &self,
        waypoints: &[Coord<f64>],
        optimize: bool,
    ) -> Result<RouteSummary, RoutingError> {
        if waypoints.len() < 2 {
            return Err(RoutingError::TooFewWaypoints {
                count: waypoints.len(),
            });
        }
        if optimize {
            debug!("waypoint optimisation requested; routing in the given order");
        }
        self.bridge.block_on(self.route_async(waypoints))
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    clippy::indexing_slicing,
    reason = "tests compare converted distances and index known points"
)]
mod tests {
    use super::*;
    use crate::ors::schema::{
        LineGeometry, PointFeature, PointGeometry, RouteFeature, RouteProperties,
        RouteSummaryProperties,
    };
    use rstest::{fixture, rstest};

    #[fixture]
    fn client() -> OrsClient {
        let config = OrsConfig::new("secret").with_base_url("https://ors.example.com/");
        OrsClient::with_config(config).expect("client should build")
    }

    #[rstest]
    fn geocode_request_encodes_the_address(client: OrsClient) {
        let request = client.geocode_request("Chicago, IL").expect("request");

        assert_eq!(
            request.url().as_str(),
            "https://ors.example.com/geocode/search?text=Chicago%2C+IL&size=1"
        );
        assert_eq!(
            request.headers().get(AUTHORIZATION).map(|v| v.as_bytes()),
            Some(b"secret".as_slice())
        );
    }

    #[rstest]
    fn directions_request_posts_lon_lat_pairs(client: OrsClient) {
        let waypoints = [Coord { x: -87.63, y: 41.88 }, Coord { x: -96.8, y: 32.78 }];

        let request = client.directions_request(&waypoints).expect("request");

        assert_eq!(request.method(), reqwest::Method::POST);
        assert_eq!(
            request.url().as_str(),
            "https://ors.example.com/v2/directions/driving-car/geojson"
        );
        let body = request
            .body()
            .and_then(reqwest::Body::as_bytes)
            .expect("buffered body");
        let json: serde_json::Value = serde_json::from_slice(body).expect("json body");
        assert_eq!(json["coordinates"][1], serde_json::json!([-96.8, 32.78]));
    }

    #[rstest]
    fn first_geocode_feature_wins() {
        let response = GeocodeResponse {
            features: vec![
                PointFeature {
                    geometry: PointGeometry {
                        coordinates: [-87.63, 41.88],
                    },
                },
                PointFeature {
                    geometry: PointGeometry {
                        coordinates: [0.0, 0.0],
                    },
                },
            ],
        };

        let coord = convert_geocode("Chicago, IL", response).expect("match");

        assert_eq!(coord, Coord { x: -87.63, y: 41.88 });
    }

    #[rstest]
    fn empty_geocode_is_no_match() {
        let result = convert_geocode("Atlantis", GeocodeResponse { features: vec![] });

        assert_eq!(
            result,
            Err(GeocodingError::NoMatch {
                address: "Atlantis".to_owned()
            })
        );
    }

    #[rstest]
    fn directions_distance_is_converted_to_miles() {
        let response = DirectionsResponse {
            features: vec![RouteFeature {
                properties: RouteProperties {
                    summary: RouteSummaryProperties { distance: 1_000_000.0 },
                },
                geometry: LineGeometry {
                    coordinates: vec![[-87.63, 41.88], [-96.8, 32.78]],
                },
            }],
        };

        let summary = convert_directions(response).expect("route");

        assert!((summary.distance_miles - 621.37).abs() < 1e-9);
        assert_eq!(summary.geometry[1], Coord { x: -96.8, y: 32.78 });
    }

    #[rstest]
    fn missing_route_is_reported() {
        let result = convert_directions(DirectionsResponse { features: vec![] });

        assert!(matches!(result, Err(RoutingError::NoRoute { .. })));
    }

    #[rstest]
    fn single_waypoint_is_rejected_before_any_request(client: OrsClient) {
        let result = client.route(&[Coord { x: 0.0, y: 0.0 }], false);

        assert_eq!(result, Err(RoutingError::TooFewWaypoints { count: 1 }));
    }
}
