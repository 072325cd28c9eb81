use thiserror::Error;

/// Errors from [`Geocoder`](super::Geocoder) and
/// [`ReverseGeocoder`](super::ReverseGeocoder).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodingError {
    /// The service answered but found nothing for the address.
    #[error("no geocoding match for {address:?}")]
    NoMatch {
        /// Address that was looked up.
        address: String,
    },
    /// The request exceeded its deadline.
    #[error("geocoding request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The service answered with a non-success status.
    #[error("geocoding request to {url} failed with HTTP {status}: {message}")]
    HttpError {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error detail.
        message: String,
    },
    /// The request never reached the service.
    #[error("geocoding request to {url} failed: {message}")]
    NetworkError {
        /// Requested URL.
        url: String,
        /// Error detail.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to parse geocoding response: {message}")]
    ParseError {
        /// Error detail.
        message: String,
    },
}

/// Errors from [`Router::route`](super::Router::route).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// Fewer than two waypoints were supplied.
    #[error("routing needs at least 2 waypoints, got {count}")]
    TooFewWaypoints {
        /// Number of waypoints received.
        count: usize,
    },
    /// The request exceeded its deadline.
    #[error("routing request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The service answered with a non-success status.
    #[error("routing request to {url} failed with HTTP {status}: {message}")]
    HttpError {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error detail.
        message: String,
    },
    /// The request never reached the service.
    #[error("routing request to {url} failed: {message}")]
    NetworkError {
        /// Requested URL.
        url: String,
        /// Error detail.
        message: String,
    },
    /// The service returned no usable route.
    #[error("routing service returned no route: {message}")]
    NoRoute {
        /// Error detail.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to parse routing response: {message}")]
    ParseError {
        /// Error detail.
        message: String,
    },
}

/// Errors from [`PoiSearch::search`](super::PoiSearch::search).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// The provider asked us to slow down (HTTP 429).
    #[error("POI search was rate limited")]
    RateLimited,
    /// The request exceeded its deadline.
    #[error("POI search request to {url} timed out after {timeout_secs}s")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Configured timeout.
        timeout_secs: u64,
    },
    /// The service answered with a non-success status other than 429.
    #[error("POI search request to {url} failed with HTTP {status}: {message}")]
    HttpError {
        /// Requested URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Error detail.
        message: String,
    },
    /// The request never reached the service.
    #[error("POI search request to {url} failed: {message}")]
    NetworkError {
        /// Requested URL.
        url: String,
        /// Error detail.
        message: String,
    },
    /// The response body could not be decoded.
    #[error("failed to parse POI search response: {message}")]
    ParseError {
        /// Error detail.
        message: String,
    },
}
