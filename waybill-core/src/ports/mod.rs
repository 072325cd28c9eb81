//! Interfaces to the external services the planner depends on.
//!
//! Each trait is synchronous so the core stays embeddable in synchronous
//! contexts; adapters that speak HTTP bridge to async clients internally.
//! All traits require `Send + Sync` so a single set of clients can serve
//! independent trips in parallel.
//!
//! Implementations are constructed once at process start and handed to the
//! planner through [`Services`]. There are no ambient globals.

mod error;

use std::time::Duration;

use geo::{Coord, Rect};

use crate::{PoiCandidate, retry::Pause};

pub use error::{GeocodingError, RoutingError, SearchError};

/// Forward geocoding of free-form addresses.
pub trait Geocoder: Send + Sync {
    /// Resolve `address` to a `(longitude, latitude)` coordinate.
    fn geocode(&self, address: &str) -> Result<Coord<f64>, GeocodingError>;
}

/// Reverse geocoding, used to check that a coordinate lies somewhere named.
pub trait ReverseGeocoder: Send + Sync {
    /// Describe the place at `location`, or `None` when the service knows
    /// nothing there (open water, unmapped land).
    fn reverse_geocode(&self, location: Coord<f64>) -> Result<Option<String>, GeocodingError>;
}

/// Road distance and geometry between waypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    /// Total driving distance in miles.
    pub distance_miles: f64,
    /// Raw route polyline, `(longitude, latitude)` points. Not validated:
    /// consumers wrap it in [`RouteGeometry`](crate::RouteGeometry).
    pub geometry: Vec<Coord<f64>>,
}

/// Driving routes through an ordered list of waypoints.
pub trait Router: Send + Sync {
    /// Route through `waypoints` in order.
    ///
    /// `optimize` asks the service to reorder intermediate waypoints; callers
    /// set it only when more than three waypoints are supplied. Providers
    /// without optimisation support may ignore it.
    fn route(&self, waypoints: &[Coord<f64>], optimize: bool) -> Result<RouteSummary, RoutingError>;
}

/// Parameters for a bounded keyword search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchQuery<'a> {
    /// Free-text keyword, e.g. `"truck stop"`.
    pub keyword: &'a str,
    /// Bounding box the result must fall within.
    pub viewbox: Rect<f64>,
    /// ISO 3166-1 alpha-2 country codes the search is restricted to.
    pub countries: &'a [String],
    /// Maximum number of deduplicated results.
    pub limit: usize,
}

/// Keyword search for points of interest.
pub trait PoiSearch: Send + Sync {
    /// Return ranked candidates for `query`; an empty vector means nothing
    /// matched.
    fn search(&self, query: &SearchQuery<'_>) -> Result<Vec<PoiCandidate>, SearchError>;
}

/// A string key-value store with per-entry expiry.
///
/// Not a synchronisation primitive: concurrent misses on one key may both
/// call out, and the last write wins.
pub trait Cache: Send + Sync {
    /// Fetch a live entry.
    fn get(&self, key: &str) -> Option<String>;
    /// Store `value` under `key` for `ttl`.
    fn set(&self, key: &str, value: String, ttl: Duration);
}

/// The full set of collaborators a trip plan needs, borrowed for the
/// duration of one request.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    /// Address to coordinate lookups.
    pub geocoder: &'a dyn Geocoder,
    /// Coordinate validation.
    pub reverse_geocoder: &'a dyn ReverseGeocoder,
    /// Route distance and geometry.
    pub router: &'a dyn Router,
    /// Fuel and rest area search.
    pub search: &'a dyn PoiSearch,
    /// Shared lookup cache.
    pub cache: &'a dyn Cache,
    /// Backoff sleeps.
    pub pause: &'a dyn Pause,
}

impl std::fmt::Debug for Services<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").finish_non_exhaustive()
    }
}
