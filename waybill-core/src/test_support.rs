//! Deterministic, in-memory port implementations for unit and behaviour
//! tests.
//!
//! Every stub records how it was called so tests can assert on retries,
//! cache use and backoff without touching the network or the clock.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use geo::{Coord, Intersects, Rect};

use crate::{
    PoiCandidate,
    ports::{
        Cache, Geocoder, GeocodingError, PoiSearch, ReverseGeocoder, RouteSummary, Router,
        RoutingError, SearchError, SearchQuery, Services,
    },
    retry::Pause,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// `count` evenly spaced points from `from` to `to`, inclusive.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waybill_core::test_support::straight_route;
///
/// let route = straight_route(Coord { x: 0.0, y: 0.0 }, Coord { x: 4.0, y: 2.0 }, 3);
/// assert_eq!(route[1], Coord { x: 2.0, y: 1.0 });
/// ```
#[must_use]
#[expect(clippy::float_arithmetic, reason = "linear interpolation")]
pub fn straight_route(from: Coord<f64>, to: Coord<f64>, count: u32) -> Vec<Coord<f64>> {
    let points = count.max(2);
    let steps = f64::from(points - 1);
    (0..points)
        .map(|i| {
            let t = f64::from(i) / steps;
            Coord {
                x: from.x + (to.x - from.x) * t,
                y: from.y + (to.y - from.y) * t,
            }
        })
        .collect()
}

/// Geocoder backed by an address table.
///
/// Unknown addresses yield [`GeocodingError::NoMatch`].
#[derive(Debug, Default)]
pub struct StubGeocoder {
    addresses: HashMap<String, Coord<f64>>,
    calls: Mutex<usize>,
    failures: Mutex<usize>,
}

impl StubGeocoder {
    /// Register an address.
    pub fn insert(&mut self, address: impl Into<String>, location: Coord<f64>) {
        self.addresses.insert(address.into(), location);
    }

    /// Fail the next `count` calls with a network error.
    pub fn fail_next(&self, count: usize) {
        *lock(&self.failures) = count;
    }

    /// Number of calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        *lock(&self.calls)
    }
}

impl Geocoder for StubGeocoder {
    fn geocode(&self, address: &str) -> Result<Coord<f64>, GeocodingError> {
        *lock(&self.calls) += 1;
        {
            let mut failures = lock(&self.failures);
            if *failures > 0 {
                *failures -= 1;
                return Err(GeocodingError::NetworkError {
                    url: "stub://geocode".to_owned(),
                    message: "connection reset".to_owned(),
                });
            }
        }
        self.addresses
            .get(address)
            .copied()
            .ok_or_else(|| GeocodingError::NoMatch {
                address: address.to_owned(),
            })
    }
}

/// Reverse geocoder that names every location, or none.
#[derive(Debug)]
pub struct StubReverseGeocoder {
    name: Option<String>,
    calls: Mutex<usize>,
    failures: Mutex<usize>,
}

impl Default for StubReverseGeocoder {
    fn default() -> Self {
        Self {
            name: Some("Somewhere, United States".to_owned()),
            calls: Mutex::new(0),
            failures: Mutex::new(0),
        }
    }
}

impl StubReverseGeocoder {
    /// A reverse geocoder that knows nothing anywhere.
    #[must_use]
    pub fn unnamed() -> Self {
        Self {
            name: None,
            ..Self::default()
        }
    }

    /// Fail the next `count` calls with a timeout.
    pub fn fail_next(&self, count: usize) {
        *lock(&self.failures) = count;
    }

    /// Number of calls made so far.
    #[must_use]
    pub fn calls(&self) -> usize {
        *lock(&self.calls)
    }
}

impl ReverseGeocoder for StubReverseGeocoder {
    fn reverse_geocode(&self, _location: Coord<f64>) -> Result<Option<String>, GeocodingError> {
        *lock(&self.calls) += 1;
        {
            let mut failures = lock(&self.failures);
            if *failures > 0 {
                *failures -= 1;
                return Err(GeocodingError::Timeout {
                    url: "stub://reverse".to_owned(),
                    timeout_secs: 10,
                });
            }
        }
        Ok(self.name.clone())
    }
}

/// Router returning a fixed outcome and recording waypoints.
#[derive(Debug)]
pub struct StubRouter {
    outcome: Result<RouteSummary, RoutingError>,
    calls: Mutex<Vec<Vec<Coord<f64>>>>,
}

impl Default for StubRouter {
    fn default() -> Self {
        Self {
            outcome: Err(RoutingError::NoRoute {
                message: "no route configured".to_owned(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl StubRouter {
    /// Always answer with `outcome`.
    #[must_use]
    pub fn with_outcome(outcome: Result<RouteSummary, RoutingError>) -> Self {
        Self {
            outcome,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Waypoints of every call, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<Coord<f64>>> {
        lock(&self.calls).clone()
    }
}

impl Router for StubRouter {
    fn route(
        &self,
        waypoints: &[Coord<f64>],
        _optimize: bool,
    ) -> Result<RouteSummary, RoutingError> {
        lock(&self.calls).push(waypoints.to_vec());
        self.outcome.clone()
    }
}

/// Owned copy of a [`SearchQuery`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedQuery {
    /// Keyword searched for.
    pub keyword: String,
    /// Bounding box.
    pub viewbox: Rect<f64>,
    /// Country allow-list.
    pub countries: Vec<String>,
    /// Result limit.
    pub limit: usize,
}

#[derive(Debug, Clone)]
struct Listing {
    keyword: String,
    candidate: PoiCandidate,
    bounded: bool,
}

/// Keyword search over a fixed set of listings.
///
/// Scripted responses, when queued, are returned first in FIFO order.
#[derive(Debug, Default)]
pub struct StubPoiSearch {
    listings: Vec<Listing>,
    scripted: Mutex<VecDeque<Result<Vec<PoiCandidate>, SearchError>>>,
    queries: Mutex<Vec<RecordedQuery>>,
}

impl StubPoiSearch {
    /// List `candidate` for `keyword` regardless of the query's bounding box.
    pub fn insert(&mut self, keyword: impl Into<String>, candidate: PoiCandidate) {
        self.listings.push(Listing {
            keyword: keyword.into(),
            candidate,
            bounded: false,
        });
    }

    /// List `candidate` for `keyword` only when it lies inside the query's
    /// bounding box.
    pub fn insert_bounded(&mut self, keyword: impl Into<String>, candidate: PoiCandidate) {
        self.listings.push(Listing {
            keyword: keyword.into(),
            candidate,
            bounded: true,
        });
    }

    /// Queue a response for the next call.
    pub fn push_response(&self, response: Result<Vec<PoiCandidate>, SearchError>) {
        lock(&self.scripted).push_back(response);
    }

    /// Every query received, in order.
    #[must_use]
    pub fn queries(&self) -> Vec<RecordedQuery> {
        lock(&self.queries).clone()
    }
}

impl PoiSearch for StubPoiSearch {
    fn search(&self, query: &SearchQuery<'_>) -> Result<Vec<PoiCandidate>, SearchError> {
        lock(&self.queries).push(RecordedQuery {
            keyword: query.keyword.to_owned(),
            viewbox: query.viewbox,
            countries: query.countries.to_vec(),
            limit: query.limit,
        });
        if let Some(response) = lock(&self.scripted).pop_front() {
            return response;
        }
        Ok(self
            .listings
            .iter()
            .filter(|listing| listing.keyword == query.keyword)
            .filter(|listing| !listing.bounded || query.viewbox.intersects(&listing.candidate.location))
            .map(|listing| listing.candidate.clone())
            .take(query.limit)
            .collect())
    }
}

/// Cache that never expires entries but remembers the TTL each was given.
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: Mutex<HashMap<String, (String, Duration)>>,
}

impl InMemoryCache {
    /// TTL recorded for `key`.
    #[must_use]
    pub fn ttl_of(&self, key: &str) -> Option<Duration> {
        lock(&self.entries).get(key).map(|(_, ttl)| *ttl)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    /// Whether nothing has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }
}

impl Cache for InMemoryCache {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.entries).get(key).map(|(value, _)| value.clone())
    }

    fn set(&self, key: &str, value: String, ttl: Duration) {
        lock(&self.entries).insert(key.to_owned(), (value, ttl));
    }
}

/// [`Pause`] that records requested durations instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingPause {
    recorded: Mutex<Vec<Duration>>,
}

impl RecordingPause {
    /// Durations requested so far.
    #[must_use]
    pub fn recorded(&self) -> Vec<Duration> {
        lock(&self.recorded).clone()
    }
}

impl Pause for RecordingPause {
    fn pause(&self, duration: Duration) {
        lock(&self.recorded).push(duration);
    }
}

/// One of each stub, wired together.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waybill_core::test_support::StubServices;
///
/// let stubs = StubServices::default().with_address("Chicago, IL", Coord { x: -87.6, y: 41.9 });
/// let services = stubs.services();
/// assert!(services.geocoder.geocode("Chicago, IL").is_ok());
/// assert_eq!(stubs.geocoder.calls(), 1);
/// ```
#[derive(Debug, Default)]
pub struct StubServices {
    /// Forward geocoder.
    pub geocoder: StubGeocoder,
    /// Reverse geocoder.
    pub reverse_geocoder: StubReverseGeocoder,
    /// Router.
    pub router: StubRouter,
    /// POI search.
    pub search: StubPoiSearch,
    /// Cache.
    pub cache: InMemoryCache,
    /// Pause recorder.
    pub pause: RecordingPause,
}

impl StubServices {
    /// Register a geocodable address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>, location: Coord<f64>) -> Self {
        self.geocoder.insert(address, location);
        self
    }

    /// List a point of interest for `keyword` at every radius.
    #[must_use]
    pub fn with_poi(mut self, keyword: impl Into<String>, candidate: PoiCandidate) -> Self {
        self.search.insert(keyword, candidate);
        self
    }

    /// List a point of interest for `keyword` only within the search box.
    #[must_use]
    pub fn with_poi_within(mut self, keyword: impl Into<String>, candidate: PoiCandidate) -> Self {
        self.search.insert_bounded(keyword, candidate);
        self
    }

    /// Make every reverse geocode come back empty.
    #[must_use]
    pub fn unnamed_everywhere(mut self) -> Self {
        self.reverse_geocoder = StubReverseGeocoder::unnamed();
        self
    }

    /// Answer every route request with `summary`.
    #[must_use]
    pub fn with_route(mut self, summary: RouteSummary) -> Self {
        self.router = StubRouter::with_outcome(Ok(summary));
        self
    }

    /// Fail every route request with `error`.
    #[must_use]
    pub fn with_route_error(mut self, error: RoutingError) -> Self {
        self.router = StubRouter::with_outcome(Err(error));
        self
    }

    /// Borrow the stubs as a [`Services`] bundle.
    #[must_use]
    pub fn services(&self) -> Services<'_> {
        Services {
            geocoder: &self.geocoder,
            reverse_geocoder: &self.reverse_geocoder,
            router: &self.router,
            search: &self.search,
            cache: &self.cache,
            pause: &self.pause,
        }
    }
}
