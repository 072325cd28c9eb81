//! Behavioural tests for the HTTP adapters against a canned local server.

#![expect(
    clippy::float_arithmetic,
    reason = "distance assertions use a tolerance"
)]

mod support;

use std::{cell::RefCell, time::Duration};

use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use support::{CannedServer, closed_url};
use waybill_core::{
    Geocoder, GeocodingError, PoiCandidate, PoiSearch, ReverseGeocoder, RouteSummary, Router,
    RoutingError, SearchError, SearchQuery, viewbox,
};
use waybill_data::{
    nominatim::{NominatimClient, NominatimConfig},
    ors::{OrsClient, OrsConfig},
};

#[derive(Default)]
struct AdapterWorld {
    server: RefCell<Option<CannedServer>>,
    base_url: RefCell<String>,
    geocoded: RefCell<Option<Result<Coord<f64>, GeocodingError>>>,
    reversed: RefCell<Option<Result<Option<String>, GeocodingError>>>,
    routed: RefCell<Option<Result<RouteSummary, RoutingError>>>,
    searched: RefCell<Option<Result<Vec<PoiCandidate>, SearchError>>>,
}

impl AdapterWorld {
    fn serve(&self, status: &str, body: &str) {
        let server = CannedServer::start(status, body);
        self.base_url.replace(server.url());
        self.server.replace(Some(server));
    }

    fn ors(&self) -> OrsClient {
        let config = OrsConfig::new("test-key")
            .with_base_url(self.base_url.borrow().clone())
            .with_timeout(Duration::from_secs(5));
        OrsClient::with_config(config).expect("ors client")
    }

    fn nominatim(&self) -> NominatimClient {
        let config = NominatimConfig::new(self.base_url.borrow().clone())
            .with_timeout(Duration::from_secs(5))
            .with_user_agent("waybill-tests/0.1");
        NominatimClient::with_config(config).expect("nominatim client")
    }

    fn request_line(&self) -> String {
        self.server
            .borrow_mut()
            .as_mut()
            .and_then(CannedServer::request_line)
            .expect("a request should have been served")
    }
}

#[fixture]
fn world() -> AdapterWorld {
    AdapterWorld::default()
}

#[given("a geocoding service answering with Chicago")]
fn given_geocoder(world: &AdapterWorld) {
    world.serve(
        "200 OK",
        r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"Point","coordinates":[-87.63,41.88]},"properties":{"label":"Chicago, IL, USA"}}]}"#,
    );
}

#[given("a directions service answering with a 160934 metre route")]
fn given_directions(world: &AdapterWorld) {
    world.serve(
        "200 OK",
        r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{"summary":{"distance":160934.0,"duration":7200.0}},"geometry":{"type":"LineString","coordinates":[[-87.63,41.88],[-88.0,41.0],[-88.4,40.5]]}}]}"#,
    );
}

#[given("a search service answering 429")]
fn given_rate_limited(world: &AdapterWorld) {
    world.serve("429 Too Many Requests", r#"{"error":"Too many requests"}"#);
}

#[given("a reverse geocoding service that cannot geocode")]
fn given_reverse_miss(world: &AdapterWorld) {
    world.serve("200 OK", r#"{"error":"Unable to geocode"}"#);
}

#[given("no search service is listening")]
fn given_closed(world: &AdapterWorld) {
    world.base_url.replace(closed_url());
}

#[when("the address {address} is geocoded")]
fn when_geocoded(world: &AdapterWorld, address: String) {
    let result = world.ors().geocode(address.trim_matches('"'));
    world.geocoded.replace(Some(result));
}

#[when("a route is requested between two points")]
fn when_routed(world: &AdapterWorld) {
    let waypoints = [Coord { x: -87.63, y: 41.88 }, Coord { x: -88.4, y: 40.5 }];
    let result = world.ors().route(&waypoints, false);
    world.routed.replace(Some(result));
}

#[when("a truck stop search is run")]
fn when_searched(world: &AdapterWorld) {
    let countries = vec!["us".to_owned(), "ca".to_owned()];
    let query = SearchQuery {
        keyword: "truck stop",
        viewbox: viewbox(Coord { x: -88.0, y: 41.0 }, 10.0),
        countries: &countries,
        limit: 1,
    };
    let result = world.nominatim().search(&query);
    world.searched.replace(Some(result));
}

#[when("a point in the ocean is reverse geocoded")]
fn when_reversed(world: &AdapterWorld) {
    let result = world.nominatim().reverse_geocode(Coord { x: -40.0, y: 30.0 });
    world.reversed.replace(Some(result));
}

#[then("the coordinate is longitude {lon} and latitude {lat}")]
fn then_coordinate(world: &AdapterWorld, lon: f64, lat: f64) {
    let coord = world
        .geocoded
        .borrow()
        .clone()
        .expect("geocode should have run")
        .expect("geocode should succeed");
    assert_eq!(coord, Coord { x: lon, y: lat });
}

#[then("the request was a GET to {path}")]
fn then_get(world: &AdapterWorld, path: String) {
    let line = world.request_line();
    assert!(
        line.starts_with(&format!("GET {}", path.trim_matches('"'))),
        "unexpected request line {line}"
    );
}

#[then("the request was a POST to {path}")]
fn then_post(world: &AdapterWorld, path: String) {
    let line = world.request_line();
    assert!(
        line.starts_with(&format!("POST {} ", path.trim_matches('"'))),
        "unexpected request line {line}"
    );
}

#[then("the route is {miles} miles long with {points} points")]
fn then_route(world: &AdapterWorld, miles: f64, points: usize) {
    let summary = world
        .routed
        .borrow()
        .clone()
        .expect("route should have run")
        .expect("route should succeed");
    assert!((summary.distance_miles - miles).abs() < 1e-9);
    assert_eq!(summary.geometry.len(), points);
}

#[then("the search reports rate limiting")]
fn then_rate_limited(world: &AdapterWorld) {
    let result = world.searched.borrow().clone().expect("search should have run");
    assert_eq!(result, Err(SearchError::RateLimited));
}

#[then("the search reports a network error")]
fn then_network_error(world: &AdapterWorld) {
    let result = world.searched.borrow().clone().expect("search should have run");
    assert!(matches!(result, Err(SearchError::NetworkError { .. })), "{result:?}");
}

#[then("no place name is returned")]
fn then_no_place(world: &AdapterWorld) {
    let result = world.reversed.borrow().clone().expect("reverse should have run");
    assert_eq!(result, Ok(None));
}

#[scenario(path = "tests/features/http_adapters.feature", index = 0)]
fn forward_geocoding(world: AdapterWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/http_adapters.feature", index = 1)]
fn directions_in_miles(world: AdapterWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/http_adapters.feature", index = 2)]
fn rate_limited_search(world: AdapterWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/http_adapters.feature", index = 3)]
fn reverse_geocode_miss(world: AdapterWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/http_adapters.feature", index = 4)]
fn unreachable_service(world: AdapterWorld) {
    let _ = world;
}
