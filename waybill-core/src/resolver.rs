//! Point-of-interest resolution near a coordinate.
//!
//! Resolution walks a keyword list. Each keyword gets a bounded number of
//! attempts; an attempt first checks that the coordinate reverse-geocodes to
//! somewhere, then runs a bounded keyword search. Exhausting every keyword is
//! a normal outcome and yields `None`.

use std::time::Duration;

use geo::{Coord, Rect};
use log::{debug, warn};

use crate::{
    PointOfInterest, cache,
    config::PlannerConfig,
    ports::{GeocodingError, SearchError, SearchQuery, Services},
};

/// Degrees of latitude per kilometre, applied to both axes.
const DEGREES_PER_KM: f64 = 0.009;

/// Bounding box of half-width `0.009 × radius_km` degrees around `location`.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waybill_core::viewbox;
///
/// let bbox = viewbox(Coord { x: -100.0, y: 40.0 }, 10.0);
/// assert!((bbox.min().x - -100.09).abs() < 1e-9);
/// assert!((bbox.max().y - 40.09).abs() < 1e-9);
/// ```
#[must_use]
#[expect(clippy::float_arithmetic, reason = "bounding box offsets")]
pub fn viewbox(location: Coord<f64>, radius_km: f64) -> Rect<f64> {
    let delta = DEGREES_PER_KM * radius_km;
    Rect::new(
        Coord {
            x: location.x - delta,
            y: location.y - delta,
        },
        Coord {
            x: location.x + delta,
            y: location.y + delta,
        },
    )
}

#[derive(Debug)]
enum AttemptFailure {
    Unnamed,
    NoResults,
    Reverse(GeocodingError),
    Search(SearchError),
}

/// Finds fuel and rest locations through the search and reverse-geocoding
/// ports.
#[derive(Debug, Clone, Copy)]
pub struct PoiResolver<'a> {
    services: Services<'a>,
    config: &'a PlannerConfig,
}

impl<'a> PoiResolver<'a> {
    /// Bind a resolver to a service set and configuration.
    #[must_use]
    pub fn new(services: &Services<'a>, config: &'a PlannerConfig) -> Self {
        Self {
            services: *services,
            config,
        }
    }

    /// Try each keyword in order at a single radius.
    pub fn resolve(
        &self,
        location: Coord<f64>,
        keywords: &[String],
        radius_km: f64,
    ) -> Option<PointOfInterest> {
        keywords
            .iter()
            .find_map(|keyword| self.resolve_keyword(location, keyword, radius_km))
    }

    /// Try each radius of the configured ladder until one yields a hit.
    ///
    /// Returns the point of interest together with the radius it was found
    /// at.
    pub fn resolve_escalating(
        &self,
        location: Coord<f64>,
        keywords: &[String],
    ) -> Option<(PointOfInterest, f64)> {
        self.config.radius_ladder_km.iter().find_map(|&radius| {
            self.resolve(location, keywords, radius)
                .map(|poi| (poi, radius))
        })
    }

    fn resolve_keyword(
        &self,
        location: Coord<f64>,
        keyword: &str,
        radius_km: f64,
    ) -> Option<PointOfInterest> {
        let key = cache::poi_key(keyword, location, radius_km);
        if let Some(hit) = cache::load::<PointOfInterest>(self.services.cache, &key) {
            debug!("POI cache hit for {key}");
            return Some(hit);
        }

        let policy = &self.config.search;
        let attempts = policy.retry.max_attempts.max(1);
        for attempt in 0..attempts {
            self.services.pause.pause(policy.throttle);
            match self.attempt(location, keyword, radius_km) {
                Ok(poi) => {
                    cache::store(self.services.cache, &key, &poi, self.config.cache_ttl);
                    return Some(poi);
                }
                Err(failure) => {
                    let delay = self.log_failure(keyword, attempt, attempts, &failure);
                    if attempt + 1 < attempts && !delay.is_zero() {
                        self.services.pause.pause(delay);
                    }
                }
            }
        }
        None
    }

    fn attempt(
        &self,
        location: Coord<f64>,
        keyword: &str,
        radius_km: f64,
    ) -> Result<PointOfInterest, AttemptFailure> {
        if self.reverse(location)?.is_none() {
            return Err(AttemptFailure::Unnamed);
        }
        let query = SearchQuery {
            keyword,
            viewbox: viewbox(location, radius_km),
            countries: &self.config.countries,
            limit: 1,
        };
        let candidates = self
            .services
            .search
            .search(&query)
            .map_err(AttemptFailure::Search)?;
        candidates
            .into_iter()
            .next()
            .map(|candidate| PointOfInterest::from_candidate(candidate, location))
            .ok_or(AttemptFailure::NoResults)
    }

    fn reverse(&self, location: Coord<f64>) -> Result<Option<String>, AttemptFailure> {
        let key = cache::reverse_key(location);
        if let Some(hit) = cache::load::<String>(self.services.cache, &key) {
            return Ok(Some(hit));
        }
        let named = self
            .services
            .reverse_geocoder
            .reverse_geocode(location)
            .map_err(AttemptFailure::Reverse)?;
        if let Some(name) = &named {
            cache::store(self.services.cache, &key, name, self.config.cache_ttl);
        }
        Ok(named)
    }

    /// Log a failed attempt and return the delay owed before the next one.
    fn log_failure(
        &self,
        keyword: &str,
        attempt: u32,
        attempts: u32,
        failure: &AttemptFailure,
    ) -> Duration {
        let policy = &self.config.search;
        let n = attempt + 1;
        match failure {
            AttemptFailure::Unnamed => {
                debug!("keyword {keyword:?} attempt {n}/{attempts}: location has no name");
                Duration::ZERO
            }
            AttemptFailure::NoResults => {
                debug!("keyword {keyword:?} attempt {n}/{attempts}: no results");
                Duration::ZERO
            }
            AttemptFailure::Search(SearchError::RateLimited) => {
                warn!("keyword {keyword:?} attempt {n}/{attempts}: rate limited");
                policy.rate_limited.delay(attempt)
            }
            AttemptFailure::Search(err) => {
                warn!("keyword {keyword:?} attempt {n}/{attempts} failed: {err}");
                policy.retry.backoff.delay(attempt)
            }
            AttemptFailure::Reverse(err) => {
                warn!("keyword {keyword:?} attempt {n}/{attempts} reverse geocode failed: {err}");
                policy.retry.backoff.delay(attempt)
            }
        }
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    clippy::shadow_reuse,
    reason = "tests compare box widths and rebind fixtures"
)]
mod tests {
    use super::*;
    use crate::{PoiCandidate, test_support::StubServices};
    use rstest::{fixture, rstest};

    const HERE: Coord<f64> = Coord { x: -99.3, y: 38.9 };

    #[fixture]
    fn config() -> PlannerConfig {
        PlannerConfig::default()
    }

    fn keywords(values: &[&str]) -> Vec<String> {
        values.iter().map(|&v| v.to_owned()).collect()
    }

    #[rstest]
    fn first_matching_keyword_wins(config: PlannerConfig) {
        let stubs = StubServices::default().with_poi(
            "truck stop",
            PoiCandidate::new("Love's, I-70, Hays", Coord { x: -99.31, y: 38.91 }),
        );
        let resolver = PoiResolver::new(&stubs.services(), &config);
        let poi = resolver
            .resolve(HERE, &keywords(&["fuel", "truck stop"]), 10.0)
            .expect("truck stop should resolve");
        assert_eq!(poi.name, "Love's");
        let searched: Vec<String> = stubs.search.queries().into_iter().map(|q| q.keyword).collect();
        assert_eq!(searched, vec!["fuel", "fuel", "fuel", "truck stop"]);
    }

    #[rstest]
    fn searches_are_bounded_to_configured_countries(config: PlannerConfig) {
        let config = config.with_countries(["ca"]);
        let stubs = StubServices::default();
        let resolver = PoiResolver::new(&stubs.services(), &config);
        assert_eq!(resolver.resolve(HERE, &keywords(&["fuel"]), 20.0), None);
        let query = stubs.search.queries().remove(0);
        assert_eq!(query.countries, vec!["ca".to_owned()]);
        assert_eq!(query.limit, 1);
        assert!((query.viewbox.width() - 0.36).abs() < 1e-9);
    }

    #[rstest]
    fn rate_limiting_backs_off_linearly(config: PlannerConfig) {
        let stubs = StubServices::default();
        stubs.search.push_response(Err(SearchError::RateLimited));
        stubs.search.push_response(Err(SearchError::RateLimited));
        let resolver = PoiResolver::new(&stubs.services(), &config);
        assert_eq!(resolver.resolve(HERE, &keywords(&["fuel"]), 10.0), None);
        let throttle = Duration::from_millis(1500);
        assert_eq!(
            stubs.pause.recorded(),
            vec![
                throttle,
                Duration::from_secs(5),
                throttle,
                Duration::from_secs(10),
                throttle,
            ]
        );
    }

    #[rstest]
    fn transient_errors_back_off_fixed_delay(config: PlannerConfig) {
        let stubs = StubServices::default().with_poi(
            "fuel",
            PoiCandidate::new("Pilot", Coord { x: -99.29, y: 38.9 }),
        );
        stubs.search.push_response(Err(SearchError::ParseError {
            message: "bad json".to_owned(),
        }));
        let resolver = PoiResolver::new(&stubs.services(), &config);
        assert!(resolver.resolve(HERE, &keywords(&["fuel"]), 10.0).is_some());
        assert_eq!(
            stubs.pause.recorded(),
            vec![
                Duration::from_millis(1500),
                Duration::from_secs(3),
                Duration::from_millis(1500),
            ]
        );
    }

    #[rstest]
    fn reverse_geocode_failures_back_off_fixed_delay(config: PlannerConfig) {
        let stubs = StubServices::default().with_poi(
            "fuel",
            PoiCandidate::new("Pilot", Coord { x: -99.29, y: 38.9 }),
        );
        stubs.reverse_geocoder.fail_next(1);
        let resolver = PoiResolver::new(&stubs.services(), &config);
        let poi = resolver
            .resolve(HERE, &keywords(&["fuel"]), 10.0)
            .expect("second attempt should resolve");
        assert_eq!(poi.name, "Pilot");
        assert_eq!(
            stubs.pause.recorded(),
            vec![
                Duration::from_millis(1500),
                Duration::from_secs(3),
                Duration::from_millis(1500),
            ]
        );
        assert_eq!(stubs.reverse_geocoder.calls(), 2);
        assert_eq!(stubs.search.queries().len(), 1);
    }

    #[rstest]
    fn reverse_geocode_failures_consume_attempts(config: PlannerConfig) {
        let stubs = StubServices::default().with_poi(
            "fuel",
            PoiCandidate::new("Pilot", Coord { x: -99.29, y: 38.9 }),
        );
        stubs.reverse_geocoder.fail_next(3);
        let resolver = PoiResolver::new(&stubs.services(), &config);
        assert_eq!(resolver.resolve(HERE, &keywords(&["fuel"]), 10.0), None);
        assert!(stubs.search.queries().is_empty());
        let backoffs = stubs
            .pause
            .recorded()
            .into_iter()
            .filter(|delay| *delay == Duration::from_secs(3))
            .count();
        assert_eq!(backoffs, 2);
    }

    #[rstest]
    fn unnamed_locations_never_search(config: PlannerConfig) {
        let stubs = StubServices::default().unnamed_everywhere();
        let resolver = PoiResolver::new(&stubs.services(), &config);
        assert_eq!(resolver.resolve(HERE, &keywords(&["fuel", "gas station"]), 10.0), None);
        assert!(stubs.search.queries().is_empty());
        assert_eq!(stubs.reverse_geocoder.calls(), 6);
    }

    #[rstest]
    fn hits_are_cached_per_keyword_and_radius(config: PlannerConfig) {
        let stubs = StubServices::default().with_poi(
            "fuel",
            PoiCandidate::new("Pilot, Exit 9", Coord { x: -99.29, y: 38.9 }),
        );
        let resolver = PoiResolver::new(&stubs.services(), &config);
        let first = resolver.resolve(HERE, &keywords(&["fuel"]), 10.0);
        let second = resolver.resolve(HERE, &keywords(&["fuel"]), 10.0);
        assert_eq!(first, second);
        assert_eq!(stubs.search.queries().len(), 1);
        assert_eq!(stubs.reverse_geocoder.calls(), 1);
    }

    #[rstest]
    fn escalation_reports_the_radius_that_hit(config: PlannerConfig) {
        let stubs = StubServices::default().with_poi_within(
            "rest area",
            PoiCandidate::new("I-70 Rest Area", Coord { x: -99.5, y: 38.9 }),
        );
        let resolver = PoiResolver::new(&stubs.services(), &config);
        let (poi, radius) = resolver
            .resolve_escalating(HERE, &keywords(&["rest area"]))
            .expect("found at a wider radius");
        assert_eq!(poi.name, "I-70 Rest Area");
        assert!((radius - 40.0).abs() < f64::EPSILON);
    }

    #[rstest]
    fn exhausted_ladder_is_none(config: PlannerConfig) {
        let stubs = StubServices::default();
        let resolver = PoiResolver::new(&stubs.services(), &config);
        assert_eq!(resolver.resolve_escalating(HERE, &keywords(&["fuel"])), None);
        assert_eq!(stubs.search.queries().len(), 9);
    }
}
