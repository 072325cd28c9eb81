//! Cached, retried forward geocoding.

use geo::Coord;
use log::warn;

use crate::{
    cache,
    config::PlannerConfig,
    ports::{GeocodingError, Services},
};

/// Forward geocoding through the cache, with the configured retry policy.
#[derive(Debug, Clone, Copy)]
pub struct GeocodeLookup<'a> {
    services: Services<'a>,
    config: &'a PlannerConfig,
}

impl<'a> GeocodeLookup<'a> {
    /// Bind a lookup to a service set and configuration.
    #[must_use]
    pub fn new(services: &Services<'a>, config: &'a PlannerConfig) -> Self {
        Self {
            services: *services,
            config,
        }
    }

    /// Geocode once, consulting the cache first and filling it on success.
    pub fn geocode(&self, address: &str) -> Result<Coord<f64>, GeocodingError> {
        let key = cache::geocode_key(address);
        if let Some(hit) = cache::load(self.services.cache, &key) {
            return Ok(hit);
        }
        let location = self.services.geocoder.geocode(address)?;
        cache::store(self.services.cache, &key, &location, self.config.cache_ttl);
        Ok(location)
    }

    /// Geocode with retries, returning the last error once the budget is
    /// spent.
    pub fn geocode_with_retry(&self, address: &str) -> Result<Coord<f64>, GeocodingError> {
        let policy = self.config.geocode_retry;
        policy.run(
            self.services.pause,
            |_| self.geocode(address),
            |attempt, err| {
                warn!(
                    "geocode attempt {}/{} for {address:?} failed: {err}",
                    attempt + 1,
                    policy.max_attempts.max(1)
                );
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::test_support::StubServices;
    use rstest::{fixture, rstest};

    const CHICAGO: Coord<f64> = Coord { x: -87.63, y: 41.88 };

    #[fixture]
    fn config() -> PlannerConfig {
        PlannerConfig::default()
    }

    #[rstest]
    fn second_lookup_is_served_from_cache(config: PlannerConfig) {
        let stubs = StubServices::default().with_address("Chicago, IL", CHICAGO);
        let lookup = GeocodeLookup::new(&stubs.services(), &config);
        assert_eq!(lookup.geocode("Chicago, IL"), Ok(CHICAGO));
        assert_eq!(lookup.geocode("Chicago, IL"), Ok(CHICAGO));
        assert_eq!(stubs.geocoder.calls(), 1);
        assert_eq!(
            stubs.cache.ttl_of("geocode_chicago__il"),
            Some(Duration::from_secs(86_400))
        );
    }

    #[rstest]
    fn transient_failures_are_retried_with_exponential_backoff(config: PlannerConfig) {
        let stubs = StubServices::default().with_address("Chicago, IL", CHICAGO);
        stubs.geocoder.fail_next(2);
        let lookup = GeocodeLookup::new(&stubs.services(), &config);
        assert_eq!(lookup.geocode_with_retry("Chicago, IL"), Ok(CHICAGO));
        assert_eq!(stubs.geocoder.calls(), 3);
        assert_eq!(
            stubs.pause.recorded(),
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
    }

    #[rstest]
    fn unknown_address_fails_after_budget(config: PlannerConfig) {
        let stubs = StubServices::default();
        let lookup = GeocodeLookup::new(&stubs.services(), &config);
        let err = lookup
            .geocode_with_retry("Atlantis")
            .expect_err("unknown address should fail");
        assert!(matches!(err, GeocodingError::NoMatch { .. }));
        assert_eq!(stubs.geocoder.calls(), 3);
    }
}
