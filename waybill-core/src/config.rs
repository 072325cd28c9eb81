//! Tunables for stop planning and the trip pipeline.

use std::time::Duration;

use crate::retry::{Backoff, RetryPolicy};

/// How POI searches are paced and retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchPolicy {
    /// Attempt budget per keyword and the delay after ordinary failures.
    pub retry: RetryPolicy,
    /// Delay after an HTTP 429, replacing `retry.backoff` for that attempt.
    pub rate_limited: Backoff,
    /// Pause before every attempt, keeping under provider rate limits.
    pub throttle: Duration,
}

impl Default for SearchPolicy {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::new(3, Backoff::Fixed(Duration::from_secs(3))),
            rate_limited: Backoff::Linear {
                step: Duration::from_secs(5),
            },
            throttle: Duration::from_millis(1500),
        }
    }
}

/// Planner and pipeline configuration.
///
/// # Examples
/// ```
/// use waybill_core::PlannerConfig;
///
/// let config = PlannerConfig::default().with_countries(["us"]);
/// assert_eq!(config.countries, vec!["us".to_owned()]);
/// assert_eq!(config.radius_ladder_km, vec![10.0, 20.0, 40.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    /// Search radii tried in order when resolving a stop.
    pub radius_ladder_km: Vec<f64>,
    /// Keywords for fuel stops, most specific last.
    pub fuel_keywords: Vec<String>,
    /// Keywords for rest stops.
    pub rest_keywords: Vec<String>,
    /// ISO 3166-1 alpha-2 codes POI searches are restricted to.
    pub countries: Vec<String>,
    /// Lifetime of cached lookups.
    pub cache_ttl: Duration,
    /// POI search pacing.
    pub search: SearchPolicy,
    /// Retries for direct geocodes.
    pub geocode_retry: RetryPolicy,
    /// Retries for the whole geocode, route and plan sequence.
    pub pipeline_retry: RetryPolicy,
    /// Distance assumed when nothing can be geocoded.
    pub fallback_distance_miles: f64,
}

impl PlannerConfig {
    /// Replace the country allow-list.
    #[must_use]
    pub fn with_countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.countries = countries.into_iter().map(Into::into).collect();
        self
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|&v| v.to_owned()).collect()
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            radius_ladder_km: vec![10.0, 20.0, 40.0],
            fuel_keywords: strings(&["fuel", "gas station", "truck stop", "petrol station"]),
            rest_keywords: strings(&[
                "rest area",
                "truck rest area",
                "highway rest stop",
                "rest station",
            ]),
            countries: strings(&["us", "ca"]),
            cache_ttl: Duration::from_secs(86_400),
            search: SearchPolicy::default(),
            geocode_retry: RetryPolicy::new(
                3,
                Backoff::Exponential {
                    base: Duration::from_secs(1),
                },
            ),
            pipeline_retry: RetryPolicy::new(
                3,
                Backoff::Exponential {
                    base: Duration::from_secs(2),
                },
            ),
            fallback_distance_miles: 500.0,
        }
    }
}
