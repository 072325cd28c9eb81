//! Cache key construction and JSON encoding over the [`Cache`] port.

use std::time::Duration;

use geo::Coord;
use log::debug;
use serde::{Serialize, de::DeserializeOwned};

use crate::ports::Cache;

/// Key for a forward geocode of `address`.
pub(crate) fn geocode_key(address: &str) -> String {
    let slug: String = address
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    format!("geocode_{}", slug.to_lowercase())
}

/// Key for a reverse geocode at `location`.
pub(crate) fn reverse_key(location: Coord<f64>) -> String {
    format!("rev_{}_{}", location.y, location.x)
}

/// Key for a keyword search around `location`.
pub(crate) fn poi_key(keyword: &str, location: Coord<f64>, radius_km: f64) -> String {
    format!(
        "poi_{}_{}_{}_{}",
        keyword.replace(' ', "_"),
        location.y,
        location.x,
        radius_km
    )
}

/// Read and decode a cached value. Undecodable entries count as misses.
pub(crate) fn load<T: DeserializeOwned>(cache: &dyn Cache, key: &str) -> Option<T> {
    let raw = cache.get(key)?;
    serde_json::from_str(&raw)
        .inspect_err(|err| debug!("ignoring undecodable cache entry {key}: {err}"))
        .ok()
}

/// Encode and store a value.
pub(crate) fn store<T: Serialize>(cache: &dyn Cache, key: &str, value: &T, ttl: Duration) {
    let Ok(raw) = serde_json::to_string(value)
        .inspect_err(|err| debug!("not caching {key}: {err}"))
    else {
        return;
    };
    cache.set(key, raw, ttl);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::InMemoryCache;
    use rstest::rstest;

    #[rstest]
    #[case("Chicago, IL", "geocode_chicago__il")]
    #[case("123 Main St.", "geocode_123_main_st_")]
    fn geocode_keys_are_slugged(#[case] address: &str, #[case] expected: &str) {
        assert_eq!(geocode_key(address), expected);
    }

    #[rstest]
    fn location_keys_use_latitude_first() {
        let at = Coord { x: -90.5, y: 38.25 };
        assert_eq!(reverse_key(at), "rev_38.25_-90.5");
        assert_eq!(poi_key("truck stop", at, 10.0), "poi_truck_stop_38.25_-90.5_10");
    }

    #[rstest]
    fn corrupt_entries_read_as_misses() {
        let cache = InMemoryCache::default();
        cache.set("k", "{not json".to_owned(), Duration::from_secs(1));
        assert_eq!(load::<Vec<f64>>(&cache, "k"), None);
    }

    #[rstest]
    fn stored_values_load_back() {
        let cache = InMemoryCache::default();
        store(&cache, "k", &vec![1.5, 2.5], Duration::from_secs(60));
        assert_eq!(load::<Vec<f64>>(&cache, "k"), Some(vec![1.5, 2.5]));
        assert_eq!(cache.ttl_of("k"), Some(Duration::from_secs(60)));
    }
}
