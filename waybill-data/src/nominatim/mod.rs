//! Nominatim adapter.
//!
//! [`NominatimClient`] implements [`waybill_core::ReverseGeocoder`] with the
//! `/reverse` endpoint and [`waybill_core::PoiSearch`] with a bounded
//! `/search`. The public instance allows one request per second and answers
//! HTTP 429 when that is exceeded; callers are expected to throttle.

mod provider;
mod schema;

pub use provider::{DEFAULT_NOMINATIM_BASE_URL, NominatimClient, NominatimConfig};
