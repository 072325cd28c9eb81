//! OpenRouteService adapter.
//!
//! [`OrsClient`] implements [`waybill_core::Geocoder`] with the Pelias
//! search endpoint and [`waybill_core::Router`] with the GeoJSON directions
//! endpoint for the `driving-car` profile.
//!
//! # Example
//!
//! ```no_run
//! use geo::Coord;
//! use waybill_core::Router;
//! use waybill_data::ors::{OrsClient, OrsConfig};
//!
//! let client = OrsClient::with_config(OrsConfig::new("my-api-key"))?;
//! let summary = client.route(
//!     &[Coord { x: -87.63, y: 41.88 }, Coord { x: -96.8, y: 32.78 }],
//!     false,
//! )?;
//! assert!(summary.distance_miles > 0.0);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod provider;
mod schema;

pub use provider::{DEFAULT_ORS_BASE_URL, OrsClient, OrsConfig};
