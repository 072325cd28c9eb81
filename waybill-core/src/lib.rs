//! Core domain types and algorithms for the Waybill trip planner.
//!
//! Responsibilities:
//! - Model trips, stops, points of interest and duty logs.
//! - Place fuel and rest stops along a route ([`StopPlanner`]).
//! - Replay the stops against hours-of-service limits
//!   ([`DutyLogSimulator`]).
//! - Orchestrate geocoding, routing, planning and simulation with retries and
//!   graceful degradation ([`TripPipeline`]).
//!
//! Boundaries:
//! - External services are reached only through the traits in [`ports`];
//!   concrete HTTP adapters live in `waybill-data`.
//! - No global mutable state. Every collaborator is injected by reference.

#![forbid(unsafe_code)]

mod cache;
mod config;
pub mod duty_log;
pub mod geometry;
pub mod hos;
mod lookup;
pub mod pipeline;
pub mod planner;
mod poi;
pub mod ports;
mod resolver;
mod retry;
mod stop;
mod trip;

pub mod test_support;

pub use config::{PlannerConfig, SearchPolicy};
pub use duty_log::{
    CycleExceededError, DutyEvent, DutyLogSimulator, EventKind, EventMetadata, LogDay,
    SegmentMetadata,
};
pub use geometry::{GeometryError, RouteGeometry, great_circle_km, great_circle_miles};
pub use lookup::GeocodeLookup;
pub use pipeline::{
    ErrorResponse, FALLBACK_DATA_WARNING, PLANNER_FALLBACK_WARNING, ResponseStatus, TripPipeline,
    TripPlan, TripPlanError,
};
pub use planner::{PlanningError, StopPlan, StopPlanner, minimal_itinerary};
pub use poi::{PoiCandidate, PointOfInterest};
pub use ports::{
    Cache, Geocoder, GeocodingError, PoiSearch, ReverseGeocoder, RouteSummary, Router,
    RoutingError, SearchError, SearchQuery, Services,
};
pub use resolver::{PoiResolver, viewbox};
pub use retry::{Backoff, Pause, RetryPolicy, ThreadPause};
pub use stop::{Stop, StopKind, StopMetadata};
pub use trip::{Trip, TripRequest, TripValidationError};
