//! Facade crate for the Waybill trip planning engine.
//!
//! This crate re-exports the core domain types and, behind the default
//! `http` feature, the OpenRouteService and Nominatim adapters.

#![forbid(unsafe_code)]

pub use waybill_core::{
    Cache, CycleExceededError, DutyEvent, DutyLogSimulator, ErrorResponse, EventKind, Geocoder,
    LogDay, PlannerConfig, PoiSearch, ReverseGeocoder, RouteGeometry, Router, Services, Stop,
    StopKind, ThreadPause, Trip, TripPipeline, TripPlan, TripPlanError, TripRequest,
};

#[cfg(feature = "http")]
pub use waybill_data::{
    MemoryCache, ProviderBuildError,
    nominatim::{NominatimClient, NominatimConfig},
    ors::{OrsClient, OrsConfig},
};
