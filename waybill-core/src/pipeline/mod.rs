//! End-to-end trip planning: geocode, route, place stops, simulate duty.
//!
//! Geocoding and routing failures are retried as a unit. When every attempt
//! fails the pipeline still answers, with a two-stop itinerary and an
//! estimated distance, and says so in [`TripPlan::warnings`]. Only invalid
//! input and an exhausted duty cycle are reported as errors.

mod response;

use geo::Coord;
use log::{info, warn};
use thiserror::Error;

use crate::{
    CycleExceededError, DutyLogSimulator, RouteGeometry, Trip, TripRequest, TripValidationError,
    config::PlannerConfig,
    geometry::{great_circle_miles, round2},
    lookup::GeocodeLookup,
    planner::{StopPlan, StopPlanner, minimal_itinerary},
    ports::{GeocodingError, RoutingError, Services},
};

pub use response::{ErrorResponse, ResponseStatus, TripPlan};

/// Warning attached when geocoding or routing never succeeded.
pub const FALLBACK_DATA_WARNING: &str = "Used fallback data";
/// Warning attached when stop planning degraded to pickup and dropoff.
pub const PLANNER_FALLBACK_WARNING: &str = "Stop planning fell back to pickup and dropoff only";

/// Errors surfaced by [`TripPipeline::plan_trip`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TripPlanError {
    /// The request was rejected before planning.
    #[error("invalid trip request")]
    Validation(#[from] TripValidationError),
    /// The driver has no cycle hours left.
    #[error("duty log simulation failed")]
    CycleExceeded(#[from] CycleExceededError),
}

impl TripPlanError {
    /// Render the error as a response body.
    ///
    /// # Examples
    /// ```
    /// use waybill_core::{CycleExceededError, ResponseStatus, TripPlanError};
    ///
    /// let err = TripPlanError::from(CycleExceededError { cycle_used: 70.0 });
    /// let body = err.to_response();
    /// assert_eq!(body.status, ResponseStatus::Error);
    /// assert_eq!(body.message, "Failed to create trip. Please try again.");
    /// ```
    #[must_use]
    pub fn to_response(&self) -> ErrorResponse {
        let (message, detail) = match self {
            Self::Validation(source) => ("Invalid data provided", source.to_string()),
            Self::CycleExceeded(source) => {
                ("Failed to create trip. Please try again.", source.to_string())
            }
        };
        ErrorResponse::new(message, detail)
    }
}

#[derive(Debug, Error)]
enum AttemptError {
    #[error("failed to geocode {address:?}")]
    Geocoding {
        address: String,
        #[source]
        source: GeocodingError,
    },
    #[error("routing failed")]
    Routing(#[source] RoutingError),
}

struct Routed {
    total_miles: f64,
    geometry: Option<RouteGeometry>,
    plan: StopPlan,
}

/// Runs the full planning sequence for one request at a time.
///
/// Cheap to construct; holds only borrowed services and configuration.
#[derive(Debug, Clone, Copy)]
pub struct TripPipeline<'a> {
    services: Services<'a>,
    config: &'a PlannerConfig,
    simulator: DutyLogSimulator,
}

impl<'a> TripPipeline<'a> {
    /// Assemble a pipeline.
    #[must_use]
    pub fn new(
        services: Services<'a>,
        config: &'a PlannerConfig,
        simulator: DutyLogSimulator,
    ) -> Self {
        Self {
            services,
            config,
            simulator,
        }
    }

    /// Plan a trip.
    ///
    /// # Errors
    /// [`TripPlanError::Validation`] for malformed requests and
    /// [`TripPlanError::CycleExceeded`] when no cycle hours remain. Lookup
    /// failures never surface here; they degrade the plan instead.
    pub fn plan_trip(&self, request: &TripRequest) -> Result<TripPlan, TripPlanError> {
        let trip = Trip::try_from(request)?;
        let lookup = GeocodeLookup::new(&self.services, self.config);
        let planner = StopPlanner::new(&self.services, self.config);

        let policy = self.config.pipeline_retry;
        let routed = policy.run(
            self.services.pause,
            |_| self.route_and_plan(&trip, &lookup, &planner),
            |attempt, err| {
                warn!(
                    "trip planning attempt {}/{} failed: {err}",
                    attempt + 1,
                    policy.max_attempts.max(1)
                );
            },
        );

        let mut warnings = Vec::new();
        let (total_miles, route_geometry, stops) = match routed {
            Ok(Routed {
                total_miles,
                geometry,
                plan,
            }) => {
                if plan.is_fallback() {
                    warnings.push(PLANNER_FALLBACK_WARNING.to_owned());
                }
                (total_miles, geometry, plan.stops)
            }
            Err(_) => {
                let miles = estimate_distance(&lookup, &trip, self.config.fallback_distance_miles);
                warn!("using fallback itinerary with estimated distance {miles} miles");
                warnings.push(FALLBACK_DATA_WARNING.to_owned());
                (miles, None, minimal_itinerary(&trip, None, None))
            }
        };

        let eld_logs = self
            .simulator
            .simulate(&stops, total_miles, trip.current_cycle_used())?;
        info!(
            "planned trip to {:?}: {} stops, {} log records",
            trip.dropoff_location(),
            stops.len(),
            eld_logs.len()
        );

        Ok(TripPlan {
            status: ResponseStatus::Success,
            trip,
            total_miles: round2(total_miles),
            eld_logs,
            route_geometry,
            stops,
            warnings,
        })
    }

    fn route_and_plan(
        &self,
        trip: &Trip,
        lookup: &GeocodeLookup<'_>,
        planner: &StopPlanner<'_>,
    ) -> Result<Routed, AttemptError> {
        let geocode = |address: &str| {
            lookup
                .geocode_with_retry(address)
                .map_err(|source| AttemptError::Geocoding {
                    address: address.to_owned(),
                    source,
                })
        };
        let waypoints = [
            geocode(trip.current_location())?,
            geocode(trip.pickup_location())?,
            geocode(trip.dropoff_location())?,
        ];
        let summary = self
            .services
            .router
            .route(&waypoints, waypoints.len() > 3)
            .map_err(AttemptError::Routing)?;

        let plan = planner.plan(trip, summary.distance_miles, &summary.geometry);
        let geometry = RouteGeometry::new(summary.geometry).ok();
        Ok(Routed {
            total_miles: summary.distance_miles,
            geometry,
            plan,
        })
    }
}

/// Great-circle estimate of current → pickup → dropoff, or `fallback` when
/// any leg cannot be geocoded.
#[expect(clippy::float_arithmetic, reason = "summing leg distances")]
fn estimate_distance(lookup: &GeocodeLookup<'_>, trip: &Trip, fallback: f64) -> f64 {
    let legs = || -> Result<[Coord<f64>; 3], GeocodingError> {
        Ok([
            lookup.geocode_with_retry(trip.current_location())?,
            lookup.geocode_with_retry(trip.pickup_location())?,
            lookup.geocode_with_retry(trip.dropoff_location())?,
        ])
    };
    legs().map_or_else(
        |err| {
            warn!("distance estimate unavailable, assuming {fallback} miles: {err}");
            fallback
        },
        |[current, pickup, dropoff]| {
            round2(great_circle_miles(current, pickup) + great_circle_miles(pickup, dropoff))
        },
    )
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    clippy::indexing_slicing,
    reason = "tests compare with tolerances and index known fixtures"
)]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;

    use super::*;
    use crate::{
        RouteSummary, StopKind,
        test_support::{StubServices, straight_route},
    };
    use rstest::{fixture, rstest};

    const DENVER: Coord<f64> = Coord { x: -104.99, y: 39.74 };
    const CHICAGO: Coord<f64> = Coord { x: -87.63, y: 41.88 };
    const DALLAS: Coord<f64> = Coord { x: -96.8, y: 32.78 };

    #[fixture]
    fn request() -> TripRequest {
        TripRequest {
            current_location: "Denver, CO".to_owned(),
            pickup_location: "Chicago, IL".to_owned(),
            dropoff_location: "Dallas, TX".to_owned(),
            current_cycle_used: 12.0,
        }
    }

    #[fixture]
    fn config() -> PlannerConfig {
        PlannerConfig::default()
    }

    #[fixture]
    fn simulator() -> DutyLogSimulator {
        DutyLogSimulator::new(NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date"))
    }

    fn geocoded() -> StubServices {
        StubServices::default()
            .with_address("Denver, CO", DENVER)
            .with_address("Chicago, IL", CHICAGO)
            .with_address("Dallas, TX", DALLAS)
    }

    #[rstest]
    fn routed_trip_plans_stops_and_logs(
        request: TripRequest,
        config: PlannerConfig,
        simulator: DutyLogSimulator,
    ) {
        let stubs = geocoded().with_route(RouteSummary {
            distance_miles: 1200.0,
            geometry: straight_route(CHICAGO, DALLAS, 60),
        });
        let pipeline = TripPipeline::new(stubs.services(), &config, simulator);
        let plan = pipeline.plan_trip(&request).expect("plan");

        assert_eq!(plan.status, ResponseStatus::Success);
        assert!((plan.total_miles - 1200.0).abs() < f64::EPSILON);
        assert!(plan.warnings.is_empty());
        assert!(plan.route_geometry.is_some());
        let kinds: Vec<StopKind> = plan.stops.iter().map(|s| s.stop_type).collect();
        assert_eq!(
            kinds,
            vec![
                StopKind::Pickup,
                StopKind::Fuel,
                StopKind::Rest,
                StopKind::Rest,
                StopKind::Dropoff
            ]
        );
        assert!(!plan.eld_logs.is_empty());
        assert_eq!(stubs.router.calls(), vec![vec![DENVER, CHICAGO, DALLAS]]);
    }

    #[rstest]
    fn routing_failure_falls_back_after_three_attempts(
        request: TripRequest,
        config: PlannerConfig,
        simulator: DutyLogSimulator,
    ) {
        let stubs = geocoded().with_route_error(RoutingError::NoRoute {
            message: "unreachable".to_owned(),
        });
        let pipeline = TripPipeline::new(stubs.services(), &config, simulator);
        let plan = pipeline.plan_trip(&request).expect("plan");

        assert_eq!(plan.warnings, vec![FALLBACK_DATA_WARNING.to_owned()]);
        assert!(plan.route_geometry.is_none());
        assert_eq!(plan.stops.len(), 2);
        assert!(plan.stops.iter().all(|s| s.metadata.is_fallback));
        assert_eq!(stubs.router.calls().len(), 3);
        let expected = round2(
            great_circle_miles(DENVER, CHICAGO) + great_circle_miles(CHICAGO, DALLAS),
        );
        assert!((plan.total_miles - expected).abs() < 1e-9);
        assert_eq!(
            stubs.pause.recorded(),
            vec![Duration::from_secs(2), Duration::from_secs(4)]
        );
    }

    #[rstest]
    fn unknown_addresses_assume_default_distance(
        request: TripRequest,
        config: PlannerConfig,
        simulator: DutyLogSimulator,
    ) {
        let stubs = StubServices::default();
        let pipeline = TripPipeline::new(stubs.services(), &config, simulator);
        let plan = pipeline.plan_trip(&request).expect("plan");
        assert!((plan.total_miles - 500.0).abs() < f64::EPSILON);
        assert_eq!(plan.warnings, vec![FALLBACK_DATA_WARNING.to_owned()]);
    }

    #[rstest]
    fn planner_fallback_is_reported(
        request: TripRequest,
        config: PlannerConfig,
        simulator: DutyLogSimulator,
    ) {
        let stubs = geocoded().with_route(RouteSummary {
            distance_miles: 900.0,
            geometry: vec![CHICAGO],
        });
        let pipeline = TripPipeline::new(stubs.services(), &config, simulator);
        let plan = pipeline.plan_trip(&request).expect("plan");
        assert_eq!(plan.warnings, vec![PLANNER_FALLBACK_WARNING.to_owned()]);
        assert!(plan.route_geometry.is_none());
        assert_eq!(plan.stops.len(), 2);
        assert_eq!(stubs.router.calls().len(), 1);
    }

    #[rstest]
    fn exhausted_cycle_is_an_error(
        mut request: TripRequest,
        config: PlannerConfig,
        simulator: DutyLogSimulator,
    ) {
        request.current_cycle_used = 70.0;
        let stubs = geocoded().with_route(RouteSummary {
            distance_miles: 300.0,
            geometry: straight_route(CHICAGO, DALLAS, 10),
        });
        let pipeline = TripPipeline::new(stubs.services(), &config, simulator);
        let err = pipeline.plan_trip(&request).expect_err("cycle exhausted");
        assert_eq!(
            err,
            TripPlanError::CycleExceeded(CycleExceededError { cycle_used: 70.0 })
        );
        let body = err.to_response();
        assert_eq!(body.message, "Failed to create trip. Please try again.");
        assert!(body.system_message.contains("70"));
    }

    #[rstest]
    fn invalid_requests_are_rejected_before_any_lookup(
        mut request: TripRequest,
        config: PlannerConfig,
        simulator: DutyLogSimulator,
    ) {
        request.current_cycle_used = -1.0;
        let stubs = geocoded();
        let pipeline = TripPipeline::new(stubs.services(), &config, simulator);
        let err = pipeline.plan_trip(&request).expect_err("negative hours");
        assert!(matches!(err, TripPlanError::Validation(_)));
        assert_eq!(err.to_response().message, "Invalid data provided");
        assert_eq!(stubs.geocoder.calls(), 0);
    }

    #[rstest]
    fn error_body_serialises_with_status_tag() {
        let body = ErrorResponse::new("Invalid data provided", "bad");
        assert_eq!(
            serde_json::to_value(&body).expect("serialise"),
            serde_json::json!({
                "status": "error",
                "message": "Invalid data provided",
                "system_message": "bad",
            })
        );
    }
}
