//! Stop placement along a route.
//!
//! The planner emits a pickup, fuel stops every 1000 miles, rest stops every
//! eight hours of driving and a dropoff. Intermediate stops sit at a route
//! point chosen by proportional interpolation and are named after a nearby
//! point of interest when one can be found.
//!
//! Any failure while planning degrades to a two-stop itinerary instead of
//! surfacing an error: [`StopPlan::fallback_reason`] records why.

mod markers;

use geo::Coord;
use log::warn;
use thiserror::Error;

use crate::{
    GeometryError, RouteGeometry, Stop, StopKind, StopMetadata, Trip,
    config::PlannerConfig,
    lookup::GeocodeLookup,
    ports::{GeocodingError, Services},
    resolver::PoiResolver,
};

use markers::{Marker, fuel_markers, rest_markers};

/// Reasons a full stop plan could not be produced.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanningError {
    /// A pickup or dropoff address could not be geocoded.
    #[error("failed to geocode {address:?}")]
    Geocoding {
        /// Address that failed.
        address: String,
        /// Underlying geocoder error.
        #[source]
        source: GeocodingError,
    },
    /// The route geometry was unusable.
    #[error("invalid route geometry")]
    Geometry(#[from] GeometryError),
    /// The route distance was zero, negative or not finite.
    #[error("route distance must be positive, got {miles}")]
    InvalidDistance {
        /// Distance received.
        miles: f64,
    },
    /// The plan did not contain both a pickup and a dropoff.
    #[error("a plan needs at least 2 stops, got {count}")]
    TooFewStops {
        /// Number of stops produced.
        count: usize,
    },
}

/// Output of [`StopPlanner::plan`].
#[derive(Debug, Clone, PartialEq)]
pub struct StopPlan {
    /// Stops ordered by sequence.
    pub stops: Vec<Stop>,
    /// Why planning degraded to the minimal itinerary, if it did.
    pub fallback_reason: Option<PlanningError>,
}

impl StopPlan {
    /// Whether the minimal itinerary was substituted.
    #[must_use]
    pub const fn is_fallback(&self) -> bool {
        self.fallback_reason.is_some()
    }
}

/// Places pickup, fuel, rest and dropoff stops for a trip.
#[derive(Debug, Clone, Copy)]
pub struct StopPlanner<'a> {
    lookup: GeocodeLookup<'a>,
    resolver: PoiResolver<'a>,
    config: &'a PlannerConfig,
}

impl<'a> StopPlanner<'a> {
    /// Bind a planner to a service set and configuration.
    #[must_use]
    pub fn new(services: &Services<'a>, config: &'a PlannerConfig) -> Self {
        Self {
            lookup: GeocodeLookup::new(services, config),
            resolver: PoiResolver::new(services, config),
            config,
        }
    }

    /// Plan the stops for `trip` along `route`, degrading to
    /// [`minimal_itinerary`] on failure.
    ///
    /// The returned stops always start with a pickup, end with a dropoff and
    /// carry sequence numbers `1..=n`.
    pub fn plan(&self, trip: &Trip, total_miles: f64, route: &[Coord<f64>]) -> StopPlan {
        let outcome = self.try_plan(trip, total_miles, route).and_then(|stops| {
            if stops.len() < 2 {
                Err(PlanningError::TooFewStops { count: stops.len() })
            } else {
                Ok(stops)
            }
        });
        match outcome {
            Ok(stops) => StopPlan {
                stops,
                fallback_reason: None,
            },
            Err(err) => {
                warn!("stop planning failed, using pickup and dropoff only: {err}");
                StopPlan {
                    stops: self.fallback_stops(trip),
                    fallback_reason: Some(err),
                }
            }
        }
    }

    /// Plan without degrading: the first failure is returned.
    pub fn try_plan(
        &self,
        trip: &Trip,
        total_miles: f64,
        route: &[Coord<f64>],
    ) -> Result<Vec<Stop>, PlanningError> {
        if !total_miles.is_finite() || total_miles <= 0.0 {
            return Err(PlanningError::InvalidDistance { miles: total_miles });
        }
        let geometry = RouteGeometry::new(route.to_vec())?;

        let mut stops = Vec::new();
        let pickup = self.geocode(trip.pickup_location())?;
        stops.push(Stop::new(
            StopKind::Pickup,
            trip.pickup_location(),
            next_sequence(&stops),
            StopMetadata::with_purpose("Load pickup").at(Some(pickup)),
        ));

        for marker in fuel_markers(total_miles) {
            let stop = self.intermediate_stop(
                Waypoint::Fuel,
                marker,
                total_miles,
                &geometry,
                next_sequence(&stops),
            );
            stops.push(stop);
        }
        for marker in rest_markers(total_miles) {
            let stop = self.intermediate_stop(
                Waypoint::Rest,
                marker,
                total_miles,
                &geometry,
                next_sequence(&stops),
            );
            stops.push(stop);
        }

        let dropoff = self.geocode(trip.dropoff_location())?;
        stops.push(Stop::new(
            StopKind::Dropoff,
            trip.dropoff_location(),
            next_sequence(&stops),
            StopMetadata::with_purpose("Unload delivery").at(Some(dropoff)),
        ));

        stops.sort_by_key(|stop| stop.sequence);
        Ok(stops)
    }

    /// Pickup and dropoff only, with coordinates where a direct geocode
    /// still succeeds.
    #[must_use]
    pub fn fallback_stops(&self, trip: &Trip) -> Vec<Stop> {
        let pickup = self.lookup.geocode(trip.pickup_location()).ok();
        let dropoff = self.lookup.geocode(trip.dropoff_location()).ok();
        minimal_itinerary(trip, pickup, dropoff)
    }

    fn geocode(&self, address: &str) -> Result<Coord<f64>, PlanningError> {
        self.lookup
            .geocode(address)
            .map_err(|source| PlanningError::Geocoding {
                address: address.to_owned(),
                source,
            })
    }

    fn intermediate_stop(
        &self,
        waypoint: Waypoint,
        marker: Marker,
        total_miles: f64,
        route: &RouteGeometry,
        sequence: u32,
    ) -> Stop {
        let at = route.interpolate(marker.progress(total_miles));
        let kind = waypoint.kind();
        let keywords = waypoint.keywords(self.config);
        let label = waypoint.label(marker.ordinal);
        let mut metadata = StopMetadata::with_purpose(waypoint.purpose(marker.ordinal));
        metadata.estimated_mileage = Some(marker.miles);

        let Some((poi, radius)) = self.resolver.resolve_escalating(at, keywords) else {
            warn!(
                "no {kind} location found near ({}, {}) at mile {}; using {label:?}",
                at.y, at.x, marker.miles
            );
            return Stop::new(kind, label, sequence, metadata.at(Some(at)).fallback(true));
        };
        metadata.coordinates = Some(poi.location);
        metadata.address = Some(poi.address);
        metadata.search_radius_km = Some(radius);
        Stop::new(kind, poi.name, sequence, metadata)
    }
}

/// Stop kinds placed between pickup and dropoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Waypoint {
    Fuel,
    Rest,
}

impl Waypoint {
    const fn kind(self) -> StopKind {
        match self {
            Self::Fuel => StopKind::Fuel,
            Self::Rest => StopKind::Rest,
        }
    }

    fn keywords(self, config: &PlannerConfig) -> &[String] {
        match self {
            Self::Fuel => &config.fuel_keywords,
            Self::Rest => &config.rest_keywords,
        }
    }

    /// Location name used when no point of interest is found.
    fn label(self, ordinal: u32) -> String {
        match self {
            Self::Fuel => format!("Fuel stop #{ordinal}"),
            Self::Rest => format!("Rest stop #{ordinal}"),
        }
    }

    fn purpose(self, ordinal: u32) -> String {
        match self {
            Self::Fuel => format!("Fuel stop #{ordinal}"),
            Self::Rest => format!("Mandatory rest break #{ordinal}"),
        }
    }
}

fn next_sequence(stops: &[Stop]) -> u32 {
    stops.last().map_or(1, |stop| stop.sequence + 1)
}

/// The two-stop itinerary used whenever full planning is unavailable.
///
/// # Examples
/// ```
/// use waybill_core::{StopKind, Trip, minimal_itinerary};
///
/// let trip = Trip::new("Denver, CO", "Chicago, IL", "Dallas, TX", 10.0)?;
/// let stops = minimal_itinerary(&trip, None, None);
/// assert_eq!(stops.len(), 2);
/// assert_eq!(stops[0].stop_type, StopKind::Pickup);
/// assert!(stops[1].metadata.is_fallback);
/// # Ok::<(), waybill_core::TripValidationError>(())
/// ```
#[must_use]
pub fn minimal_itinerary(
    trip: &Trip,
    pickup: Option<Coord<f64>>,
    dropoff: Option<Coord<f64>>,
) -> Vec<Stop> {
    vec![
        Stop::new(
            StopKind::Pickup,
            trip.pickup_location(),
            1,
            StopMetadata::with_purpose("Load pickup (fallback)")
                .at(pickup)
                .fallback(true),
        ),
        Stop::new(
            StopKind::Dropoff,
            trip.dropoff_location(),
            2,
            StopMetadata::with_purpose("Unload delivery (fallback)")
                .at(dropoff)
                .fallback(true),
        ),
    ]
}

#[cfg(test)]
#[expect(
    clippy::indexing_slicing,
    clippy::shadow_reuse,
    reason = "tests index known stop lists and rebind fixtures"
)]
mod tests {
    use super::*;
    use crate::{PoiCandidate, test_support::{StubServices, straight_route}};
    use rstest::{fixture, rstest};

    const CHICAGO: Coord<f64> = Coord { x: -87.63, y: 41.88 };
    const DALLAS: Coord<f64> = Coord { x: -96.8, y: 32.78 };

    #[fixture]
    fn trip() -> Trip {
        Trip::new("Denver, CO", "Chicago, IL", "Dallas, TX", 10.0).expect("valid trip")
    }

    #[fixture]
    fn config() -> PlannerConfig {
        PlannerConfig::default()
    }

    #[fixture]
    fn stubs() -> StubServices {
        StubServices::default()
            .with_address("Chicago, IL", CHICAGO)
            .with_address("Dallas, TX", DALLAS)
    }

    fn kinds(stops: &[Stop]) -> Vec<StopKind> {
        stops.iter().map(|s| s.stop_type).collect()
    }

    #[rstest]
    fn twelve_hundred_miles_gets_one_fuel_and_two_rest_stops(
        trip: Trip,
        config: PlannerConfig,
        stubs: StubServices,
    ) {
        let planner = StopPlanner::new(&stubs.services(), &config);
        let plan = planner.plan(&trip, 1200.0, &straight_route(CHICAGO, DALLAS, 100));
        assert!(!plan.is_fallback());
        assert_eq!(
            kinds(&plan.stops),
            vec![
                StopKind::Pickup,
                StopKind::Fuel,
                StopKind::Rest,
                StopKind::Rest,
                StopKind::Dropoff
            ]
        );
        let sequences: Vec<u32> = plan.stops.iter().map(|s| s.sequence).collect();
        assert_eq!(sequences, vec![1, 2, 3, 4, 5]);
        assert_eq!(plan.stops[1].location, "Fuel stop #1");
        assert_eq!(plan.stops[1].metadata.purpose.as_deref(), Some("Fuel stop #1"));
        assert_eq!(plan.stops[1].metadata.estimated_mileage, Some(1000.0));
        assert!(plan.stops[1].metadata.is_fallback);
        assert_eq!(plan.stops[3].location, "Rest stop #2");
        assert_eq!(
            plan.stops[3].metadata.purpose.as_deref(),
            Some("Mandatory rest break #2")
        );
    }

    #[rstest]
    #[case(Waypoint::Fuel, StopKind::Fuel, "Fuel stop #3", "Fuel stop #3")]
    #[case(Waypoint::Rest, StopKind::Rest, "Rest stop #3", "Mandatory rest break #3")]
    fn waypoints_describe_their_stops(
        config: PlannerConfig,
        #[case] waypoint: Waypoint,
        #[case] kind: StopKind,
        #[case] label: &str,
        #[case] purpose: &str,
    ) {
        assert_eq!(waypoint.kind(), kind);
        assert_eq!(waypoint.label(3), label);
        assert_eq!(waypoint.purpose(3), purpose);
        let expected = match waypoint {
            Waypoint::Fuel => &config.fuel_keywords,
            Waypoint::Rest => &config.rest_keywords,
        };
        assert_eq!(waypoint.keywords(&config), expected.as_slice());
    }

    #[rstest]
    fn intermediate_stops_sit_on_interpolated_route_points(
        trip: Trip,
        config: PlannerConfig,
        stubs: StubServices,
    ) {
        let route = straight_route(CHICAGO, DALLAS, 100);
        let planner = StopPlanner::new(&stubs.services(), &config);
        let plan = planner.plan(&trip, 1200.0, &route);
        // 1000 / 1200 of 100 points rounds to index 83.
        assert_eq!(plan.stops[1].metadata.coordinates, Some(route[83]));
        assert_eq!(plan.stops[2].metadata.coordinates, Some(route[33]));
    }

    #[rstest]
    fn resolved_stops_take_poi_name_and_radius(
        trip: Trip,
        config: PlannerConfig,
        stubs: StubServices,
    ) {
        let stubs = stubs.with_poi(
            "truck stop",
            PoiCandidate::new("Flying J, I-44, Joplin", Coord { x: -94.5, y: 37.1 }),
        );
        let planner = StopPlanner::new(&stubs.services(), &config);
        let plan = planner.plan(&trip, 1200.0, &straight_route(CHICAGO, DALLAS, 100));
        let fuel = &plan.stops[1];
        assert_eq!(fuel.location, "Flying J");
        assert!(!fuel.metadata.is_fallback);
        assert_eq!(fuel.metadata.search_radius_km, Some(10.0));
        assert_eq!(fuel.metadata.address.as_deref(), Some("Flying J, I-44, Joplin"));
        assert_eq!(fuel.metadata.coordinates, Some(Coord { x: -94.5, y: 37.1 }));
    }

    #[rstest]
    fn short_trips_have_only_endpoints(trip: Trip, config: PlannerConfig, stubs: StubServices) {
        let planner = StopPlanner::new(&stubs.services(), &config);
        let plan = planner.plan(&trip, 350.0, &straight_route(CHICAGO, DALLAS, 10));
        assert!(!plan.is_fallback());
        assert_eq!(kinds(&plan.stops), vec![StopKind::Pickup, StopKind::Dropoff]);
        assert_eq!(plan.stops[0].metadata.coordinates, Some(CHICAGO));
        assert_eq!(plan.stops[0].metadata.purpose.as_deref(), Some("Load pickup"));
        assert!(!plan.stops[1].metadata.is_fallback);
    }

    #[rstest]
    #[case::one_point(vec![CHICAGO], 1200.0)]
    #[case::zero_distance(vec![CHICAGO, DALLAS], 0.0)]
    #[case::nan_distance(vec![CHICAGO, DALLAS], f64::NAN)]
    fn unusable_inputs_degrade_to_minimal_itinerary(
        trip: Trip,
        config: PlannerConfig,
        stubs: StubServices,
        #[case] route: Vec<Coord<f64>>,
        #[case] miles: f64,
    ) {
        let planner = StopPlanner::new(&stubs.services(), &config);
        let plan = planner.plan(&trip, miles, &route);
        assert!(plan.is_fallback());
        assert_eq!(kinds(&plan.stops), vec![StopKind::Pickup, StopKind::Dropoff]);
        assert!(plan.stops.iter().all(|s| s.metadata.is_fallback));
        assert_eq!(plan.stops[0].metadata.coordinates, Some(CHICAGO));
        assert_eq!(plan.stops[1].metadata.coordinates, Some(DALLAS));
    }

    #[rstest]
    fn geocoding_failure_degrades_without_coordinates(trip: Trip, config: PlannerConfig) {
        let stubs = StubServices::default().with_address("Chicago, IL", CHICAGO);
        let planner = StopPlanner::new(&stubs.services(), &config);
        let plan = planner.plan(&trip, 1200.0, &straight_route(CHICAGO, DALLAS, 50));
        assert!(matches!(
            plan.fallback_reason,
            Some(PlanningError::Geocoding { ref address, .. }) if address == "Dallas, TX"
        ));
        assert_eq!(plan.stops[0].metadata.coordinates, Some(CHICAGO));
        assert_eq!(plan.stops[1].metadata.coordinates, None);
        assert_eq!(
            plan.stops[1].metadata.purpose.as_deref(),
            Some("Unload delivery (fallback)")
        );
    }

    #[rstest]
    fn route_is_validated_before_geocoding(trip: Trip, config: PlannerConfig, stubs: StubServices) {
        let planner = StopPlanner::new(&stubs.services(), &config);
        let err = planner
            .try_plan(&trip, 1200.0, &[])
            .expect_err("empty route should fail");
        assert_eq!(
            err,
            PlanningError::Geometry(GeometryError::TooFewPoints { count: 0 })
        );
        assert_eq!(stubs.geocoder.calls(), 0);
    }
}
