//! Route geometry, interpolation and great-circle distances.
//!
//! Coordinates are WGS84 with `x = longitude` and `y = latitude`, matching
//! the order routing services return. Where coordinates leave the engine as
//! stop metadata they are written as `[latitude, longitude]` pairs; see
//! [`lat_lng`].

use geo::{Coord, Distance, Haversine, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metres in a statute mile.
pub const METERS_PER_MILE: f64 = 1609.344;

/// Errors returned by [`RouteGeometry::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Fewer than two points were supplied.
    #[error("route geometry needs at least 2 points, got {count}")]
    TooFewPoints {
        /// Number of points received.
        count: usize,
    },
    /// A point carried a NaN or infinite ordinate.
    #[error("route geometry point {index} is not finite")]
    NonFinite {
        /// Position of the offending point.
        index: usize,
    },
}

/// An ordered, validated polyline of at least two points.
///
/// Serialises as a GeoJSON `LineString` object.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use waybill_core::RouteGeometry;
///
/// let route = RouteGeometry::new(vec![
///     Coord { x: -87.6, y: 41.9 },
///     Coord { x: -90.0, y: 40.0 },
///     Coord { x: -95.0, y: 39.0 },
/// ])?;
/// assert_eq!(route.len(), 3);
/// # Ok::<(), waybill_core::GeometryError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "LineStringJson", into = "LineStringJson")]
pub struct RouteGeometry {
    points: Vec<Coord<f64>>,
}

impl RouteGeometry {
    /// Validate and wrap a sequence of `(longitude, latitude)` points.
    pub fn new(points: Vec<Coord<f64>>) -> Result<Self, GeometryError> {
        if points.len() < 2 {
            return Err(GeometryError::TooFewPoints {
                count: points.len(),
            });
        }
        if let Some(index) = points
            .iter()
            .position(|p| !(p.x.is_finite() && p.y.is_finite()))
        {
            return Err(GeometryError::NonFinite { index });
        }
        Ok(Self { points })
    }

    /// Points in route order.
    #[must_use]
    pub fn points(&self) -> &[Coord<f64>] {
        &self.points
    }

    /// Number of points in the polyline. Always at least two.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always `false`; present for API symmetry with slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Map a fractional `progress` along the route to one of its points.
    ///
    /// The index is `round(progress * len)` clamped to `1..=len - 2`, so the
    /// result is never the first point and, for routes of three or more
    /// points, never the last one either. A two-point route yields its second
    /// point. `progress` outside `[0, 1]` is clamped first.
    ///
    /// # Examples
    /// ```
    /// use geo::Coord;
    /// use waybill_core::RouteGeometry;
    ///
    /// let points: Vec<_> = (0..10).map(|i| Coord { x: f64::from(i), y: 0.0 }).collect();
    /// let route = RouteGeometry::new(points)?;
    /// assert_eq!(route.interpolate(0.5), Coord { x: 5.0, y: 0.0 });
    /// assert_eq!(route.interpolate(0.0), Coord { x: 1.0, y: 0.0 });
    /// assert_eq!(route.interpolate(1.0), Coord { x: 8.0, y: 0.0 });
    /// # Ok::<(), waybill_core::GeometryError>(())
    /// ```
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "route lengths are far below 2^52 and the index is clamped after the cast"
    )]
    #[expect(
        clippy::indexing_slicing,
        reason = "index is clamped to 1..=len - 2 and routes hold at least two points"
    )]
    pub fn interpolate(&self, progress: f64) -> Coord<f64> {
        let len = self.points.len();
        let scaled = (progress.clamp(0.0, 1.0) * len as f64).round();
        // `as` saturates and maps NaN to zero, which the clamp below absorbs.
        let raw = scaled as usize;
        let index = raw.min(len.saturating_sub(2)).max(1);
        self.points[index]
    }
}

/// Great-circle distance in kilometres.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "unit conversion")]
pub fn great_circle_km(from: Coord<f64>, to: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(from), Point::from(to)) / 1000.0
}

/// Great-circle distance in statute miles.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "unit conversion")]
pub fn great_circle_miles(from: Coord<f64>, to: Coord<f64>) -> f64 {
    Haversine.distance(Point::from(from), Point::from(to)) / METERS_PER_MILE
}

/// Round to two decimal places, the precision used in responses.
#[expect(clippy::float_arithmetic, reason = "decimal rounding")]
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LineStringJson {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Vec<[f64; 2]>,
}

impl From<RouteGeometry> for LineStringJson {
    fn from(route: RouteGeometry) -> Self {
        Self {
            kind: "LineString".to_owned(),
            coordinates: route.points.iter().map(|p| [p.x, p.y]).collect(),
        }
    }
}

impl TryFrom<LineStringJson> for RouteGeometry {
    type Error = GeometryError;

    fn try_from(json: LineStringJson) -> Result<Self, Self::Error> {
        Self::new(
            json.coordinates
                .into_iter()
                .map(|[x, y]| Coord { x, y })
                .collect(),
        )
    }
}

/// Serde adapter writing a [`Coord`] as a `[latitude, longitude]` pair.
pub mod lat_lng {
    use geo::Coord;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialise `coord` as `[lat, lng]`.
    pub fn serialize<S: Serializer>(coord: &Coord<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        [coord.y, coord.x].serialize(serializer)
    }

    /// Deserialise a `[lat, lng]` pair.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Coord<f64>, D::Error> {
        let [lat, lng] = <[f64; 2]>::deserialize(deserializer)?;
        Ok(Coord { x: lng, y: lat })
    }

    /// Optional variant of the `[lat, lng]` adapter.
    pub mod option {
        use geo::Coord;
        use serde::{Deserialize, Deserializer, Serialize, Serializer};

        /// Serialise `Some(coord)` as `[lat, lng]` and `None` as `null`.
        pub fn serialize<S: Serializer>(
            coord: &Option<Coord<f64>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            coord.map(|c| [c.y, c.x]).serialize(serializer)
        }

        /// Deserialise an optional `[lat, lng]` pair.
        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<Coord<f64>>, D::Error> {
            let pair = Option::<[f64; 2]>::deserialize(deserializer)?;
            Ok(pair.map(|[lat, lng]| Coord { x: lng, y: lat }))
        }
    }
}

#[cfg(test)]
#[expect(
    clippy::float_arithmetic,
    clippy::indexing_slicing,
    reason = "tests index known fixtures and compare distances"
)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn ten_point_route() -> RouteGeometry {
        let points = (0..10)
            .map(|i| Coord {
                x: f64::from(i),
                y: f64::from(i) * 0.5,
            })
            .collect();
        RouteGeometry::new(points).expect("valid route")
    }

    #[rstest]
    #[case(0.0, 1)]
    #[case(0.04, 1)]
    #[case(0.25, 3)]
    #[case(0.5, 5)]
    #[case(0.96, 8)]
    #[case(1.0, 8)]
    fn interpolate_picks_interior_index(
        ten_point_route: RouteGeometry,
        #[case] progress: f64,
        #[case] expected: usize,
    ) {
        let coord = ten_point_route.interpolate(progress);
        assert_eq!(coord, ten_point_route.points()[expected]);
    }

    #[rstest]
    fn interpolate_never_returns_endpoints(ten_point_route: RouteGeometry) {
        let first = ten_point_route.points()[0];
        let last = ten_point_route.points()[ten_point_route.len() - 1];
        for step in 0..=100 {
            let coord = ten_point_route.interpolate(f64::from(step) / 100.0);
            assert_ne!(coord, first);
            assert_ne!(coord, last);
        }
    }

    #[rstest]
    fn two_point_route_yields_second_point() {
        let route = RouteGeometry::new(vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }])
            .expect("valid route");
        assert_eq!(route.interpolate(0.0), Coord { x: 1.0, y: 1.0 });
        assert_eq!(route.interpolate(0.7), Coord { x: 1.0, y: 1.0 });
    }

    #[rstest]
    #[case(Vec::new(), GeometryError::TooFewPoints { count: 0 })]
    #[case(vec![Coord { x: 0.0, y: 0.0 }], GeometryError::TooFewPoints { count: 1 })]
    #[case(
        vec![Coord { x: 0.0, y: 0.0 }, Coord { x: f64::NAN, y: 1.0 }],
        GeometryError::NonFinite { index: 1 }
    )]
    fn new_rejects_invalid_geometry(#[case] points: Vec<Coord<f64>>, #[case] expected: GeometryError) {
        let err = RouteGeometry::new(points).expect_err("geometry should be rejected");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn serialises_as_geojson_line_string() {
        let route = RouteGeometry::new(vec![Coord { x: -87.6, y: 41.9 }, Coord { x: -90.1, y: 38.6 }])
            .expect("valid route");
        let json = serde_json::to_value(&route).expect("serialise");
        assert_eq!(
            json,
            serde_json::json!({
                "type": "LineString",
                "coordinates": [[-87.6, 41.9], [-90.1, 38.6]],
            })
        );
        let back: RouteGeometry = serde_json::from_value(json).expect("deserialise");
        assert_eq!(back, route);
    }

    #[rstest]
    fn great_circle_distance_between_known_cities() {
        let chicago = Coord { x: -87.6298, y: 41.8781 };
        let st_louis = Coord { x: -90.1994, y: 38.6270 };
        let miles = great_circle_miles(chicago, st_louis);
        assert!((miles - 262.3).abs() < 1.0, "unexpected distance {miles}");
        let km = great_circle_km(chicago, st_louis);
        assert!((km / miles - 1.609_344).abs() < 1e-6);
    }

    #[rstest]
    #[case(1.234_9, 1.23)]
    #[case(1.235_1, 1.24)]
    #[case(7.0, 7.0)]
    fn round2_keeps_two_decimals(#[case] input: f64, #[case] expected: f64) {
        assert!((round2(input) - expected).abs() < 1e-9);
    }
}
