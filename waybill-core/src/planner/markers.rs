//! Mile markers for fuel and rest stops.

use crate::hos::{
    AVERAGE_SPEED_MPH, FUEL_CUTOFF_RATIO, FUEL_INTERVAL_MILES, REST_BREAK_INTERVAL_HOURS,
    REST_CUTOFF_RATIO,
};

/// A projected stop position along the route.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Marker {
    /// One-based ordinal among stops of the same kind.
    pub ordinal: u32,
    /// Distance from the start in miles.
    pub miles: f64,
}

impl Marker {
    /// Fraction of `total_miles` covered at this marker.
    #[expect(clippy::float_arithmetic, reason = "progress ratio")]
    pub const fn progress(self, total_miles: f64) -> f64 {
        self.miles / total_miles
    }
}

/// Markers every `interval` miles, `floor(count)` of them, stopping at the
/// first one at or beyond `cutoff`.
#[expect(
    clippy::float_arithmetic,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "count is a non-negative floor and saturates for absurd distances"
)]
fn markers(count: f64, interval: f64, cutoff: f64) -> Vec<Marker> {
    let whole = count.floor().max(0.0) as u32;
    (1..=whole)
        .map(|ordinal| Marker {
            ordinal,
            miles: f64::from(ordinal) * interval,
        })
        .take_while(|marker| marker.miles < cutoff)
        .collect()
}

/// Fuel markers every 1000 miles, none within the last 5% of the trip.
#[expect(clippy::float_arithmetic, reason = "mile marker arithmetic")]
pub(crate) fn fuel_markers(total_miles: f64) -> Vec<Marker> {
    markers(
        total_miles / FUEL_INTERVAL_MILES,
        FUEL_INTERVAL_MILES,
        FUEL_CUTOFF_RATIO * total_miles,
    )
}

/// Rest markers every 8 hours of driving at the average speed, none within
/// the last 10% of the trip.
#[expect(clippy::float_arithmetic, reason = "mile marker arithmetic")]
pub(crate) fn rest_markers(total_miles: f64) -> Vec<Marker> {
    let drive_hours = total_miles / AVERAGE_SPEED_MPH;
    markers(
        drive_hours / REST_BREAK_INTERVAL_HOURS,
        REST_BREAK_INTERVAL_HOURS * AVERAGE_SPEED_MPH,
        REST_CUTOFF_RATIO * total_miles,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn miles(markers: &[Marker]) -> Vec<f64> {
        markers.iter().map(|m| m.miles).collect()
    }

    #[rstest]
    #[case(0.0, vec![])]
    #[case(999.0, vec![])]
    #[case(1000.0, vec![])]
    #[case(1052.0, vec![])]
    #[case(1053.0, vec![1000.0])]
    #[case(1200.0, vec![1000.0])]
    #[case(3500.0, vec![1000.0, 2000.0, 3000.0])]
    fn fuel_markers_respect_cutoff(#[case] total: f64, #[case] expected: Vec<f64>) {
        assert_eq!(miles(&fuel_markers(total)), expected);
    }

    #[rstest]
    #[case(399.0, vec![])]
    #[case(400.0, vec![])]
    #[case(1200.0, vec![400.0, 800.0])]
    #[case(2000.0, vec![400.0, 800.0, 1200.0, 1600.0])]
    fn rest_markers_respect_cutoff(#[case] total: f64, #[case] expected: Vec<f64>) {
        assert_eq!(miles(&rest_markers(total)), expected);
    }

    #[rstest]
    fn ordinals_start_at_one() {
        let ordinals: Vec<u32> = rest_markers(2000.0).iter().map(|m| m.ordinal).collect();
        assert_eq!(ordinals, vec![1, 2, 3, 4]);
    }
}
