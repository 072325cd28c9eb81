//! Trip requests and their validated form.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hos::MAX_CYCLE_HOURS;

/// Unvalidated trip payload as received at the request boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    /// Where the driver is now.
    pub current_location: String,
    /// Where the load is collected.
    pub pickup_location: String,
    /// Where the load is delivered.
    pub dropoff_location: String,
    /// Hours already used in the current 70-hour/8-day cycle.
    pub current_cycle_used: f64,
}

/// Errors returned by [`Trip::new`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TripValidationError {
    /// An address was empty or whitespace.
    #[error("{field} must not be empty")]
    EmptyLocation {
        /// Name of the offending field.
        field: &'static str,
    },
    /// Cycle hours were NaN or infinite.
    #[error("cycle hours must be a finite number")]
    NonFiniteCycleHours,
    /// Cycle hours fell outside `[0, 70]`.
    #[error("cycle hours must be between 0 and {max}, got {hours}")]
    CycleHoursOutOfRange {
        /// Value supplied by the caller.
        hours: f64,
        /// Upper bound of the cycle.
        max: f64,
    },
}

/// A validated trip. Immutable once constructed.
///
/// # Examples
/// ```
/// use waybill_core::Trip;
///
/// let trip = Trip::new("Chicago, IL", "St. Louis, MO", "Dallas, TX", 12.5)?;
/// assert_eq!(trip.pickup_location(), "St. Louis, MO");
/// assert!(Trip::new("a", "b", "c", 70.5).is_err());
/// # Ok::<(), waybill_core::TripValidationError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trip {
    current_location: String,
    pickup_location: String,
    dropoff_location: String,
    current_cycle_used: f64,
}

impl Trip {
    /// Validate and construct a [`Trip`].
    pub fn new(
        current_location: impl Into<String>,
        pickup_location: impl Into<String>,
        dropoff_location: impl Into<String>,
        current_cycle_used: f64,
    ) -> Result<Self, TripValidationError> {
        let current = non_empty(current_location.into(), "current_location")?;
        let pickup = non_empty(pickup_location.into(), "pickup_location")?;
        let dropoff = non_empty(dropoff_location.into(), "dropoff_location")?;
        if !current_cycle_used.is_finite() {
            return Err(TripValidationError::NonFiniteCycleHours);
        }
        if !(0.0..=MAX_CYCLE_HOURS).contains(&current_cycle_used) {
            return Err(TripValidationError::CycleHoursOutOfRange {
                hours: current_cycle_used,
                max: MAX_CYCLE_HOURS,
            });
        }
        Ok(Self {
            current_location: current,
            pickup_location: pickup,
            dropoff_location: dropoff,
            current_cycle_used,
        })
    }

    /// Where the driver starts.
    #[must_use]
    pub fn current_location(&self) -> &str {
        &self.current_location
    }

    /// Where the load is collected.
    #[must_use]
    pub fn pickup_location(&self) -> &str {
        &self.pickup_location
    }

    /// Where the load is delivered.
    #[must_use]
    pub fn dropoff_location(&self) -> &str {
        &self.dropoff_location
    }

    /// Hours already used in the current cycle.
    #[must_use]
    pub fn current_cycle_used(&self) -> f64 {
        self.current_cycle_used
    }
}

impl TryFrom<&TripRequest> for Trip {
    type Error = TripValidationError;

    fn try_from(request: &TripRequest) -> Result<Self, Self::Error> {
        Self::new(
            request.current_location.clone(),
            request.pickup_location.clone(),
            request.dropoff_location.clone(),
            request.current_cycle_used,
        )
    }
}

fn non_empty(value: String, field: &'static str) -> Result<String, TripValidationError> {
    if value.trim().is_empty() {
        Err(TripValidationError::EmptyLocation { field })
    } else {
        Ok(value)
    }
}
