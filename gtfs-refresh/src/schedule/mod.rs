//! Static schedule access.
//!
//! A `ScheduleProvider` hands out a queryable schedule; a
//! `DepartureCalculator` finds the single best upcoming departure in it.
//! Both are blocking and run on the refresh controller's worker pool.

mod calculator;
mod error;
mod provider;
mod timetable;

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::StaticDeparture;

pub use calculator::TimetableCalculator;
pub use error::ComputationError;
pub use provider::{JsonScheduleProvider, ScheduleCacheConfig};
pub use timetable::{ServiceTime, StopTime, Timetable, Trip};

/// Parameters for one departure computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepartureQuery {
    /// Origin stop id
    pub origin: String,
    /// Destination stop id
    pub destination: String,
    /// Minutes added to `now` before searching
    pub offset_minutes: i64,
    /// Whether the next service day may be searched
    pub include_tomorrow: bool,
    /// The time of the computation; becomes `computed_at`
    pub now: DateTime<Utc>,
}

/// Source of schedule handles.
pub trait ScheduleProvider {
    /// The queryable schedule type.
    type Schedule;

    /// Get a handle for the schedule at `dir`/`source`.
    ///
    /// With `force_reload` unset, repeated calls for the same source may
    /// return the same cached handle.
    fn load(
        &self,
        dir: &Path,
        source: &str,
        force_reload: bool,
    ) -> Result<Arc<Self::Schedule>, ComputationError>;

    /// Make sure any lookup index the calculator relies on is built.
    fn check_index(&self, _schedule: &Self::Schedule) -> Result<(), ComputationError> {
        Ok(())
    }
}

/// Computes the next departure from a schedule.
pub trait DepartureCalculator<S> {
    /// Find the best upcoming departure for `query`.
    ///
    /// Fails with `ComputationError::NoDeparture` when the schedule has none.
    fn compute(&self, schedule: &S, query: &DepartureQuery)
    -> Result<StaticDeparture, ComputationError>;
}
