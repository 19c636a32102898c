//! The per-cycle refresh result.

use std::path::PathBuf;

use serde::Serialize;

use crate::config::{StopRef, TripConfig};

use super::departure::StaticDeparture;

/// Everything downstream consumers see after a refresh cycle.
///
/// Built whole each cycle and handed over as a single value, so a reader
/// never observes a half-merged result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshResult {
    pub name: String,
    pub origin: StopRef,
    pub destination: StopRef,
    pub offset_minutes: i64,
    pub include_tomorrow: bool,
    pub schedule_dir: PathBuf,
    pub departure: StaticDeparture,
}

impl RefreshResult {
    /// Assemble a result from the trip and a departure.
    pub fn new(trip: &TripConfig, departure: StaticDeparture) -> Self {
        Self {
            name: trip.name.clone(),
            origin: trip.origin.clone(),
            destination: trip.destination.clone(),
            offset_minutes: trip.offset_minutes,
            include_tomorrow: trip.include_tomorrow,
            schedule_dir: trip.schedule_dir.clone(),
            departure,
        }
    }
}
