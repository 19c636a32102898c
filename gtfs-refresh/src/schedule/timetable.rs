//! Timetable model loaded from disk.
//!
//! Times are GTFS service-day offsets ("HH:MM:SS", hours may exceed 23)
//! relative to midnight in the timetable's fixed UTC offset.

use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

use chrono::FixedOffset;
use serde::Deserialize;

use super::error::ComputationError;

/// Seconds after service-day midnight.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(try_from = "String")]
pub struct ServiceTime(u32);

impl ServiceTime {
    /// Parse a GTFS `HH:MM:SS` time. Hours may exceed 23.
    pub fn parse(s: &str) -> Result<Self, String> {
        let mut parts = s.trim().split(':');
        let (Some(h), Some(m), Some(sec), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("expected HH:MM:SS, got {s:?}"));
        };

        let field = |v: &str| v.parse::<u32>().map_err(|_| format!("bad time {s:?}"));
        let (h, m, sec) = (field(h)?, field(m)?, field(sec)?);

        if m >= 60 || sec >= 60 {
            return Err(format!("minutes and seconds must be below 60 in {s:?}"));
        }

        Ok(Self(h * 3600 + m * 60 + sec))
    }

    /// Seconds after midnight.
    pub fn seconds(self) -> u32 {
        self.0
    }
}

impl TryFrom<String> for ServiceTime {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl fmt::Debug for ServiceTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = (self.0 / 3600, (self.0 / 60) % 60, self.0 % 60);
        write!(f, "ServiceTime({h:02}:{m:02}:{s:02})")
    }
}

/// One stop visit on a trip.
#[derive(Debug, Clone, Deserialize)]
pub struct StopTime {
    pub stop_id: String,
    pub arrival: Option<ServiceTime>,
    pub departure: Option<ServiceTime>,
}

impl StopTime {
    /// Departure time, falling back to arrival.
    pub fn departure_or_arrival(&self) -> Option<ServiceTime> {
        self.departure.or(self.arrival)
    }

    /// Arrival time, falling back to departure.
    pub fn arrival_or_departure(&self) -> Option<ServiceTime> {
        self.arrival.or(self.departure)
    }
}

/// A scheduled trip, running every service day.
#[derive(Debug, Clone, Deserialize)]
pub struct Trip {
    pub trip_id: String,
    pub route_id: String,
    pub stop_times: Vec<StopTime>,
}

/// Position of a stop visit: (trip index, stop time index).
pub type StopVisit = (usize, usize);

/// A parsed timetable.
#[derive(Debug, Deserialize)]
pub struct Timetable {
    /// Offset of service-day midnight from UTC, in minutes
    #[serde(default)]
    pub utc_offset_minutes: i32,

    /// Stop id → display name
    #[serde(default)]
    pub stops: HashMap<String, String>,

    pub trips: Vec<Trip>,

    #[serde(skip)]
    index: OnceLock<HashMap<String, Vec<StopVisit>>>,
}

impl Timetable {
    /// Parse a timetable from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The timetable's fixed offset from UTC.
    pub fn timezone(&self) -> Result<FixedOffset, ComputationError> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            ComputationError::Index(format!(
                "utc offset out of range: {} minutes",
                self.utc_offset_minutes
            ))
        })
    }

    /// Display name for a stop, falling back to its id.
    pub fn stop_name<'a>(&'a self, stop_id: &'a str) -> &'a str {
        self.stops.get(stop_id).map(String::as_str).unwrap_or(stop_id)
    }

    /// Whether the stop index has been built.
    pub fn is_indexed(&self) -> bool {
        self.index.get().is_some()
    }

    /// Stop id → every visit to that stop, built on first use.
    pub fn index(&self) -> &HashMap<String, Vec<StopVisit>> {
        self.index.get_or_init(|| build_index(&self.trips))
    }

    /// Visits to a stop, in timetable order.
    pub fn visits(&self, stop_id: &str) -> &[StopVisit] {
        self.index().get(stop_id).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn build_index(trips: &[Trip]) -> HashMap<String, Vec<StopVisit>> {
    let mut index: HashMap<String, Vec<StopVisit>> = HashMap::new();
    for (trip_idx, trip) in trips.iter().enumerate() {
        for (stop_idx, stop_time) in trip.stop_times.iter().enumerate() {
            index
                .entry(stop_time.stop_id.clone())
                .or_default()
                .push((trip_idx, stop_idx));
        }
    }
    index
}
