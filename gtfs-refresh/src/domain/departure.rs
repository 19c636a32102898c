//! Static departures and their real-time overlay.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Whether the feed currently reports the route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    /// The feed has trip updates for the route
    Running,
    /// The feed has nothing for the route
    NoData,
}

/// The real-time adjusted next service at the origin stop.
///
/// Every field is optional: a feed with no matching departures still
/// produces an estimate, just an empty one.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RealTimeEstimate {
    /// Next predicted departure from the stop
    pub next_departure: Option<DateTime<Utc>>,
    /// Whole minutes until `next_departure`
    pub due_in_minutes: Option<i64>,
    /// The predicted departure after that
    pub following_departure: Option<DateTime<Utc>>,
    /// Latitude of the vehicle running the next departure
    pub latitude: Option<f64>,
    /// Longitude of the vehicle running the next departure
    pub longitude: Option<f64>,
}

/// Real-time data layered onto a static departure.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RealTimeOverlay {
    pub route_status: RouteStatus,
    pub estimate: RealTimeEstimate,
    /// When this overlay was fetched. Never earlier than the departure's
    /// own `computed_at`.
    pub computed_at: DateTime<Utc>,
}

/// One computed next departure from the timetable.
///
/// Replaced wholesale on recomputation. Only `realtime` changes between
/// recomputations.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StaticDeparture {
    pub route_id: String,
    pub trip_id: String,
    pub origin_stop_id: String,
    pub origin_stop_name: String,
    pub destination_stop_id: String,
    pub destination_stop_name: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    /// The departure belongs to the next service day
    pub is_tomorrow: bool,
    /// When the timetable was queried. Used for staleness checks.
    pub computed_at: DateTime<Utc>,
    pub realtime: Option<RealTimeOverlay>,
}

impl StaticDeparture {
    /// Replace any overlay with `overlay`.
    pub fn with_overlay(mut self, overlay: RealTimeOverlay) -> Self {
        self.realtime = Some(overlay);
        self
    }

    /// Drop any overlay.
    pub fn without_overlay(mut self) -> Self {
        self.realtime = None;
        self
    }
}
