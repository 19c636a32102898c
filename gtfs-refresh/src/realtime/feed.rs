//! JSON encoding of a GTFS-RT feed message.
//!
//! Covers the subset of trip updates and vehicle positions needed to
//! estimate the next service. Field names follow the protobuf names;
//! the camelCase proto3 JSON names are accepted too, and 64-bit times may
//! arrive as numbers or strings.

use serde::{Deserialize, Deserializer};

/// A full feed message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedMessage {
    #[serde(default)]
    pub entity: Vec<FeedEntity>,
}

impl FeedMessage {
    /// Decode a feed message from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedEntity {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "tripUpdate")]
    pub trip_update: Option<TripUpdate>,
    #[serde(default)]
    pub vehicle: Option<VehiclePosition>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripDescriptor {
    #[serde(default, alias = "tripId")]
    pub trip_id: Option<String>,
    #[serde(default, alias = "routeId")]
    pub route_id: Option<String>,
    #[serde(default, alias = "directionId")]
    pub direction_id: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripUpdate {
    #[serde(default)]
    pub trip: TripDescriptor,
    #[serde(default, alias = "stopTimeUpdate")]
    pub stop_time_update: Vec<StopTimeUpdate>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopTimeUpdate {
    #[serde(default, alias = "stopId")]
    pub stop_id: Option<String>,
    #[serde(default)]
    pub arrival: Option<StopTimeEvent>,
    #[serde(default)]
    pub departure: Option<StopTimeEvent>,
}

impl StopTimeUpdate {
    /// Absolute POSIX departure time, falling back to arrival.
    pub fn departure_time(&self) -> Option<i64> {
        self.departure
            .as_ref()
            .and_then(|e| e.time)
            .or_else(|| self.arrival.as_ref().and_then(|e| e.time))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopTimeEvent {
    /// POSIX seconds
    #[serde(default, deserialize_with = "flexible_i64")]
    pub time: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VehiclePosition {
    #[serde(default)]
    pub trip: Option<TripDescriptor>,
    #[serde(default)]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// proto3 JSON writes int64 as a string; plain JSON feeds use numbers.
fn flexible_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Repr {
        Number(i64),
        Text(String),
    }

    match Option::<Repr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Repr::Number(n)) => Ok(Some(n)),
        Some(Repr::Text(s)) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}
