//! Route status and next-service estimation from decoded feeds.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::domain::{RealTimeEstimate, RouteStatus};

use super::feed::{FeedMessage, TripDescriptor};

/// A predicted departure of one trip from one stop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredictedDeparture {
    pub trip_id: String,
    pub time: DateTime<Utc>,
}

/// Last reported position of a vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleLocation {
    pub latitude: f64,
    pub longitude: f64,
}

/// What the feed currently says about one route in one direction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteStatusSet {
    /// Stop id → predicted departures, earliest first
    pub stops: HashMap<String, Vec<PredictedDeparture>>,
    /// Trip id → vehicle location
    pub vehicles: HashMap<String, VehicleLocation>,
    /// Number of trip updates reported for the route
    pub trip_updates: usize,
}

/// The part of a route id before `delimiter`, or the whole id.
///
/// Feeds often suffix route ids (`"10-x"`); matching on the base keeps
/// them comparable with timetable route ids.
pub fn route_base<'a>(route_id: &'a str, delimiter: &str) -> &'a str {
    if delimiter.is_empty() {
        return route_id;
    }
    route_id.split(delimiter).next().unwrap_or(route_id)
}

/// Which trips a status set should collect.
struct RouteFilter<'a> {
    route_base: &'a str,
    delimiter: &'a str,
    direction: u8,
}

impl RouteFilter<'_> {
    fn matches(&self, trip: &TripDescriptor) -> bool {
        let Some(route_id) = &trip.route_id else {
            return false;
        };
        route_base(route_id, self.delimiter) == self.route_base
            && trip.direction_id.is_none_or(|d| d == self.direction)
    }
}

impl RouteStatusSet {
    /// Collect everything the feeds report for a route and direction.
    ///
    /// Feed trips without a direction are assumed to match.
    pub fn from_feeds(
        trip_updates: &FeedMessage,
        vehicle_positions: &FeedMessage,
        route_id: &str,
        delimiter: &str,
        direction: u8,
    ) -> Self {
        let filter = RouteFilter {
            route_base: route_base(route_id, delimiter),
            delimiter,
            direction,
        };

        let mut stops: HashMap<String, Vec<PredictedDeparture>> = HashMap::new();
        let mut matched = 0;
        for update in trip_updates
            .entity
            .iter()
            .filter_map(|e| e.trip_update.as_ref())
            .filter(|u| filter.matches(&u.trip))
        {
            matched += 1;
            let trip_id = update.trip.trip_id.clone().unwrap_or_default();
            for stu in &update.stop_time_update {
                let (Some(stop_id), Some(time)) = (
                    &stu.stop_id,
                    stu.departure_time()
                        .and_then(|t| DateTime::from_timestamp(t, 0)),
                ) else {
                    continue;
                };
                stops
                    .entry(stop_id.clone())
                    .or_default()
                    .push(PredictedDeparture {
                        trip_id: trip_id.clone(),
                        time,
                    });
            }
        }
        for departures in stops.values_mut() {
            departures.sort_by_key(|d| d.time);
        }

        let vehicles = vehicle_positions
            .entity
            .iter()
            .filter_map(|e| e.vehicle.as_ref())
            .filter_map(|v| {
                let trip = v.trip.as_ref().filter(|t| filter.matches(t))?;
                let position = v.position?;
                Some((
                    trip.trip_id.clone()?,
                    VehicleLocation {
                        latitude: position.latitude,
                        longitude: position.longitude,
                    },
                ))
            })
            .collect();

        Self {
            stops,
            vehicles,
            trip_updates: matched,
        }
    }

    /// `Running` when the feed has any trip update for the route, timed or not.
    pub fn status(&self) -> RouteStatus {
        if self.trip_updates > 0 {
            RouteStatus::Running
        } else {
            RouteStatus::NoData
        }
    }

    /// The next two predicted departures from `stop_id` at or after `now`.
    pub fn next_service(&self, stop_id: &str, now: DateTime<Utc>) -> RealTimeEstimate {
        let mut upcoming = self
            .stops
            .get(stop_id)
            .into_iter()
            .flatten()
            .filter(|d| d.time >= now);

        let Some(next) = upcoming.next() else {
            return RealTimeEstimate::default();
        };
        let following = upcoming.next();
        let vehicle = self.vehicles.get(&next.trip_id);

        RealTimeEstimate {
            next_departure: Some(next.time),
            due_in_minutes: Some((next.time - now).num_minutes()),
            following_departure: following.map(|d| d.time),
            latitude: vehicle.map(|v| v.latitude),
            longitude: vehicle.map(|v| v.longitude),
        }
    }
}
