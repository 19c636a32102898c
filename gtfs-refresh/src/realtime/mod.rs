//! Real-time feed access.
//!
//! The refresh controller builds one `FeedRequest` per cycle and hands it
//! to a `FeedClient`: first for the route's status, then for the next
//! real-time adjusted service at the origin stop.

mod client;
mod error;
mod feed;
mod status;

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::config::{AuthHeader, ConfigError, RefreshOptions, TripConfig};
use crate::domain::RealTimeEstimate;

pub use client::{FeedClientConfig, HttpFeedClient};
pub use error::FeedError;
pub use feed::{FeedEntity, FeedMessage, StopTimeUpdate, TripDescriptor, TripUpdate};
pub use status::{PredictedDeparture, RouteStatusSet, VehicleLocation, route_base};

/// Delimiter separating a feed route id's base from its suffix.
pub const ROUTE_DELIMITER: &str = "-";

/// Everything a feed client needs for one cycle.
///
/// Built fresh each cycle from the current options and the departure's
/// route, so nothing carries over between cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub trip_update_url: String,
    pub vehicle_position_url: String,
    pub auth: Option<AuthHeader>,
    pub route_id: String,
    pub route_delimiter: String,
    pub stop_id: String,
    pub direction: u8,
}

impl FeedRequest {
    /// Build the request for `route_id` from the trip and current options.
    ///
    /// Both feed URLs must be configured.
    pub fn new(
        trip: &TripConfig,
        options: &RefreshOptions,
        route_id: &str,
    ) -> Result<Self, ConfigError> {
        let trip_update_url = options
            .trip_update_url
            .clone()
            .ok_or(ConfigError::Missing("trip_update_url"))?;
        let vehicle_position_url = options
            .vehicle_position_url
            .clone()
            .ok_or(ConfigError::Missing("vehicle_position_url"))?;

        Ok(Self {
            trip_update_url,
            vehicle_position_url,
            auth: options.auth_header(),
            route_id: route_id.to_string(),
            route_delimiter: ROUTE_DELIMITER.to_string(),
            stop_id: trip.origin.id().to_string(),
            direction: trip.direction,
        })
    }
}

/// Client for a real-time feed.
pub trait FeedClient {
    /// Fetch what the feed reports for the request's route.
    fn route_statuses(
        &self,
        request: &FeedRequest,
    ) -> impl Future<Output = Result<RouteStatusSet, FeedError>> + Send;

    /// Estimate the next service at the request's stop.
    fn next_service(
        &self,
        request: &FeedRequest,
        statuses: &RouteStatusSet,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<RealTimeEstimate, FeedError>> + Send;
}
