//! HTTP client for JSON-encoded GTFS-RT feeds.

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::config::AuthHeader;
use crate::domain::RealTimeEstimate;

use super::error::FeedError;
use super::feed::FeedMessage;
use super::status::RouteStatusSet;
use super::{FeedClient, FeedRequest};

/// Longest body excerpt kept in errors.
const ERROR_BODY_CHARS: usize = 500;

/// Configuration for the feed client.
#[derive(Debug, Clone)]
pub struct FeedClientConfig {
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl FeedClientConfig {
    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl Default for FeedClientConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Fetches trip updates and vehicle positions over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeedClient {
    http: reqwest::Client,
}

impl HttpFeedClient {
    /// Create a new feed client.
    pub fn new(config: FeedClientConfig) -> Result<Self, FeedError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { http })
    }

    /// Fetch and decode one feed.
    async fn fetch(&self, url: &str, auth: Option<&AuthHeader>) -> Result<FeedMessage, FeedError> {
        let mut request = self.http.get(url);
        if let Some(auth) = auth {
            request = request.header(auth.name, &auth.value);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FeedError::Unauthorized);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FeedError::Api {
                status: status.as_u16(),
                message: excerpt(&body),
            });
        }

        let body = response.text().await?;
        debug!(url, bytes = body.len(), "fetched feed");

        decode(&body)
    }
}

/// Decode a feed body, keeping an excerpt of it on failure.
fn decode(body: &str) -> Result<FeedMessage, FeedError> {
    FeedMessage::from_json(body).map_err(|e| FeedError::Decode {
        message: format!("{e} (body: {})", excerpt(body)),
    })
}

fn excerpt(body: &str) -> String {
    body.chars().take(ERROR_BODY_CHARS).collect()
}

impl FeedClient for HttpFeedClient {
    async fn route_statuses(&self, request: &FeedRequest) -> Result<RouteStatusSet, FeedError> {
        let auth = request.auth.as_ref();
        let trip_updates = self.fetch(&request.trip_update_url, auth).await?;
        let vehicle_positions = self.fetch(&request.vehicle_position_url, auth).await?;

        Ok(RouteStatusSet::from_feeds(
            &trip_updates,
            &vehicle_positions,
            &request.route_id,
            &request.route_delimiter,
            request.direction,
        ))
    }

    async fn next_service(
        &self,
        request: &FeedRequest,
        statuses: &RouteStatusSet,
        now: DateTime<Utc>,
    ) -> Result<RealTimeEstimate, FeedError> {
        Ok(statuses.next_service(&request.stop_id, now))
    }
}
