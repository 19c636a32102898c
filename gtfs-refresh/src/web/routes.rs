//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tracing::warn;

use crate::domain::RefreshResult;

use super::dto::ErrorResponse;
use super::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/departure", get(departure))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// The latest successful refresh result.
async fn departure(State(state): State<AppState>) -> Result<Json<RefreshResult>, AppError> {
    state
        .latest
        .get()
        .map(|result| Json(RefreshResult::clone(&result)))
        .ok_or_else(|| AppError::Unavailable {
            message: "no departure computed yet".to_string(),
        })
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    Unavailable { message: String },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Unavailable { message } => (StatusCode::SERVICE_UNAVAILABLE, message),
        };

        warn!(%status, %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StopRef, TripConfig};
    use crate::domain::StaticDeparture;
    use crate::driver::ResultCache;
    use chrono::{TimeZone, Utc};

    fn sample() -> RefreshResult {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap();
        let trip = TripConfig::new(
            "Commute",
            StopRef::parse("A: Alpha").unwrap(),
            StopRef::parse("B: Beta").unwrap(),
            "metro",
        );
        RefreshResult::new(
            &trip,
            StaticDeparture {
                route_id: "10".into(),
                trip_id: "T1".into(),
                origin_stop_id: "A".into(),
                origin_stop_name: "Alpha".into(),
                destination_stop_id: "B".into(),
                destination_stop_name: "Beta".into(),
                departure_time: at,
                arrival_time: at,
                is_tomorrow: false,
                computed_at: at,
                realtime: None,
            },
        )
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_ok() {
        assert_eq!(health().await, "ok");
    }

    #[tokio::test]
    async fn departure_unavailable_before_first_result() {
        let cache = ResultCache::new();
        let state = AppState::new(cache.subscribe());

        let response = departure(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body = body_json(response).await;
        assert_eq!(body["error"], "no departure computed yet");
    }

    #[tokio::test]
    async fn departure_serves_latest_result() {
        let cache = ResultCache::new();
        let state = AppState::new(cache.subscribe());
        cache.store(sample());

        let response = departure(State(state)).await.into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["name"], "Commute");
        assert_eq!(body["departure"]["route_id"], "10");
        assert_eq!(body["departure"]["trip_id"], "T1");
        assert!(body["departure"]["realtime"].is_null());
    }
}
