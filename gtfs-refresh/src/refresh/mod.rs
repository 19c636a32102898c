//! Refresh controller.
//!
//! Decides on every tick whether the cached static departure is still fresh
//! or must be recomputed, then layers real-time data on top when enabled.
//!
//! Static recomputation is expensive and changes rarely, so it is bounded
//! by the configured freshness window. The real-time feed is cheap and
//! volatile, so it is polled on every tick regardless. A failed
//! recomputation fails the cycle; a failed overlay only drops the overlay.

mod clock;
mod decision;
mod error;


use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::config::{RefreshOptions, TripConfig};
use crate::domain::{RealTimeOverlay, RefreshResult, StaticDeparture};
use crate::realtime::{FeedClient, FeedRequest};
use crate::schedule::{ComputationError, DepartureCalculator, DepartureQuery, ScheduleProvider};

pub use clock::{Clock, SystemClock};
pub use decision::{EXPIRY_LOOKAHEAD, StaticDecision, StaticOutcome};
pub use error::{OverlayError, RefreshError};

/// Default number of concurrent blocking schedule jobs.
const DEFAULT_WORKERS: usize = 2;

/// Coordinates static and real-time data for one trip.
///
/// Collaborator calls run one after another within a cycle. Blocking
/// schedule work is sent to tokio's blocking pool, bounded by a semaphore.
pub struct RefreshController<P, C, F, K = SystemClock> {
    trip: TripConfig,
    provider: Arc<P>,
    calculator: Arc<C>,
    feed: F,
    clock: K,
    workers: Arc<Semaphore>,
}

impl<P, C, F, K> RefreshController<P, C, F, K>
where
    P: ScheduleProvider + Send + Sync + 'static,
    P::Schedule: Send + Sync + 'static,
    C: DepartureCalculator<P::Schedule> + Send + Sync + 'static,
    F: FeedClient,
    K: Clock,
{
    /// Create a controller for `trip`.
    pub fn new(trip: TripConfig, provider: P, calculator: C, feed: F, clock: K) -> Self {
        Self {
            trip,
            provider: Arc::new(provider),
            calculator: Arc::new(calculator),
            feed,
            clock,
            workers: Arc::new(Semaphore::new(DEFAULT_WORKERS)),
        }
    }

    /// Set the number of concurrent blocking schedule jobs.
    pub fn with_workers(mut self, n: usize) -> Self {
        self.workers = Arc::new(Semaphore::new(n.max(1)));
        self
    }

    /// The trip this controller serves.
    pub fn trip(&self) -> &TripConfig {
        &self.trip
    }

    /// Run one refresh cycle.
    ///
    /// `previous` is the last successful result, if any. On `Err` the
    /// caller keeps `previous` as it was.
    pub async fn refresh(
        &self,
        previous: Option<&RefreshResult>,
        options: &RefreshOptions,
    ) -> Result<RefreshResult, RefreshError> {
        let schedule = self.load_schedule().await;
        let now = self.clock.now();

        let outcome =
            match StaticDecision::evaluate(previous, options.freshness_window(), now) {
                StaticDecision::Reuse(departure) => {
                    if let Err(e) = &schedule {
                        warn!(error = %e, "schedule reload failed; reusing cached departure");
                    }
                    StaticOutcome::Reused(departure.clone())
                }
                StaticDecision::Recompute => match schedule {
                    Ok(schedule) => match self.recompute(schedule, now).await {
                        Ok(departure) => StaticOutcome::Recomputed(departure),
                        Err(e) => StaticOutcome::Failed(e),
                    },
                    Err(e) => StaticOutcome::Failed(e),
                },
            };

        let departure = match outcome {
            StaticOutcome::Reused(departure) => {
                debug!(computed_at = %departure.computed_at, "static departure still fresh");
                departure
            }
            StaticOutcome::Recomputed(departure) => {
                debug!(
                    route_id = %departure.route_id,
                    departure_time = %departure.departure_time,
                    "computed static departure"
                );
                departure
            }
            StaticOutcome::Failed(e) => {
                error!(trip = %self.trip.name, error = %e, "error getting static departure");
                return Err(e.into());
            }
        };

        let departure = self.overlay(departure.without_overlay(), options).await;
        Ok(RefreshResult::new(&self.trip, departure))
    }

    /// Attach a fresh overlay when real-time is enabled.
    async fn overlay(&self, departure: StaticDeparture, options: &RefreshOptions) -> StaticDeparture {
        if !options.real_time_enabled() {
            if options.real_time.is_none() {
                debug!("real-time not selected in options");
            } else {
                info!("real-time disabled in options");
            }
            return departure;
        }

        match self.fetch_overlay(&departure, options).await {
            Ok(overlay) => departure.with_overlay(overlay),
            Err(e) => {
                error!(route_id = %departure.route_id, error = %e, "error getting real-time data");
                departure
            }
        }
    }

    async fn fetch_overlay(
        &self,
        departure: &StaticDeparture,
        options: &RefreshOptions,
    ) -> Result<RealTimeOverlay, OverlayError> {
        let request = FeedRequest::new(&self.trip, options, &departure.route_id)?;

        let statuses = self.feed.route_statuses(&request).await?;
        let estimate = self
            .feed
            .next_service(&request, &statuses, self.clock.now())
            .await?;

        Ok(RealTimeOverlay {
            route_status: statuses.status(),
            estimate,
            computed_at: self.clock.now().max(departure.computed_at),
        })
    }

    /// Get a schedule handle from the provider.
    async fn load_schedule(&self) -> Result<Arc<P::Schedule>, ComputationError> {
        let provider = Arc::clone(&self.provider);
        let dir = self.trip.schedule_dir.clone();
        let source = self.trip.schedule_source.clone();

        self.run_blocking(move || provider.load(&dir, &source, false))
            .await
    }

    /// Compute a new static departure as of `now`.
    async fn recompute(
        &self,
        schedule: Arc<P::Schedule>,
        now: DateTime<Utc>,
    ) -> Result<StaticDeparture, ComputationError> {
        let provider = Arc::clone(&self.provider);
        let calculator = Arc::clone(&self.calculator);
        let query = DepartureQuery {
            origin: self.trip.origin.id().to_string(),
            destination: self.trip.destination.id().to_string(),
            offset_minutes: self.trip.offset_minutes,
            include_tomorrow: self.trip.include_tomorrow,
            now,
        };

        self.run_blocking(move || {
            provider.check_index(&schedule)?;
            calculator.compute(&schedule, &query)
        })
        .await
    }

    async fn run_blocking<T, G>(&self, job: G) -> Result<T, ComputationError>
    where
        G: FnOnce() -> Result<T, ComputationError> + Send + 'static,
        T: Send + 'static,
    {
        // The permit moves into the job so it is held until the job ends,
        // even if this future is dropped first.
        let permit = Arc::clone(&self.workers)
            .acquire_owned()
            .await
            .map_err(|_| ComputationError::Executor("worker pool closed".to_string()))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| ComputationError::Executor(e.to_string()))?
    }
}
