//! Invocation driver.
//!
//! Ticks on a fixed cadence, runs one refresh cycle per tick and keeps the
//! latest successful result for downstream readers. A cycle always finishes
//! before the next one starts.

mod cache;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::config::{ConfigError, OptionsSource};
use crate::domain::RefreshResult;
use crate::realtime::FeedClient;
use crate::refresh::{Clock, RefreshController, RefreshError};
use crate::schedule::{DepartureCalculator, ScheduleProvider};

pub use cache::{LatestResult, ResultCache};

/// Errors that make a cycle fail. The cached result is kept.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The options could not be read
    #[error("failed to read options: {0}")]
    Options(#[from] ConfigError),

    /// The refresh itself failed
    #[error(transparent)]
    Refresh(#[from] RefreshError),

    /// The cycle ran past its time limit
    #[error("refresh cycle timed out after {0:?}")]
    Timeout(Duration),
}

/// Configuration for the driver loop.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Time between cycle starts.
    pub cadence: Duration,

    /// Longest a single cycle may take; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl DriverConfig {
    /// Set the cadence.
    pub fn with_cadence(mut self, cadence: Duration) -> Self {
        self.cadence = cadence;
        self
    }

    /// Set the per-cycle time limit.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            cadence: Duration::from_secs(60),
            timeout: None,
        }
    }
}

/// Runs refresh cycles and owns the result cache.
pub struct Driver<P, C, F, K, O> {
    controller: RefreshController<P, C, F, K>,
    options: O,
    cache: ResultCache,
    config: DriverConfig,
}

impl<P, C, F, K, O> Driver<P, C, F, K, O>
where
    P: ScheduleProvider + Send + Sync + 'static,
    P::Schedule: Send + Sync + 'static,
    C: DepartureCalculator<P::Schedule> + Send + Sync + 'static,
    F: FeedClient,
    K: Clock,
    O: OptionsSource,
{
    /// Create a driver with an empty result cache.
    pub fn new(controller: RefreshController<P, C, F, K>, options: O, config: DriverConfig) -> Self {
        Self {
            controller,
            options,
            cache: ResultCache::new(),
            config,
        }
    }

    /// A reader handle on the latest result.
    pub fn latest(&self) -> LatestResult {
        self.cache.subscribe()
    }

    /// Run one cycle and store its result on success.
    pub async fn tick(&self) -> Result<Arc<RefreshResult>, DriverError> {
        let options = self.options.current().await?;
        let previous = self.cache.get();
        let cycle = self.controller.refresh(previous.as_deref(), &options);

        let result = match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, cycle)
                .await
                .map_err(|_| DriverError::Timeout(limit))??,
            None => cycle.await?,
        };

        Ok(self.cache.store(result))
    }

    /// Tick until `shutdown` resolves.
    ///
    /// A slow cycle delays the following ticks rather than overlapping them.
    pub async fn run(&self, shutdown: impl Future<Output = ()>) {
        let mut interval = tokio::time::interval(self.config.cadence);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tokio::pin!(shutdown);

        info!(
            trip = %self.controller.trip().name,
            cadence = ?self.config.cadence,
            "starting refresh driver"
        );

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = interval.tick() => {}
            }

            match self.tick().await {
                Ok(result) => info!(
                    route_id = %result.departure.route_id,
                    departure_time = %result.departure.departure_time,
                    realtime = result.departure.realtime.is_some(),
                    "refresh cycle complete"
                ),
                Err(e) => warn!(error = %e, "refresh cycle failed; keeping previous result"),
            }
        }

        info!("refresh driver stopped");
    }
}
