//! Refresh error types.

use crate::config::ConfigError;
use crate::realtime::FeedError;
use crate::schedule::ComputationError;

/// A refresh cycle that produced no result.
///
/// Only static recomputation can fail a cycle; real-time problems are
/// reported as `OverlayError` and never escape it.
#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// Recomputing the static departure failed
    #[error("static departure unavailable: {0}")]
    Computation(#[from] ComputationError),
}

/// Why a cycle has no real-time overlay.
#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    /// Real-time is enabled but not fully configured
    #[error("real-time misconfigured: {0}")]
    Config(#[from] ConfigError),

    /// The feed call failed
    #[error("real-time feed failed: {0}")]
    Feed(#[from] FeedError),
}
