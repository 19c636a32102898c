//! Application state for the web layer.

use crate::driver::LatestResult;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Reader on the driver's result cache
    pub latest: LatestResult,
}

impl AppState {
    /// Create a new app state.
    pub fn new(latest: LatestResult) -> Self {
        Self { latest }
    }
}
