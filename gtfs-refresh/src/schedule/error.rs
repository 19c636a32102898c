//! Static schedule error types.

use std::path::PathBuf;

/// Errors from loading a timetable or computing a departure from it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ComputationError {
    /// The timetable could not be read or parsed
    #[error("failed to load schedule {}: {message}", path.display())]
    Load { path: PathBuf, message: String },

    /// The stop index could not be built
    #[error("schedule index error: {0}")]
    Index(String),

    /// No upcoming departure exists in the search window
    #[error("no departure from {origin} to {destination} in the schedule window")]
    NoDeparture { origin: String, destination: String },

    /// The blocking worker failed before producing a result
    #[error("schedule worker failed: {0}")]
    Executor(String),
}
