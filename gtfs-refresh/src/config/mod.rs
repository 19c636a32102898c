//! Trip configuration and refresh options.
//!
//! `TripConfig` is fixed for the lifetime of a coordinator. `RefreshOptions`
//! are supplied from outside and read again on every refresh cycle.

mod error;
mod options;
mod trip;

pub use error::ConfigError;
pub use options::{
    AuthHeader, DEFAULT_REFRESH_INTERVAL_MINUTES, OptionsFile, OptionsSource, RefreshOptions,
    StaticOptions,
};
pub use trip::{DEFAULT_SCHEDULE_DIR, StopRef, TripConfig};
