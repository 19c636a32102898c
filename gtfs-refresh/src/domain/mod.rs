//! Data model for refresh results.
//!
//! A `RefreshResult` wraps one `StaticDeparture`, which may carry a
//! `RealTimeOverlay`. Overlays are attached whole or not at all.

mod departure;
mod result;

pub use departure::{RealTimeEstimate, RealTimeOverlay, RouteStatus, StaticDeparture};
pub use result::RefreshResult;
