//! Staleness decision for the cached static departure.

use chrono::{DateTime, Duration, Utc};

use crate::domain::{RefreshResult, StaticDeparture};
use crate::schedule::ComputationError;

/// Lookahead applied when checking expiry.
///
/// A tick landing a few milliseconds before expiry would otherwise defer
/// recomputation by a whole cycle.
pub const EXPIRY_LOOKAHEAD: Duration = Duration::seconds(1);

/// Whether this cycle may reuse the cached departure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StaticDecision<'a> {
    /// The cached departure is still within its freshness window
    Reuse(&'a StaticDeparture),
    /// There is no cached departure, or it has expired
    Recompute,
}

impl<'a> StaticDecision<'a> {
    /// Decide from the previous result, the freshness window and `now`.
    ///
    /// Reuse only when `computed_at + window > now + 1s`.
    pub fn evaluate(
        previous: Option<&'a RefreshResult>,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Self {
        let Some(prev) = previous else {
            return StaticDecision::Recompute;
        };

        // An expiry past the representable range never arrives
        let fresh = prev
            .departure
            .computed_at
            .checked_add_signed(window)
            .is_none_or(|expiry| expiry > now + EXPIRY_LOOKAHEAD);

        if fresh {
            StaticDecision::Reuse(&prev.departure)
        } else {
            StaticDecision::Recompute
        }
    }
}

/// What happened to the static departure this cycle.
#[derive(Debug)]
pub enum StaticOutcome {
    /// The cached departure was still fresh
    Reused(StaticDeparture),
    /// A new departure was computed
    Recomputed(StaticDeparture),
    /// Recomputation was due and failed
    Failed(ComputationError),
}
