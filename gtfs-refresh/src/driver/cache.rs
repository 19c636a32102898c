//! Single-slot store for the latest refresh result.

use std::sync::Arc;

use tokio::sync::watch;

use crate::domain::RefreshResult;

/// Holds the most recent successful result.
///
/// Only the driver writes, and only whole results, so readers always see
/// either nothing yet or a complete result.
#[derive(Debug)]
pub struct ResultCache {
    tx: watch::Sender<Option<Arc<RefreshResult>>>,
}

/// Read-only handle on a `ResultCache`.
#[derive(Debug, Clone)]
pub struct LatestResult {
    rx: watch::Receiver<Option<Arc<RefreshResult>>>,
}

impl ResultCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// The current result, if any cycle has succeeded.
    pub fn get(&self) -> Option<Arc<RefreshResult>> {
        self.tx.borrow().clone()
    }

    /// Replace the current result, returning the stored snapshot.
    pub fn store(&self, result: RefreshResult) -> Arc<RefreshResult> {
        let result = Arc::new(result);
        self.tx.send_replace(Some(Arc::clone(&result)));
        result
    }

    /// A reader handle for downstream consumers.
    pub fn subscribe(&self) -> LatestResult {
        LatestResult {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl LatestResult {
    /// The current result, if any cycle has succeeded.
    pub fn get(&self) -> Option<Arc<RefreshResult>> {
        self.rx.borrow().clone()
    }

    /// Wait until the next result is stored.
    ///
    /// Returns `None` once the cache has been dropped.
    pub async fn changed(&mut self) -> Option<Arc<RefreshResult>> {
        self.rx.changed().await.ok()?;
        self.rx.borrow_and_update().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StopRef, TripConfig};
    use crate::domain::StaticDeparture;
    use chrono::{TimeZone, Utc};

    fn result(route: &str) -> RefreshResult {
        let at = Utc.with_ymd_and_hms(2024, 3, 15, 8, 0, 0).unwrap();
        let trip = TripConfig::new(
            "Commute",
            StopRef::parse("A").unwrap(),
            StopRef::parse("B").unwrap(),
            "metro",
        );
        RefreshResult::new(
            &trip,
            StaticDeparture {
                route_id: route.into(),
                trip_id: "T1".into(),
                origin_stop_id: "A".into(),
                origin_stop_name: "A".into(),
                destination_stop_id: "B".into(),
                destination_stop_name: "B".into(),
                departure_time: at,
                arrival_time: at,
                is_tomorrow: false,
                computed_at: at,
                realtime: None,
            },
        )
    }

    #[test]
    fn empty_until_stored() {
        let cache = ResultCache::new();
        let reader = cache.subscribe();
        assert!(cache.get().is_none());
        assert!(reader.get().is_none());

        cache.store(result("10"));
        assert_eq!(cache.get().unwrap().departure.route_id, "10");
        assert_eq!(reader.get().unwrap().departure.route_id, "10");
    }

    #[test]
    fn store_replaces_whole_result() {
        let cache = ResultCache::new();
        let reader = cache.subscribe();

        cache.store(result("10"));
        let first = reader.get().unwrap();
        cache.store(result("20"));

        // Earlier snapshots are unaffected
        assert_eq!(first.departure.route_id, "10");
        assert_eq!(reader.get().unwrap().departure.route_id, "20");
    }

    #[tokio::test]
    async fn reader_notified_of_changes() {
        let cache = ResultCache::new();
        let mut reader = cache.subscribe();

        cache.store(result("10"));
        let seen = reader.changed().await.unwrap();
        assert_eq!(seen.departure.route_id, "10");

        drop(cache);
        assert!(reader.changed().await.is_none());
    }
}
