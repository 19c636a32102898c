//! JSON timetable provider with handle caching.
//!
//! Parsing a timetable is the expensive part of a static refresh, so
//! handles are cached by path and only reparsed on a forced reload or once
//! the cache entry expires.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache as MokaCache;
use tracing::{debug, info};

use super::ScheduleProvider;
use super::error::ComputationError;
use super::timetable::Timetable;

/// Configuration for the timetable handle cache.
#[derive(Debug, Clone)]
pub struct ScheduleCacheConfig {
    /// How long a parsed timetable stays cached.
    pub ttl: Duration,

    /// Maximum number of cached timetables.
    pub max_capacity: u64,
}

impl Default for ScheduleCacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(24 * 60 * 60),
            max_capacity: 8,
        }
    }
}

/// Loads `<dir>/<source>.json` timetables.
pub struct JsonScheduleProvider {
    timetables: MokaCache<PathBuf, Arc<Timetable>>,
}

impl JsonScheduleProvider {
    /// Create a provider with the given cache configuration.
    pub fn new(config: &ScheduleCacheConfig) -> Self {
        let timetables = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { timetables }
    }

    /// Path of a timetable source inside a directory.
    pub fn source_path(dir: &Path, source: &str) -> PathBuf {
        dir.join(format!("{source}.json"))
    }

    /// Number of cached timetables.
    pub fn cached_count(&self) -> u64 {
        self.timetables.run_pending_tasks();
        self.timetables.entry_count()
    }

    fn read(path: &Path) -> Result<Timetable, ComputationError> {
        let json = std::fs::read_to_string(path).map_err(|e| ComputationError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Timetable::from_json(&json).map_err(|e| ComputationError::Load {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

impl Default for JsonScheduleProvider {
    fn default() -> Self {
        Self::new(&ScheduleCacheConfig::default())
    }
}

impl ScheduleProvider for JsonScheduleProvider {
    type Schedule = Timetable;

    fn load(
        &self,
        dir: &Path,
        source: &str,
        force_reload: bool,
    ) -> Result<Arc<Timetable>, ComputationError> {
        let path = Self::source_path(dir, source);

        if !force_reload && let Some(cached) = self.timetables.get(&path) {
            return Ok(cached);
        }

        let timetable = Arc::new(Self::read(&path)?);
        info!(
            path = %path.display(),
            trips = timetable.trips.len(),
            "loaded timetable"
        );

        self.timetables.insert(path, timetable.clone());
        Ok(timetable)
    }

    fn check_index(&self, schedule: &Timetable) -> Result<(), ComputationError> {
        if schedule.is_indexed() {
            return Ok(());
        }

        let stops = schedule.index().len();
        if stops == 0 && !schedule.trips.is_empty() {
            return Err(ComputationError::Index(
                "timetable has trips but no stop visits".to_string(),
            ));
        }

        debug!(stops, "built timetable stop index");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const ONE_TRIP: &str = r#"{"trips": [{"trip_id": "T1", "route_id": "10", "stop_times": [
        {"stop_id": "A", "departure": "08:00:00"},
        {"stop_id": "B", "arrival": "08:20:00"}
    ]}]}"#;

    const TWO_TRIPS: &str = r#"{"trips": [
        {"trip_id": "T1", "route_id": "10", "stop_times": [{"stop_id": "A", "departure": "08:00:00"}]},
        {"trip_id": "T2", "route_id": "10", "stop_times": [{"stop_id": "A", "departure": "09:00:00"}]}
    ]}"#;

    #[test]
    fn default_config() {
        let config = ScheduleCacheConfig::default();
        assert_eq!(config.ttl, Duration::from_secs(24 * 60 * 60));
        assert_eq!(config.max_capacity, 8);
    }

    #[test]
    fn load_returns_cached_handle() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("metro.json"), ONE_TRIP).unwrap();
        let provider = JsonScheduleProvider::default();

        let first = provider.load(dir.path(), "metro", false).unwrap();

        // Changing the file does not matter while the handle is cached
        std::fs::write(dir.path().join("metro.json"), TWO_TRIPS).unwrap();
        let second = provider.load(dir.path(), "metro", false).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.trips.len(), 1);
        assert_eq!(provider.cached_count(), 1);
    }

    #[test]
    fn force_reload_reparses() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("metro.json"), ONE_TRIP).unwrap();
        let provider = JsonScheduleProvider::default();

        provider.load(dir.path(), "metro", false).unwrap();
        std::fs::write(dir.path().join("metro.json"), TWO_TRIPS).unwrap();

        let reloaded = provider.load(dir.path(), "metro", true).unwrap();
        assert_eq!(reloaded.trips.len(), 2);
    }

    #[test]
    fn missing_file_is_load_error() {
        let dir = tempdir().unwrap();
        let provider = JsonScheduleProvider::default();

        let err = provider.load(dir.path(), "absent", false).unwrap_err();
        assert!(matches!(err, ComputationError::Load { .. }));
    }

    #[test]
    fn malformed_file_is_load_error() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("metro.json"), "{").unwrap();
        let provider = JsonScheduleProvider::default();

        let err = provider.load(dir.path(), "metro", false).unwrap_err();
        assert!(matches!(err, ComputationError::Load { .. }));
    }

    #[test]
    fn check_index_builds_index() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("metro.json"), ONE_TRIP).unwrap();
        let provider = JsonScheduleProvider::default();

        let timetable = provider.load(dir.path(), "metro", false).unwrap();
        assert!(!timetable.is_indexed());

        provider.check_index(&timetable).unwrap();
        assert!(timetable.is_indexed());

        // Second check is a no-op
        provider.check_index(&timetable).unwrap();
    }
}
