//! Refresh options, re-read on every cycle.

use std::future::Future;
use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::Deserialize;

use super::error::ConfigError;

/// Freshness window used when none is configured (15 minutes).
pub const DEFAULT_REFRESH_INTERVAL_MINUTES: i64 = 15;

/// An HTTP header carrying a feed credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeader {
    /// Header name
    pub name: &'static str,
    /// Header value
    pub value: String,
}

/// Externally supplied options controlling refresh behaviour.
///
/// These may change between cycles, so callers read a fresh copy each time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RefreshOptions {
    /// Freshness window for the static departure, in minutes
    pub refresh_interval: Option<i64>,

    /// Whether to overlay real-time data; absent means not selected
    pub real_time: Option<bool>,

    /// GTFS-RT trip updates feed
    pub trip_update_url: Option<String>,

    /// GTFS-RT vehicle positions feed
    pub vehicle_position_url: Option<String>,

    /// Credential sent as `Authorization`
    pub api_key: Option<String>,

    /// Credential sent as `x-api-key`
    pub x_api_key: Option<String>,
}

impl RefreshOptions {
    /// The freshness window, falling back to the default.
    pub fn freshness_window(&self) -> Duration {
        let minutes = self
            .refresh_interval
            .unwrap_or(DEFAULT_REFRESH_INTERVAL_MINUTES);
        Duration::try_minutes(minutes).unwrap_or(Duration::MAX)
    }

    /// Whether real-time overlay is switched on.
    pub fn real_time_enabled(&self) -> bool {
        self.real_time.unwrap_or(false)
    }

    /// Select the credential header to send to the feed.
    ///
    /// `api_key` wins over `x_api_key`; with neither, no header is sent.
    pub fn auth_header(&self) -> Option<AuthHeader> {
        if let Some(key) = &self.api_key {
            return Some(AuthHeader {
                name: "Authorization",
                value: key.clone(),
            });
        }

        self.x_api_key.as_ref().map(|key| AuthHeader {
            name: "x-api-key",
            value: key.clone(),
        })
    }

    /// Set the freshness window in minutes.
    pub fn with_refresh_interval(mut self, minutes: i64) -> Self {
        self.refresh_interval = Some(minutes);
        self
    }

    /// Enable or disable the real-time overlay.
    pub fn with_real_time(mut self, enabled: bool) -> Self {
        self.real_time = Some(enabled);
        self
    }

    /// Set both feed URLs.
    pub fn with_feed_urls(
        mut self,
        trip_update_url: impl Into<String>,
        vehicle_position_url: impl Into<String>,
    ) -> Self {
        self.trip_update_url = Some(trip_update_url.into());
        self.vehicle_position_url = Some(vehicle_position_url.into());
        self
    }
}

/// Somewhere the current options can be read from.
pub trait OptionsSource {
    /// Read the options as they are now.
    fn current(&self) -> impl Future<Output = Result<RefreshOptions, ConfigError>> + Send;
}

/// Options that never change.
#[derive(Debug, Clone, Default)]
pub struct StaticOptions(pub RefreshOptions);

impl OptionsSource for StaticOptions {
    async fn current(&self) -> Result<RefreshOptions, ConfigError> {
        Ok(self.0.clone())
    }
}

/// Options stored as JSON on disk, re-read on every call.
#[derive(Debug, Clone)]
pub struct OptionsFile {
    path: PathBuf,
}

impl OptionsFile {
    /// Create a source reading from the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the options file path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OptionsSource for OptionsFile {
    async fn current(&self) -> Result<RefreshOptions, ConfigError> {
        let contents = match tokio::fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(RefreshOptions::default());
            }
            Err(e) => {
                return Err(ConfigError::Options {
                    message: format!("failed to read {}: {e}", self.path.display()),
                });
            }
        };

        serde_json::from_str(&contents).map_err(|e| ConfigError::Options {
            message: format!("failed to parse {}: {e}", self.path.display()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults() {
        let options = RefreshOptions::default();
        assert_eq!(
            options.freshness_window(),
            Duration::minutes(DEFAULT_REFRESH_INTERVAL_MINUTES)
        );
        assert!(!options.real_time_enabled());
        assert_eq!(options.auth_header(), None);
    }

    #[test]
    fn configured_window() {
        let options = RefreshOptions::default().with_refresh_interval(10);
        assert_eq!(options.freshness_window(), Duration::minutes(10));

        let options = RefreshOptions::default().with_refresh_interval(i64::MAX);
        assert_eq!(options.freshness_window(), Duration::MAX);
    }

    #[test]
    fn primary_key_wins_over_secondary() {
        let options = RefreshOptions {
            api_key: Some("primary".into()),
            x_api_key: Some("secondary".into()),
            ..Default::default()
        };

        let header = options.auth_header().unwrap();
        assert_eq!(header.name, "Authorization");
        assert_eq!(header.value, "primary");
    }

    #[test]
    fn secondary_key_used_alone() {
        let options = RefreshOptions {
            x_api_key: Some("secondary".into()),
            ..Default::default()
        };

        let header = options.auth_header().unwrap();
        assert_eq!(header.name, "x-api-key");
        assert_eq!(header.value, "secondary");
    }

    #[test]
    fn deserialize_partial_json() {
        let options: RefreshOptions =
            serde_json::from_str(r#"{"real_time": true, "refresh_interval": 5}"#).unwrap();
        assert!(options.real_time_enabled());
        assert_eq!(options.freshness_window(), Duration::minutes(5));
        assert_eq!(options.trip_update_url, None);
    }

    #[tokio::test]
    async fn static_options_returned_unchanged() {
        let options = RefreshOptions::default().with_real_time(true);
        let source = StaticOptions(options.clone());
        assert_eq!(source.current().await.unwrap(), options);
    }

    #[tokio::test]
    async fn options_file_reread_each_call() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("options.json");
        let source = OptionsFile::new(&path);
        assert_eq!(source.path(), path);

        std::fs::write(&path, r#"{"real_time": false}"#).unwrap();
        assert!(!source.current().await.unwrap().real_time_enabled());

        std::fs::write(&path, r#"{"real_time": true}"#).unwrap();
        assert!(source.current().await.unwrap().real_time_enabled());
    }

    #[tokio::test]
    async fn missing_options_file_gives_defaults() {
        let source = OptionsFile::new("/nonexistent/path/options.json");
        assert_eq!(source.current().await.unwrap(), RefreshOptions::default());
    }

    #[tokio::test]
    async fn malformed_options_file_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = OptionsFile::new(&path).current().await.unwrap_err();
        assert!(matches!(err, ConfigError::Options { .. }));
    }
}
