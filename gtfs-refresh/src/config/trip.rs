//! Per-instance trip configuration.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use super::error::ConfigError;

/// Default directory holding timetable files.
pub const DEFAULT_SCHEDULE_DIR: &str = "gtfs2";

/// Separator between a stop id and its display name in configured stop strings.
const STOP_SEPARATOR: &str = ": ";

/// A configured stop, written as `"<stop_id>: <display name>"`.
///
/// Only the id is used for lookups; the name is kept for display.
///
/// # Examples
///
/// ```
/// use gtfs_refresh::config::StopRef;
///
/// let stop = StopRef::parse("STOP123: Main St").unwrap();
/// assert_eq!(stop.id(), "STOP123");
/// assert_eq!(stop.name(), Some("Main St"));
///
/// // A bare id is accepted
/// assert_eq!(StopRef::parse("STOP123").unwrap().id(), "STOP123");
///
/// // An empty id is rejected
/// assert!(StopRef::parse(": Main St").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, Serialize)]
pub struct StopRef {
    id: String,
    name: Option<String>,
}

impl StopRef {
    /// Parse a stop from its configured string form.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let (id, name) = match s.split_once(STOP_SEPARATOR) {
            Some((id, name)) => (id.trim(), Some(name.trim())),
            None => (s.trim(), None),
        };

        if id.is_empty() {
            return Err(ConfigError::Invalid {
                field: "stop",
                message: format!("stop id is empty in {s:?}"),
            });
        }

        Ok(Self {
            id: id.to_string(),
            name: name.filter(|n| !n.is_empty()).map(str::to_string),
        })
    }

    /// The stop id used for schedule and feed lookups.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The display name, if one was configured.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Debug for StopRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StopRef({})", self.id)
    }
}

impl fmt::Display for StopRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}{STOP_SEPARATOR}{name}", self.id),
            None => f.write_str(&self.id),
        }
    }
}

/// Immutable configuration for one origin/destination pair.
///
/// Set when the coordinator is built and never changed afterwards.
#[derive(Debug, Clone)]
pub struct TripConfig {
    /// Display name of this trip
    pub name: String,
    /// Boarding stop
    pub origin: StopRef,
    /// Alighting stop
    pub destination: StopRef,
    /// GTFS direction id (0 or 1)
    pub direction: u8,
    /// Minutes to add to the current time before searching
    pub offset_minutes: i64,
    /// Whether to look into the next service day
    pub include_tomorrow: bool,
    /// Directory holding timetable files
    pub schedule_dir: PathBuf,
    /// Timetable file stem inside `schedule_dir`
    pub schedule_source: String,
}

impl TripConfig {
    /// Create a config with no offset, today only, in the default directory.
    pub fn new(
        name: impl Into<String>,
        origin: StopRef,
        destination: StopRef,
        schedule_source: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            origin,
            destination,
            direction: 0,
            offset_minutes: 0,
            include_tomorrow: false,
            schedule_dir: PathBuf::from(DEFAULT_SCHEDULE_DIR),
            schedule_source: schedule_source.into(),
        }
    }

    /// Set the direction id.
    pub fn with_direction(mut self, direction: u8) -> Self {
        self.direction = direction;
        self
    }

    /// Set the search offset in minutes.
    pub fn with_offset(mut self, minutes: i64) -> Self {
        self.offset_minutes = minutes;
        self
    }

    /// Allow departures from the next service day.
    pub fn with_include_tomorrow(mut self, include: bool) -> Self {
        self.include_tomorrow = include;
        self
    }

    /// Set the timetable directory.
    pub fn with_schedule_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schedule_dir = dir.into();
        self
    }

    /// Build a config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from a key lookup using the `GTFS_*` variable names.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let required = |key: &'static str| lookup(key).ok_or(ConfigError::Missing(key));

        let origin = StopRef::parse(&required("GTFS_ORIGIN")?)?;
        let destination = StopRef::parse(&required("GTFS_DESTINATION")?)?;
        let source = required("GTFS_SOURCE")?;
        let name = lookup("GTFS_NAME").unwrap_or_else(|| format!("{origin} to {destination}"));

        let mut config = Self::new(name, origin, destination, source);

        if let Some(direction) = lookup("GTFS_DIRECTION") {
            config.direction = parse_field("GTFS_DIRECTION", &direction)?;
        }
        if let Some(offset) = lookup("GTFS_OFFSET") {
            config.offset_minutes = parse_field("GTFS_OFFSET", &offset)?;
        }
        if let Some(include) = lookup("GTFS_INCLUDE_TOMORROW") {
            config.include_tomorrow = parse_field("GTFS_INCLUDE_TOMORROW", &include)?;
        }
        if let Some(dir) = lookup("GTFS_DIR") {
            config.schedule_dir = PathBuf::from(dir);
        }

        Ok(config)
    }
}

fn parse_field<T>(field: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        field,
        message: e.to_string(),
    })
}
