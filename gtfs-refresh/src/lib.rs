//! Transit departure refresher.
//!
//! Keeps the next departure for one origin/destination pair up to date by
//! combining a static GTFS timetable with an optional real-time feed.

pub mod config;
pub mod domain;
pub mod driver;
pub mod realtime;
pub mod refresh;
pub mod schedule;
pub mod web;
