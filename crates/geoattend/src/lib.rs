//! `geoattend` - Geofenced attendance tracking
//!
//! This library provides the client side of a geofenced attendance flow: it
//! acquires the device position, asks the attendance service whether that
//! position lies inside the project boundary, submits the day's four
//! checkpoints in order, and reports the last known position in the
//! background while a tracking session is open.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod backend;
pub mod cli;
pub mod config;
pub mod cycle;
pub mod error;
pub mod geofence;
pub mod location;
pub mod logger;
pub mod logging;
pub mod position;
pub mod session;
pub mod submit;

#[cfg(test)]
mod testing;

pub use backend::{AttendanceBackend, HttpBackend};
pub use config::Config;
pub use cycle::{Checkpoint, SessionCycleTracker};
pub use error::{Error, Result};
pub use geofence::{GeofenceStatus, GeofenceValidator};
pub use location::{LocationProvider, StaticLocationProvider};
pub use logger::{LoggerHandle, LoggerStats, PeriodicLocationLogger};
pub use logging::init_logging;
pub use position::{EmployeeId, Position, ProjectId};
pub use session::{SessionSettings, TrackingSession};
pub use submit::{AttendanceSession, AttendanceSubmitter};
