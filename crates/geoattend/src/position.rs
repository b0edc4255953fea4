//! Core location types for geoattend.
//!
//! This module defines the captured [`Position`], the employee and project
//! identifiers, and the shared "last known position" cell that the
//! acquisition path writes and the submitter and background logger read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::error::{Error, Result};

/// Identifier of an employee as known by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub u64);

/// Identifier of a project (and its geofence) as known by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub u64);

impl std::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A geographic position captured at a point in time.
///
/// Positions are immutable. A newer acquisition produces a new value and
/// supersedes the old one; two positions compare equal only when both the
/// coordinates and the capture time match.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Latitude in decimal degrees.
    pub latitude: f64,

    /// Longitude in decimal degrees.
    pub longitude: f64,

    /// When this position was captured.
    pub captured_at: DateTime<Utc>,
}

impl Position {
    /// Create a position captured now.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinates`] if either coordinate is not finite
    /// or lies outside its valid range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        Self::at(latitude, longitude, Utc::now())
    }

    /// Create a position with an explicit capture time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCoordinates`] if either coordinate is not finite
    /// or lies outside its valid range.
    pub fn at(latitude: f64, longitude: f64, captured_at: DateTime<Utc>) -> Result<Self> {
        if !coordinates_valid(latitude, longitude) {
            return Err(Error::InvalidCoordinates {
                latitude,
                longitude,
            });
        }
        Ok(Self {
            latitude,
            longitude,
            captured_at,
        })
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Check that a latitude/longitude pair is finite and in range.
#[must_use]
pub fn coordinates_valid(latitude: f64, longitude: f64) -> bool {
    latitude.is_finite()
        && longitude.is_finite()
        && (-90.0..=90.0).contains(&latitude)
        && (-180.0..=180.0).contains(&longitude)
}

/// The shared "last known position".
///
/// There is exactly one writer (the owner of this value) and any number of
/// readers obtained through [`CurrentPosition::reader`]. Updates replace the
/// whole value, so readers see either the previous or the new position.
#[derive(Debug)]
pub struct CurrentPosition {
    tx: watch::Sender<Option<Position>>,
}

impl CurrentPosition {
    /// Create an empty cell; no position has been acquired yet.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { tx }
    }

    /// Replace the held position with a newer one.
    pub fn publish(&self, position: Position) {
        self.tx.send_replace(Some(position));
    }

    /// Get the held position, if any.
    #[must_use]
    pub fn latest(&self) -> Option<Position> {
        *self.tx.borrow()
    }

    /// Get a read-only view for another task.
    #[must_use]
    pub fn reader(&self) -> PositionReader {
        PositionReader {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for CurrentPosition {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only view of a [`CurrentPosition`].
#[derive(Debug, Clone)]
pub struct PositionReader {
    rx: watch::Receiver<Option<Position>>,
}

impl PositionReader {
    /// Get the most recently published position, if any.
    #[must_use]
    pub fn latest(&self) -> Option<Position> {
        *self.rx.borrow()
    }
}
