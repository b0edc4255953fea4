//! Error types for geoattend.
//!
//! Every failure in the attendance flow is a variant of [`Error`]. The
//! variants are grouped by the layer that produces them so callers can decide
//! how to present them: location and validation failures halt the current
//! action, precondition failures never reach the network, and log delivery
//! failures are swallowed by the background logger.

use thiserror::Error;

use crate::cycle::Checkpoint;

/// The main error type for geoattend operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Location Errors ===
    /// The device has no position-acquisition capability.
    #[error("location capability unavailable: {message}")]
    CapabilityUnavailable {
        /// Description of what is missing.
        message: String,
    },

    /// The user or platform refused access to the position.
    #[error("location permission denied: {message}")]
    PermissionDenied {
        /// Description of the refusal.
        message: String,
    },

    /// Position acquisition timed out or lost its signal.
    #[error("unable to retrieve location: {message}")]
    AcquisitionFailed {
        /// Description of what went wrong.
        message: String,
    },

    /// Coordinates were outside the valid latitude/longitude ranges.
    #[error("invalid coordinates ({latitude}, {longitude})")]
    InvalidCoordinates {
        /// Rejected latitude.
        latitude: f64,
        /// Rejected longitude.
        longitude: f64,
    },

    // === Geofence Errors ===
    /// The geofence validation request failed.
    #[error("geofence validation failed: {message}")]
    ValidationRequestFailed {
        /// Description of what went wrong.
        message: String,
    },

    // === Submission Preconditions ===
    /// The last geofence result placed the device outside the boundary.
    #[error("cannot submit attendance outside geofence")]
    OutsideBoundary,

    /// The geofence result was computed for a position that has been superseded.
    #[error("geofence result is stale; fetch and validate the location again")]
    StaleValidation,

    /// No position has been acquired yet.
    #[error("location not found; fetch location first")]
    LocationMissing,

    /// All checkpoints for the day have been submitted.
    #[error("all sessions completed for today")]
    CycleAlreadyComplete,

    /// A checkpoint other than the current one was reported as submitted.
    #[error("checkpoint {submitted} does not match current checkpoint {current}")]
    CheckpointMismatch {
        /// The tracker's current checkpoint.
        current: Checkpoint,
        /// The checkpoint that was reported.
        submitted: Checkpoint,
    },

    // === Backend Errors ===
    /// The attendance submission request failed.
    #[error("attendance submission failed: {message}")]
    SubmissionRequestFailed {
        /// HTTP status returned by the backend, if a response arrived.
        status: Option<u16>,
        /// Backend message or transport error description.
        message: String,
    },

    /// A background location log entry could not be delivered.
    #[error("location log delivery failed: {message}")]
    LogDeliveryFailed {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },
}

/// A specialized Result type for geoattend operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a capability-unavailable error.
    #[must_use]
    pub fn capability_unavailable(message: impl Into<String>) -> Self {
        Self::CapabilityUnavailable {
            message: message.into(),
        }
    }

    /// Create a permission-denied error.
    #[must_use]
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create an acquisition-failed error.
    #[must_use]
    pub fn acquisition_failed(message: impl Into<String>) -> Self {
        Self::AcquisitionFailed {
            message: message.into(),
        }
    }

    /// Create a validation-request-failed error.
    #[must_use]
    pub fn validation_failed(message: impl Into<String>) -> Self {
        Self::ValidationRequestFailed {
            message: message.into(),
        }
    }

    /// Create a submission-request-failed error.
    #[must_use]
    pub fn submission_failed(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::SubmissionRequestFailed {
            status,
            message: message.into(),
        }
    }

    /// Create a log-delivery-failed error.
    #[must_use]
    pub fn log_delivery_failed(message: impl Into<String>) -> Self {
        Self::LogDeliveryFailed {
            message: message.into(),
        }
    }

    /// Check if this error is a client-side submission precondition failure.
    ///
    /// These are raised before any request is sent.
    #[must_use]
    pub fn is_precondition_failure(&self) -> bool {
        matches!(
            self,
            Self::OutsideBoundary
                | Self::StaleValidation
                | Self::LocationMissing
                | Self::CycleAlreadyComplete
        )
    }

    /// Check if this error came from the location layer.
    #[must_use]
    pub fn is_location_error(&self) -> bool {
        matches!(
            self,
            Self::CapabilityUnavailable { .. }
                | Self::PermissionDenied { .. }
                | Self::AcquisitionFailed { .. }
                | Self::InvalidCoordinates { .. }
        )
    }
}
