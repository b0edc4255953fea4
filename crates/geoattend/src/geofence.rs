//! Geofence validation.
//!
//! A [`GeofenceStatus`] records whether one specific [`Position`] lies inside
//! a project's boundary. It is bound to that position: once a newer position
//! is acquired the status is stale and must not be used for submission.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{AttendanceBackend, GeofenceRequest};
use crate::error::{Error, Result};
use crate::position::{Position, ProjectId};

/// Result of classifying a position against a project boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeofenceStatus {
    /// Whether the position lies inside the boundary.
    pub inside_boundary: bool,

    /// The position this result was computed for.
    pub evaluated_for: Position,
}

impl GeofenceStatus {
    /// Check if this status was computed for `position`.
    #[must_use]
    pub fn is_current_for(&self, position: &Position) -> bool {
        self.evaluated_for == *position
    }
}

/// Classifies positions by asking the backend.
///
/// Failures are never retried and never fall back to a previous result.
#[derive(Clone)]
pub struct GeofenceValidator {
    backend: Arc<dyn AttendanceBackend>,
    timeout: Duration,
}

impl std::fmt::Debug for GeofenceValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeofenceValidator")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl GeofenceValidator {
    /// Create a validator that gives up after `timeout`.
    #[must_use]
    pub fn new(backend: Arc<dyn AttendanceBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Classify `position` against the boundary of `project_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationRequestFailed`] if the request fails or does
    /// not complete within the timeout.
    pub async fn validate(
        &self,
        project_id: ProjectId,
        position: Position,
    ) -> Result<GeofenceStatus> {
        let request = GeofenceRequest {
            project_id,
            latitude: position.latitude,
            longitude: position.longitude,
        };

        debug!(%project_id, %position, "Validating geofence");
        let outcome =
            tokio::time::timeout(self.timeout, self.backend.validate_geofence(&request)).await;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                warn!(error = %err, "Geofence validation failed");
                return Err(match err {
                    Error::ValidationRequestFailed { .. } => err,
                    other => Error::validation_failed(other.to_string()),
                });
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "Geofence validation timed out"
                );
                return Err(Error::validation_failed("request timed out"));
            }
        };

        if response.inside_geofence {
            info!(%position, "Inside the geofence");
        } else {
            info!(%position, "Outside the project geofence");
        }

        Ok(GeofenceStatus {
            inside_boundary: response.inside_geofence,
            evaluated_for: position,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockBackend;

    fn validator(backend: &Arc<MockBackend>) -> GeofenceValidator {
        GeofenceValidator::new(backend.clone(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_validate_inside() {
        let backend = Arc::new(MockBackend::inside());
        let position = Position::new(12.97, 77.59).unwrap();

        let status = validator(&backend)
            .validate(ProjectId(12345), position)
            .await
            .unwrap();

        assert!(status.inside_boundary);
        assert_eq!(status.evaluated_for, position);
        assert!(status.is_current_for(&position));

        let requests = backend.geofence_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].project_id, ProjectId(12345));
    }

    #[tokio::test]
    async fn test_validate_outside() {
        let backend = Arc::new(MockBackend::outside());
        let position = Position::new(0.0, 0.0).unwrap();

        let status = validator(&backend)
            .validate(ProjectId(1), position)
            .await
            .unwrap();

        assert!(!status.inside_boundary);
    }

    #[tokio::test]
    async fn test_validate_failure_is_surfaced() {
        let backend = Arc::new(MockBackend::inside());
        backend.fail_validation(true);

        let err = validator(&backend)
            .validate(ProjectId(1), Position::new(1.0, 1.0).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ValidationRequestFailed { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_validate_timeout() {
        let backend = Arc::new(MockBackend::inside());
        backend.set_delay(Duration::from_secs(60));

        let err = validator(&backend)
            .validate(ProjectId(1), Position::new(1.0, 1.0).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::ValidationRequestFailed { .. }));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_status_is_stale_for_newer_position() {
        let now = chrono::Utc::now();
        let old = Position::at(1.0, 1.0, now).unwrap();
        let new = Position::at(1.0, 1.0, now + chrono::Duration::seconds(30)).unwrap();

        let status = GeofenceStatus {
            inside_boundary: true,
            evaluated_for: old,
        };
        assert!(status.is_current_for(&old));
        assert!(!status.is_current_for(&new));
    }
}
