//! Attendance submission.
//!
//! [`AttendanceSubmitter::submit`] checks every precondition locally before
//! any request is sent, then records the tracker's current checkpoint with the
//! backend and advances the tracker on success. A failed request leaves the
//! tracker where it was so the same checkpoint can be retried.
//!
//! Each call generates a fresh session id. A caller that retries after a
//! response was lost may therefore record the same checkpoint twice; the id is
//! sent as the request `id` so the backend can deduplicate if it chooses to.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::{new_request_id, AttendanceBackend, SubmitRequest};
use crate::cycle::{Checkpoint, SessionCycleTracker};
use crate::error::{Error, Result};
use crate::geofence::GeofenceStatus;
use crate::position::{EmployeeId, Position, ProjectId};

/// A checkpoint accepted by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSession {
    /// Unique id sent with the submission.
    pub session_id: String,

    /// Employee that submitted.
    pub employee_id: EmployeeId,

    /// Project the attendance was recorded for.
    pub project_id: ProjectId,

    /// The checkpoint that was recorded.
    pub checkpoint: Checkpoint,

    /// The validated position that was submitted.
    pub position: Position,

    /// When the backend accepted the submission.
    pub submitted_at: DateTime<Utc>,

    /// Confirmation text returned by the backend.
    pub message: String,
}

/// Check the client-side submission preconditions.
///
/// Checked in order: the cycle is not complete, a position is held, a
/// geofence result exists, the result was computed for that position, and the
/// result is inside. Returns the checkpoint to submit and the position to
/// submit it with.
///
/// # Errors
///
/// Returns [`Error::CycleAlreadyComplete`], [`Error::LocationMissing`],
/// [`Error::StaleValidation`] or [`Error::OutsideBoundary`]. A position that
/// was never validated counts as outside.
pub fn check_preconditions(
    tracker: &SessionCycleTracker,
    position: Option<&Position>,
    status: Option<&GeofenceStatus>,
) -> Result<(Checkpoint, Position)> {
    let checkpoint = tracker.pending()?;
    let Some(position) = position else {
        return Err(Error::LocationMissing);
    };
    let Some(status) = status else {
        return Err(Error::OutsideBoundary);
    };
    if !status.is_current_for(position) {
        return Err(Error::StaleValidation);
    }
    if !status.inside_boundary {
        return Err(Error::OutsideBoundary);
    }
    Ok((checkpoint, *position))
}

/// Sends attendance submissions.
#[derive(Clone)]
pub struct AttendanceSubmitter {
    backend: Arc<dyn AttendanceBackend>,
    timeout: Duration,
}

impl std::fmt::Debug for AttendanceSubmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttendanceSubmitter")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AttendanceSubmitter {
    /// Create a submitter that gives up after `timeout`.
    #[must_use]
    pub fn new(backend: Arc<dyn AttendanceBackend>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    /// Submit the tracker's current checkpoint.
    ///
    /// On success the tracker advances by one checkpoint and the recorded
    /// session is returned.
    ///
    /// # Errors
    ///
    /// Precondition failures (see [`check_preconditions`]) are returned
    /// without contacting the backend. Backend failures and timeouts are
    /// returned as [`Error::SubmissionRequestFailed`]; the tracker is
    /// unchanged in every error case.
    pub async fn submit(
        &self,
        employee_id: EmployeeId,
        project_id: ProjectId,
        tracker: &mut SessionCycleTracker,
        position: Option<&Position>,
        status: Option<&GeofenceStatus>,
    ) -> Result<AttendanceSession> {
        let (checkpoint, position) = match check_preconditions(tracker, position, status) {
            Ok(ready) => ready,
            Err(err) => {
                debug!(
                    checkpoint = %tracker.current(),
                    error = %err,
                    "Submission rejected before sending"
                );
                return Err(err);
            }
        };

        let request = SubmitRequest {
            id: new_request_id(),
            employee_id,
            project_id,
            session: checkpoint,
            latitude: position.latitude,
            longitude: position.longitude,
        };

        debug!(id = %request.id, %checkpoint, "Submitting attendance");
        let outcome =
            tokio::time::timeout(self.timeout, self.backend.submit_attendance(&request)).await;

        let response = match outcome {
            Ok(Ok(response)) => response,
            Ok(Err(err)) => {
                warn!(%checkpoint, error = %err, "Attendance submission failed");
                return Err(match err {
                    Error::SubmissionRequestFailed { .. } => err,
                    other => Error::submission_failed(None, other.to_string()),
                });
            }
            Err(_) => {
                warn!(%checkpoint, "Attendance submission timed out");
                return Err(Error::submission_failed(None, "request timed out"));
            }
        };

        tracker.advance_from(checkpoint)?;
        info!(
            id = %request.id,
            %checkpoint,
            message = %response.message,
            "Attendance recorded"
        );

        Ok(AttendanceSession {
            session_id: request.id,
            employee_id,
            project_id,
            checkpoint,
            position,
            submitted_at: Utc::now(),
            message: response.message,
        })
    }
}
