//! A live attendance tracking session.
//!
//! [`TrackingSession`] is the owner the rest of the crate plugs into: it holds
//! the current position, the geofence result for that position, and the
//! checkpoint tracker, and it owns the background location logger for its
//! whole lifetime.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::backend::AttendanceBackend;
use crate::config::Config;
use crate::cycle::{Checkpoint, SessionCycleTracker};
use crate::error::{Error, Result};
use crate::geofence::{GeofenceStatus, GeofenceValidator};
use crate::location::LocationProvider;
use crate::logger::{LoggerHandle, LoggerStats, PeriodicLocationLogger, DEFAULT_LOG_INTERVAL};
use crate::position::{CurrentPosition, EmployeeId, Position, ProjectId};
use crate::submit::{AttendanceSession, AttendanceSubmitter};

/// Timeouts and logger settings for a [`TrackingSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    /// Caller-side limit on a single position acquisition.
    pub acquire_timeout: Duration,
    /// Caller-side limit on validation and submission requests.
    pub request_timeout: Duration,
    /// Logger interval; `None` disables background logging.
    pub log_interval: Option<Duration>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            acquire_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
            log_interval: Some(DEFAULT_LOG_INTERVAL),
        }
    }
}

impl SessionSettings {
    /// Build settings from loaded configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            acquire_timeout: config.acquire_timeout(),
            request_timeout: config.request_timeout(),
            log_interval: config.logger.enabled.then(|| config.log_interval()),
        }
    }
}

/// One employee's attendance cycle on one project.
pub struct TrackingSession {
    employee_id: EmployeeId,
    project_id: ProjectId,
    provider: Arc<dyn LocationProvider>,
    validator: GeofenceValidator,
    submitter: AttendanceSubmitter,
    tracker: SessionCycleTracker,
    current: CurrentPosition,
    geofence: Option<GeofenceStatus>,
    acquire_timeout: Duration,
    logger: Option<LoggerHandle>,
}

impl std::fmt::Debug for TrackingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackingSession")
            .field("employee_id", &self.employee_id)
            .field("project_id", &self.project_id)
            .field("provider", &self.provider.name())
            .field("checkpoint", &self.tracker.current())
            .field("position", &self.current.latest())
            .field("geofence", &self.geofence)
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

impl TrackingSession {
    /// Open a session at [`Checkpoint::AmLogin`] and start the logger.
    ///
    /// Must be called from within a tokio runtime when logging is enabled.
    #[must_use]
    pub fn start(
        employee_id: EmployeeId,
        project_id: ProjectId,
        provider: Arc<dyn LocationProvider>,
        backend: Arc<dyn AttendanceBackend>,
        settings: &SessionSettings,
    ) -> Self {
        let current = CurrentPosition::new();

        let logger = settings.log_interval.map(|interval| {
            PeriodicLocationLogger::new(
                Arc::clone(&backend),
                employee_id,
                project_id,
                current.reader(),
                interval,
            )
            .start()
        });

        info!(
            %employee_id,
            %project_id,
            provider = provider.name(),
            logging = logger.is_some(),
            "Tracking session started"
        );

        Self {
            employee_id,
            project_id,
            provider,
            validator: GeofenceValidator::new(Arc::clone(&backend), settings.request_timeout),
            submitter: AttendanceSubmitter::new(backend, settings.request_timeout),
            tracker: SessionCycleTracker::new(),
            current,
            geofence: None,
            acquire_timeout: settings.acquire_timeout,
            logger,
        }
    }

    /// The employee being tracked.
    #[must_use]
    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    /// The project being tracked.
    #[must_use]
    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }

    /// The checkpoint the next submission is for.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        self.tracker.current()
    }

    /// The last acquired position.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.current.latest()
    }

    /// The geofence result for the current position, if validated.
    ///
    /// A result computed for a superseded position is not returned here, but
    /// it is kept so that submitting reports it as stale.
    #[must_use]
    pub fn geofence_status(&self) -> Option<GeofenceStatus> {
        let position = self.current.latest()?;
        self.geofence.filter(|status| status.is_current_for(&position))
    }

    /// Check if the current position has been validated as inside.
    #[must_use]
    pub fn is_inside(&self) -> bool {
        self.geofence_status().is_some_and(|status| status.inside_boundary)
    }

    /// Background logger counters, if logging is enabled.
    #[must_use]
    pub fn logger_stats(&self) -> Option<LoggerStats> {
        self.logger.as_ref().map(LoggerHandle::stats)
    }

    /// Check if the background logger is running.
    #[must_use]
    pub fn is_logging(&self) -> bool {
        self.logger.as_ref().is_some_and(LoggerHandle::is_running)
    }

    /// Acquire a new position and make it current.
    ///
    /// A successful acquisition makes the previous geofence result stale;
    /// call [`TrackingSession::validate`] before submitting again.
    ///
    /// # Errors
    ///
    /// Returns the provider's error, or [`Error::AcquisitionFailed`] if the
    /// provider does not answer within the acquisition timeout. The held
    /// position and geofence result are unchanged on error.
    pub async fn acquire(&mut self) -> Result<Position> {
        let outcome = tokio::time::timeout(self.acquire_timeout, self.provider.acquire()).await;

        let position = match outcome {
            Ok(result) => result?,
            Err(_) => {
                warn!(
                    timeout_secs = self.acquire_timeout.as_secs(),
                    "Location acquisition timed out"
                );
                return Err(Error::acquisition_failed("timed out waiting for a position"));
            }
        };

        self.current.publish(position);
        debug!(%position, "Current position replaced");
        Ok(position)
    }

    /// Validate the current position against the project geofence.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LocationMissing`] if no position is held and
    /// [`Error::ValidationRequestFailed`] if the backend call fails. The held
    /// geofence result is unchanged on failure.
    pub async fn validate(&mut self) -> Result<GeofenceStatus> {
        let position = self.current.latest().ok_or(Error::LocationMissing)?;

        let status = self.validator.validate(self.project_id, position).await?;

        // A newer position may have been published while waiting
        if self.current.latest() == Some(status.evaluated_for) {
            self.geofence = Some(status);
        }
        Ok(status)
    }

    /// Acquire a fresh position and validate it.
    ///
    /// # Errors
    ///
    /// Returns the first acquisition or validation error.
    pub async fn refresh_location(&mut self) -> Result<GeofenceStatus> {
        self.acquire().await?;
        self.validate().await
    }

    /// Submit the current checkpoint with the current position.
    ///
    /// # Errors
    ///
    /// See [`AttendanceSubmitter::submit`].
    pub async fn submit(&mut self) -> Result<AttendanceSession> {
        let position = self.current.latest();
        self.submitter
            .submit(
                self.employee_id,
                self.project_id,
                &mut self.tracker,
                position.as_ref(),
                self.geofence.as_ref(),
            )
            .await
    }

    /// Close the session, stopping the background logger.
    ///
    /// Returns the logger's final counters if logging was enabled.
    pub async fn shutdown(mut self) -> Option<LoggerStats> {
        let stats = match self.logger.take() {
            Some(logger) => Some(logger.stop().await),
            None => None,
        };
        info!(checkpoint = %self.tracker.current(), "Tracking session closed");
        stats
    }
}
