//! Periodic background location logging.
//!
//! While a tracking session is open, [`PeriodicLocationLogger`] reports the
//! last known position to the backend on a fixed interval. Logging is best
//! effort: a firing with no position is skipped silently and delivery failures
//! are counted and logged, never returned. The task is owned by a
//! [`LoggerHandle`]; stopping or dropping the handle ends it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace, warn};

use crate::backend::{new_request_id, AttendanceBackend, LogLocationRequest};
use crate::position::{EmployeeId, Position, PositionReader, ProjectId};

/// Default interval between firings.
pub const DEFAULT_LOG_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// A location sample sent by the logger.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationLogEntry {
    /// Unique id of this sample.
    pub log_id: String,
    /// Employee being tracked.
    pub employee_id: EmployeeId,
    /// Project being tracked.
    pub project_id: ProjectId,
    /// The position reported.
    pub position: Position,
}

impl From<&LocationLogEntry> for LogLocationRequest {
    fn from(entry: &LocationLogEntry) -> Self {
        Self {
            id: entry.log_id.clone(),
            employee_id: entry.employee_id,
            project_id: entry.project_id,
            latitude: entry.position.latitude,
            longitude: entry.position.longitude,
        }
    }
}

/// What a single firing did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FireOutcome {
    /// A log entry was delivered.
    Sent,
    /// No position was held; nothing was sent.
    Skipped,
    /// Delivery failed and the error was discarded.
    Failed,
}

/// Counters of logger firings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoggerStats {
    /// Entries delivered.
    pub sent: u64,
    /// Firings with no position to report.
    pub skipped: u64,
    /// Entries whose delivery failed.
    pub failed: u64,
}

impl LoggerStats {
    /// Total number of firings.
    #[must_use]
    pub fn firings(&self) -> u64 {
        self.sent + self.skipped + self.failed
    }
}

#[derive(Debug, Default)]
struct Counters {
    sent: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
}

impl Counters {
    fn record(&self, outcome: FireOutcome) {
        let counter = match outcome {
            FireOutcome::Sent => &self.sent,
            FireOutcome::Skipped => &self.skipped,
            FireOutcome::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> LoggerStats {
        LoggerStats {
            sent: self.sent.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

/// Reports the last known position on a fixed interval.
pub struct PeriodicLocationLogger {
    backend: Arc<dyn AttendanceBackend>,
    employee_id: EmployeeId,
    project_id: ProjectId,
    positions: PositionReader,
    interval: Duration,
    counters: Arc<Counters>,
}

impl std::fmt::Debug for PeriodicLocationLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PeriodicLocationLogger")
            .field("employee_id", &self.employee_id)
            .field("project_id", &self.project_id)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}

impl PeriodicLocationLogger {
    /// Create a logger that reads positions from `positions`.
    #[must_use]
    pub fn new(
        backend: Arc<dyn AttendanceBackend>,
        employee_id: EmployeeId,
        project_id: ProjectId,
        positions: PositionReader,
        interval: Duration,
    ) -> Self {
        Self {
            backend,
            employee_id,
            project_id,
            positions,
            interval,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Run a single firing.
    pub async fn fire(&self) -> FireOutcome {
        let Some(position) = self.positions.latest() else {
            trace!("No position yet, skipping location log");
            self.counters.record(FireOutcome::Skipped);
            return FireOutcome::Skipped;
        };

        let entry = LocationLogEntry {
            log_id: new_request_id(),
            employee_id: self.employee_id,
            project_id: self.project_id,
            position,
        };

        let request = LogLocationRequest::from(&entry);
        let outcome = match self.backend.log_location(&request).await {
            Ok(()) => {
                debug!(id = %entry.log_id, %position, "Location logged automatically");
                FireOutcome::Sent
            }
            Err(err) => {
                warn!(id = %entry.log_id, error = %err, "Error logging location");
                FireOutcome::Failed
            }
        };
        self.counters.record(outcome);
        outcome
    }

    /// Spawn the recurring task.
    ///
    /// The first firing happens one interval after the call. Must be called
    /// from within a tokio runtime.
    #[must_use]
    pub fn start(self) -> LoggerHandle {
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let counters = Arc::clone(&self.counters);

        debug!(interval_secs = self.interval.as_secs(), "Starting location logger");
        let task = tokio::spawn(self.run(shutdown_rx));

        LoggerHandle {
            shutdown: Some(shutdown_tx),
            task: Some(task),
            counters,
        }
    }

    async fn run(self, mut shutdown: oneshot::Receiver<()>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                _ = &mut shutdown => break,
                _ = self.fire() => {}
            }
        }

        debug!("Location logger stopped");
    }
}

/// Owner of a running [`PeriodicLocationLogger`] task.
///
/// [`LoggerHandle::stop`] ends the task and waits for it. Dropping the handle
/// without stopping aborts the task.
#[derive(Debug)]
pub struct LoggerHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl LoggerHandle {
    /// Check if the task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Get the firing counters so far.
    #[must_use]
    pub fn stats(&self) -> LoggerStats {
        self.counters.snapshot()
    }

    /// Stop the task and wait for it to exit.
    ///
    /// Returns the final counters.
    pub async fn stop(mut self) -> LoggerStats {
        debug!("Stopping location logger");
        if let Some(shutdown) = self.shutdown.take() {
            // The task may already be gone
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(err) = task.await {
                warn!(error = %err, "Location logger task ended abnormally");
            }
        }
        self.counters.snapshot()
    }
}

impl Drop for LoggerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            debug!("Location logger handle dropped, aborting task");
            task.abort();
        }
    }
}
