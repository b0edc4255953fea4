//! In-memory test doubles for the backend and location seams.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::backend::{
    AttendanceBackend, GeofenceRequest, GeofenceResponse, LogLocationRequest, SubmitRequest,
    SubmitResponse,
};
use crate::error::{Error, Result};
use crate::location::LocationProvider;
use crate::position::Position;

/// Backend that answers from flags and records every request.
#[derive(Debug, Default)]
pub struct MockBackend {
    inside: AtomicBool,
    fail_validation: AtomicBool,
    fail_submission: AtomicBool,
    fail_logging: AtomicBool,
    delay: Mutex<Duration>,
    geofence_requests: Mutex<Vec<GeofenceRequest>>,
    submit_requests: Mutex<Vec<SubmitRequest>>,
    log_requests: Mutex<Vec<LogLocationRequest>>,
}

impl MockBackend {
    pub fn inside() -> Self {
        let backend = Self::default();
        backend.set_inside(true);
        backend
    }

    pub fn outside() -> Self {
        Self::default()
    }

    pub fn set_inside(&self, inside: bool) {
        self.inside.store(inside, Ordering::SeqCst);
    }

    pub fn fail_validation(&self, fail: bool) {
        self.fail_validation.store(fail, Ordering::SeqCst);
    }

    pub fn fail_submission(&self, fail: bool) {
        self.fail_submission.store(fail, Ordering::SeqCst);
    }

    pub fn fail_logging(&self, fail: bool) {
        self.fail_logging.store(fail, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn geofence_requests(&self) -> Vec<GeofenceRequest> {
        self.geofence_requests.lock().unwrap().clone()
    }

    pub fn submit_requests(&self) -> Vec<SubmitRequest> {
        self.submit_requests.lock().unwrap().clone()
    }

    pub fn log_requests(&self) -> Vec<LogLocationRequest> {
        self.log_requests.lock().unwrap().clone()
    }

    async fn pause(&self) {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait::async_trait]
impl AttendanceBackend for MockBackend {
    async fn validate_geofence(&self, request: &GeofenceRequest) -> Result<GeofenceResponse> {
        self.geofence_requests.lock().unwrap().push(request.clone());
        self.pause().await;
        if self.fail_validation.load(Ordering::SeqCst) {
            return Err(Error::validation_failed("backend unavailable"));
        }
        Ok(GeofenceResponse {
            inside_geofence: self.inside.load(Ordering::SeqCst),
        })
    }

    async fn submit_attendance(&self, request: &SubmitRequest) -> Result<SubmitResponse> {
        self.submit_requests.lock().unwrap().push(request.clone());
        self.pause().await;
        if self.fail_submission.load(Ordering::SeqCst) {
            return Err(Error::submission_failed(Some(500), "Error submitting attendance"));
        }
        Ok(SubmitResponse {
            message: "Attendance recorded".to_string(),
        })
    }

    async fn log_location(&self, request: &LogLocationRequest) -> Result<()> {
        self.log_requests.lock().unwrap().push(request.clone());
        if self.fail_logging.load(Ordering::SeqCst) {
            return Err(Error::log_delivery_failed("connection refused"));
        }
        Ok(())
    }
}

/// Location provider that replays a queue of outcomes.
///
/// Each successful call is stamped one second after the previous one, so
/// repeated coordinates still produce distinct positions. Once the queue is
/// drained every call fails with `AcquisitionFailed`.
#[derive(Debug)]
pub struct ScriptedProvider {
    outcomes: Mutex<VecDeque<Result<(f64, f64)>>>,
    delay: Mutex<Duration>,
    base: DateTime<Utc>,
    calls: AtomicI64,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self {
            outcomes: Mutex::new(VecDeque::new()),
            delay: Mutex::new(Duration::ZERO),
            base: Utc::now(),
            calls: AtomicI64::new(0),
        }
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then_at(self, latitude: f64, longitude: f64) -> Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Ok((latitude, longitude)));
        self
    }

    pub fn then_fail(self, err: Error) -> Self {
        self.outcomes.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = delay;
        self
    }
}

#[async_trait::async_trait]
impl LocationProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn acquire(&self) -> Result<Position> {
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        let outcome = self.outcomes.lock().unwrap().pop_front();
        match outcome {
            Some(Ok((latitude, longitude))) => {
                let n = self.calls.fetch_add(1, Ordering::SeqCst);
                Position::at(latitude, longitude, self.base + chrono::Duration::seconds(n))
            }
            Some(Err(err)) => Err(err),
            None => Err(Error::acquisition_failed("no more scripted positions")),
        }
    }
}
