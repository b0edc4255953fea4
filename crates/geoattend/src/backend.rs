//! Backend attendance service.
//!
//! [`AttendanceBackend`] is the seam over the three JSON calls the attendance
//! flow makes. [`HttpBackend`] implements it with `reqwest`:
//!
//! | Operation          | Path                                  |
//! |--------------------|---------------------------------------|
//! | Validate geofence  | `POST /api/attendance/validate-geofence` |
//! | Submit attendance  | `POST /api/attendance/submit`         |
//! | Log location       | `POST /api/attendance/log-location`   |
//!
//! Any 2xx reply to a submission means the checkpoint was recorded; the
//! response body only supplies the confirmation text.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::Config;
use crate::cycle::Checkpoint;
use crate::error::{Error, Result};
use crate::position::{EmployeeId, ProjectId};

/// Path of the geofence validation endpoint.
pub const VALIDATE_GEOFENCE_PATH: &str = "/api/attendance/validate-geofence";

/// Path of the attendance submission endpoint.
pub const SUBMIT_ATTENDANCE_PATH: &str = "/api/attendance/submit";

/// Path of the location log endpoint.
pub const LOG_LOCATION_PATH: &str = "/api/attendance/log-location";

/// Body of a geofence validation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceRequest {
    /// Project whose boundary applies.
    pub project_id: ProjectId,
    /// Latitude to classify.
    pub latitude: f64,
    /// Longitude to classify.
    pub longitude: f64,
}

/// Body of a geofence validation response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceResponse {
    /// Whether the position lies inside the project boundary.
    pub inside_geofence: bool,
}

/// Body of an attendance submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    /// Caller-generated unique session id.
    pub id: String,
    /// Employee submitting attendance.
    pub employee_id: EmployeeId,
    /// Project the attendance is for.
    pub project_id: ProjectId,
    /// Checkpoint being submitted.
    pub session: Checkpoint,
    /// Latitude of the validated position.
    pub latitude: f64,
    /// Longitude of the validated position.
    pub longitude: f64,
}

/// Body of an attendance submission response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// Confirmation text from the backend.
    pub message: String,
}

/// Confirmation used when a successful submission carries no `message`.
pub const DEFAULT_SUBMIT_MESSAGE: &str = "Attendance recorded";

/// Body of a background location log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogLocationRequest {
    /// Caller-generated unique log id.
    pub id: String,
    /// Employee being tracked.
    pub employee_id: EmployeeId,
    /// Project being tracked.
    pub project_id: ProjectId,
    /// Last known latitude.
    pub latitude: f64,
    /// Last known longitude.
    pub longitude: f64,
}

/// A trait for the attendance backend service.
///
/// Each method maps its failures to the error variant of its layer:
/// [`Error::ValidationRequestFailed`], [`Error::SubmissionRequestFailed`] and
/// [`Error::LogDeliveryFailed`] respectively.
#[async_trait::async_trait]
pub trait AttendanceBackend: Send + Sync {
    /// Classify a position against a project boundary.
    async fn validate_geofence(&self, request: &GeofenceRequest) -> Result<GeofenceResponse>;

    /// Record an attendance checkpoint.
    async fn submit_attendance(&self, request: &SubmitRequest) -> Result<SubmitResponse>;

    /// Record a background location sample. The response body is ignored.
    async fn log_location(&self, request: &LogLocationRequest) -> Result<()>;
}

/// Error body some backend failures carry.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// A failed request before it is mapped to a layer-specific error.
#[derive(Debug)]
struct RequestFailure {
    status: Option<u16>,
    message: String,
}

impl RequestFailure {
    fn transport(err: &reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            "request timed out".to_string()
        } else {
            err.to_string()
        };
        Self {
            status: err.status().map(|s| s.as_u16()),
            message,
        }
    }
}

/// `reqwest`-based implementation of [`AttendanceBackend`].
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpBackend {
    /// Create a backend client.
    ///
    /// `auth_token`, when set, is sent as a bearer token on every request.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        auth_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::ConfigValidation {
                message: format!("failed to build HTTP client: {e}"),
            })?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self {
            client,
            base_url,
            auth_token,
        })
    }

    /// Create a backend client from the `[backend]` configuration section.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.backend.base_url.clone(),
            config.backend.auth_token.clone(),
            config.request_timeout(),
        )
    }

    /// The base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn post<B>(
        &self,
        path: &str,
        body: &B,
    ) -> std::result::Result<reqwest::Response, RequestFailure>
    where
        B: Serialize + Sync + ?Sized,
    {
        let url = self.endpoint(path);
        trace!(%url, "POST");

        let mut request = self.client.post(&url).json(body);
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| RequestFailure::transport(&e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.message)
            .unwrap_or_else(|| format!("backend returned {status}"));

        debug!(%url, status = status.as_u16(), %message, "Backend request rejected");
        Err(RequestFailure {
            status: Some(status.as_u16()),
            message,
        })
    }
}

#[async_trait::async_trait]
impl AttendanceBackend for HttpBackend {
    async fn validate_geofence(&self, request: &GeofenceRequest) -> Result<GeofenceResponse> {
        let response = self
            .post(VALIDATE_GEOFENCE_PATH, request)
            .await
            .map_err(|f| Error::validation_failed(f.message))?;

        response
            .json::<GeofenceResponse>()
            .await
            .map_err(|e| Error::validation_failed(format!("malformed response: {e}")))
    }

    async fn submit_attendance(&self, request: &SubmitRequest) -> Result<SubmitResponse> {
        let response = self
            .post(SUBMIT_ATTENDANCE_PATH, request)
            .await
            .map_err(|f| Error::submission_failed(f.status, f.message))?;

        // The checkpoint is recorded once a 2xx arrives, whatever the body says
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<SubmitResponse>(&text)
            .map(|body| body.message)
            .unwrap_or_else(|_| {
                debug!(body = %text, "Submission accepted without a message");
                DEFAULT_SUBMIT_MESSAGE.to_string()
            });

        Ok(SubmitResponse { message })
    }

    async fn log_location(&self, request: &LogLocationRequest) -> Result<()> {
        self.post(LOG_LOCATION_PATH, request)
            .await
            .map(|_| ())
            .map_err(|f| Error::log_delivery_failed(f.message))
    }
}

/// Generate a unique id for a submission or log entry.
#[must_use]
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
