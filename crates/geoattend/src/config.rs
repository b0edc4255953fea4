//! Configuration management for geoattend.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::position::{coordinates_valid, EmployeeId, ProjectId};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default configuration directory name.
const CONFIG_DIR_NAME: &str = "geoattend";

/// Prefix for environment variable overrides.
const ENV_PREFIX: &str = "GEOATTEND_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `GEOATTEND_`, sections separated
///    by `__`, e.g. `GEOATTEND_BACKEND__BASE_URL`)
/// 2. TOML config file at `~/.config/geoattend/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend service configuration.
    pub backend: BackendConfig,
    /// Employee and project identity.
    pub attendance: AttendanceConfig,
    /// Position source configuration.
    pub location: LocationConfig,
    /// Background location logger configuration.
    pub logger: LoggerConfig,
}

/// Backend-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the attendance service.
    pub base_url: String,
    /// Session token sent as a bearer token on every request.
    pub auth_token: Option<String>,
    /// Timeout applied to each backend request, in seconds.
    pub request_timeout_secs: u64,
}

/// Identity of the employee being tracked.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttendanceConfig {
    /// Employee identifier.
    pub employee_id: Option<u64>,
    /// Project identifier whose geofence applies.
    pub project_id: Option<u64>,
}

/// Position source configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Allow the position to be read at all.
    pub enabled: bool,
    /// Fixed latitude reported by the static provider.
    pub latitude: Option<f64>,
    /// Fixed longitude reported by the static provider.
    pub longitude: Option<f64>,
    /// Caller-side timeout for a single acquisition, in seconds.
    pub acquire_timeout_secs: u64,
}

/// Background logger configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Run the periodic location logger during a tracking session.
    pub enabled: bool,
    /// Interval between log firings, in seconds.
    pub interval_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            auth_token: None,
            request_timeout_secs: 15,
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            latitude: None,
            longitude: None,
            acquire_timeout_secs: 10,
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 5 * 60,
        }
    }
}

impl Config {
    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let base_url = self.backend.base_url.trim();
        if base_url.is_empty() {
            return Err(Error::ConfigValidation {
                message: "backend.base_url must not be empty".to_string(),
            });
        }
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::ConfigValidation {
                message: format!("backend.base_url must be an http(s) URL: {base_url}"),
            });
        }

        if self.backend.request_timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "backend.request_timeout_secs must be greater than 0".to_string(),
            });
        }

        if self.location.acquire_timeout_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "location.acquire_timeout_secs must be greater than 0".to_string(),
            });
        }

        if let (Some(lat), Some(lon)) = (self.location.latitude, self.location.longitude) {
            if !coordinates_valid(lat, lon) {
                return Err(Error::ConfigValidation {
                    message: format!("location coordinates out of range: ({lat}, {lon})"),
                });
            }
        }

        if self.logger.interval_secs == 0 {
            return Err(Error::ConfigValidation {
                message: "logger.interval_secs must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Get the configured employee id.
    ///
    /// # Errors
    ///
    /// Returns an error if no employee id is configured.
    pub fn employee_id(&self) -> Result<EmployeeId> {
        self.attendance
            .employee_id
            .map(EmployeeId)
            .ok_or_else(|| Error::ConfigValidation {
                message: "attendance.employee_id is not set".to_string(),
            })
    }

    /// Get the configured project id.
    ///
    /// # Errors
    ///
    /// Returns an error if no project id is configured.
    pub fn project_id(&self) -> Result<ProjectId> {
        self.attendance
            .project_id
            .map(ProjectId)
            .ok_or_else(|| Error::ConfigValidation {
                message: "attendance.project_id is not set".to_string(),
            })
    }

    /// Get the backend request timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.request_timeout_secs)
    }

    /// Get the acquisition timeout as a Duration.
    #[must_use]
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.location.acquire_timeout_secs)
    }

    /// Get the logger interval as a Duration.
    #[must_use]
    pub fn log_interval(&self) -> Duration {
        Duration::from_secs(self.logger.interval_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.backend.base_url, "http://localhost:5000");
        assert!(config.backend.auth_token.is_none());
        assert!(config.location.enabled);
        assert!(config.logger.enabled);
        assert!(config.attendance.employee_id.is_none());
    }

    #[test]
    fn test_default_logger_interval_is_five_minutes() {
        let config = Config::default();
        assert_eq!(config.log_interval(), Duration::from_secs(300));
    }

    #[test]
    fn test_default_timeouts() {
        let config = Config::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(15));
        assert_eq!(config.acquire_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_base_url() {
        let mut config = Config::default();
        config.backend.base_url = "  ".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("base_url"));
    }

    #[test]
    fn test_validate_non_http_base_url() {
        let mut config = Config::default();
        config.backend.base_url = "ftp://example.com".to_string();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("http(s)"));
    }

    #[test]
    fn test_validate_zero_timeouts() {
        let mut config = Config::default();
        config.backend.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.location.acquire_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_interval() {
        let mut config = Config::default();
        config.logger.interval_secs = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("interval_secs"));
    }

    #[test]
    fn test_validate_out_of_range_coordinates() {
        let mut config = Config::default();
        config.location.latitude = Some(91.0);
        config.location.longitude = Some(0.0);

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("out of range"));
    }

    #[test]
    fn test_identity_accessors() {
        let mut config = Config::default();
        assert!(config.employee_id().is_err());
        assert!(config.project_id().is_err());

        config.attendance.employee_id = Some(1);
        config.attendance.project_id = Some(12345);
        assert_eq!(config.employee_id().unwrap(), EmployeeId(1));
        assert_eq!(config.project_id().unwrap(), ProjectId(12345));
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("geoattend"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let result = Config::load_from(Some(PathBuf::from("/nonexistent/geoattend.toml")));
        assert!(result.is_ok());
    }

    #[test]
    fn test_load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[backend]
base_url = "https://attendance.example.com"
auth_token = "secret"

[attendance]
employee_id = 7
project_id = 12345

[location]
latitude = 12.97
longitude = 77.59

[logger]
interval_secs = 60
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path().to_path_buf())).unwrap();
        assert_eq!(config.backend.base_url, "https://attendance.example.com");
        assert_eq!(config.backend.auth_token.as_deref(), Some("secret"));
        assert_eq!(config.employee_id().unwrap(), EmployeeId(7));
        assert_eq!(config.location.latitude, Some(12.97));
        assert_eq!(config.log_interval(), Duration::from_secs(60));
        // Unset fields keep their defaults
        assert_eq!(config.backend.request_timeout_secs, 15);
    }

    #[test]
    fn test_load_rejects_invalid_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logger]\ninterval_secs = 0").unwrap();

        let result = Config::load_from(Some(file.path().to_path_buf()));
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_config_serialize() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("base_url"));
        assert!(json.contains("interval_secs"));
    }

    #[test]
    fn test_logger_config_deserialize() {
        let json = r#"{"interval_secs": 30}"#;
        let logger: LoggerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(logger.interval_secs, 30);
        assert!(logger.enabled);
    }
}
