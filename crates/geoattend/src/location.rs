//! Position acquisition.
//!
//! [`LocationProvider`] is the seam over whatever the platform offers for
//! finding the device position. Acquisition is single-shot: each call returns
//! a freshly captured [`Position`] and nothing is cached or retried here.

use tracing::{debug, warn};

use crate::config::LocationConfig;
use crate::error::{Error, Result};
use crate::position::{coordinates_valid, Position};

/// A trait for platform-specific position sources.
#[async_trait::async_trait]
pub trait LocationProvider: Send + Sync {
    /// The name of this provider (for logging/debugging).
    fn name(&self) -> &'static str;

    /// Acquire the current position.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CapabilityUnavailable`] if the device cannot provide a
    /// position at all, [`Error::PermissionDenied`] if access was refused, and
    /// [`Error::AcquisitionFailed`] on timeout or signal loss.
    async fn acquire(&self) -> Result<Position>;
}

/// A provider that reports a configured, fixed position.
///
/// This is the source used on machines without positioning hardware: the
/// coordinates come from configuration or the command line, and every call
/// stamps a new capture time.
#[derive(Debug, Clone)]
pub struct StaticLocationProvider {
    enabled: bool,
    coordinates: Option<(f64, f64)>,
}

impl StaticLocationProvider {
    /// Create a provider that always reports the given coordinates.
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            enabled: true,
            coordinates: Some((latitude, longitude)),
        }
    }

    /// Create a provider with no coordinates configured.
    #[must_use]
    pub fn unavailable() -> Self {
        Self {
            enabled: true,
            coordinates: None,
        }
    }

    /// Create a provider from the `[location]` configuration section.
    #[must_use]
    pub fn from_config(config: &LocationConfig) -> Self {
        let coordinates = match (config.latitude, config.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        };
        Self {
            enabled: config.enabled,
            coordinates,
        }
    }
}

#[async_trait::async_trait]
impl LocationProvider for StaticLocationProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn acquire(&self) -> Result<Position> {
        if !self.enabled {
            return Err(Error::permission_denied(
                "location sharing is disabled in configuration",
            ));
        }

        let Some((latitude, longitude)) = self.coordinates else {
            return Err(Error::capability_unavailable(
                "no location source configured; set location.latitude and location.longitude",
            ));
        };

        if !coordinates_valid(latitude, longitude) {
            warn!(latitude, longitude, "Configured coordinates out of range");
            return Err(Error::acquisition_failed(format!(
                "configured coordinates ({latitude}, {longitude}) are out of range"
            )));
        }

        let position = Position::new(latitude, longitude)?;
        debug!(provider = self.name(), %position, "Position acquired");
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_provider_acquires() {
        let provider = StaticLocationProvider::new(12.97, 77.59);
        let position = provider.acquire().await.unwrap();
        assert!((position.latitude - 12.97).abs() < f64::EPSILON);
        assert!((position.longitude - 77.59).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_static_provider_fresh_capture_time() {
        let provider = StaticLocationProvider::new(1.0, 2.0);
        let first = provider.acquire().await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = provider.acquire().await.unwrap();
        assert!(second.captured_at > first.captured_at);
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_static_provider_unavailable() {
        let provider = StaticLocationProvider::unavailable();
        let err = provider.acquire().await.unwrap_err();
        assert!(matches!(err, Error::CapabilityUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_static_provider_disabled() {
        let config = LocationConfig {
            enabled: false,
            latitude: Some(1.0),
            longitude: Some(1.0),
            ..LocationConfig::default()
        };
        let provider = StaticLocationProvider::from_config(&config);
        let err = provider.acquire().await.unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));
    }

    #[tokio::test]
    async fn test_static_provider_out_of_range() {
        let provider = StaticLocationProvider::new(123.0, 0.0);
        let err = provider.acquire().await.unwrap_err();
        assert!(matches!(err, Error::AcquisitionFailed { .. }));
    }

    #[tokio::test]
    async fn test_static_provider_from_partial_config() {
        let config = LocationConfig {
            latitude: Some(1.0),
            longitude: None,
            ..LocationConfig::default()
        };
        let provider = StaticLocationProvider::from_config(&config);
        let err = provider.acquire().await.unwrap_err();
        assert!(matches!(err, Error::CapabilityUnavailable { .. }));
    }

    #[test]
    fn test_provider_name() {
        assert_eq!(StaticLocationProvider::unavailable().name(), "static");
    }
}
