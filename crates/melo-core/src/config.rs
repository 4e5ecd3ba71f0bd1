// ── Runtime discovery configuration ──
//
// These types describe *how* to reach the discovery service and how the
// device list is presented. They never touch disk: melo-config builds a
// `DiscoverConfig` from files and environment and hands it in.

use std::path::PathBuf;
use std::time::Duration;

use melo_api::{DeviceClient, TlsMode, TransportConfig};

use crate::error::CoreError;
use crate::model::StatusThresholds;
use crate::navigate::{SystemBrowser, UrlStyle};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification.
    DangerAcceptInvalid,
}

impl From<&TlsVerification> for TlsMode {
    fn from(tls: &TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        }
    }
}

/// Everything a front end needs to drive the discover view.
#[derive(Debug, Clone)]
pub struct DiscoverConfig {
    /// Service base URL (e.g., `https://api.melo.re`).
    pub api_url: String,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Request timeout.
    pub timeout: Duration,
    /// Freshness windows for the status indicator.
    pub thresholds: StatusThresholds,
    /// Whether interface URLs carry the device port.
    pub url_style: UrlStyle,
    /// Browser launcher override.
    pub opener: Option<String>,
}

impl Default for DiscoverConfig {
    fn default() -> Self {
        Self {
            api_url: melo_api::DEFAULT_API_URL.into(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            thresholds: StatusThresholds::default(),
            url_style: UrlStyle::default(),
            opener: None,
        }
    }
}

impl DiscoverConfig {
    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: TlsMode::from(&self.tls),
            timeout: self.timeout,
        }
    }

    /// Build the HTTP client for the configured service.
    pub fn build_client(&self) -> Result<DeviceClient, CoreError> {
        DeviceClient::new(&self.api_url, &self.transport()).map_err(CoreError::from)
    }

    pub fn navigator(&self) -> SystemBrowser {
        SystemBrowser::new(self.opener.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_targets_hosted_service() {
        let cfg = DiscoverConfig::default();
        assert_eq!(cfg.api_url, "https://api.melo.re");
        assert_eq!(cfg.tls, TlsVerification::SystemDefaults);
        assert_eq!(cfg.url_style, UrlStyle::WithPort);
        let client = cfg.build_client().unwrap();
        assert_eq!(client.base_url().as_str(), "https://api.melo.re/");
    }

    #[test]
    fn bad_url_is_a_config_error() {
        let cfg = DiscoverConfig {
            api_url: "not a url".into(),
            ..DiscoverConfig::default()
        };
        assert!(matches!(cfg.build_client(), Err(CoreError::Config { .. })));
    }
}
