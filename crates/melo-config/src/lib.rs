//! Shared configuration for the melo CLI and TUI.
//!
//! TOML file loading layered with `MELO_` environment variables, and
//! translation to `melo_core::DiscoverConfig`. Both binaries depend on
//! this crate; the CLI applies its flag overrides on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use melo_core::{DiscoverConfig, StatusThresholds, TlsVerification, UrlStyle};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration shared by CLI and TUI.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Discovery service base URL.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Accept invalid TLS certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub navigation: Navigation,

    #[serde(default)]
    pub status: Status,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
            defaults: Defaults::default(),
            navigation: Navigation::default(),
            status: Status::default(),
        }
    }
}

/// CLI presentation defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
        }
    }
}

/// How interface URLs are built and opened.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Navigation {
    /// Append the device port to interface URLs.
    #[serde(default = "default_true")]
    pub include_port: bool,

    /// Browser launcher; platform default when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opener: Option<String>,
}

impl Default for Navigation {
    fn default() -> Self {
        Self {
            include_port: true,
            opener: None,
        }
    }
}

/// Status indicator freshness windows, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Status {
    #[serde(default = "default_fresh_secs")]
    pub fresh_secs: u64,

    #[serde(default = "default_stale_secs")]
    pub stale_secs: u64,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            fresh_secs: default_fresh_secs(),
            stale_secs: default_stale_secs(),
        }
    }
}

fn default_api_url() -> String {
    melo_core::DiscoverConfig::default().api_url
}
fn default_timeout() -> u64 {
    30
}
fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_true() -> bool {
    true
}
fn default_fresh_secs() -> u64 {
    StatusThresholds::default().fresh_secs
}
fn default_stale_secs() -> u64 {
    StatusThresholds::default().stale_secs
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("re", "melo", "melo").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("melo");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Defaults → TOML file at `path` → `MELO_*` environment.
///
/// Nested keys use a double underscore: `MELO_STATUS__FRESH_SECS`.
pub fn figment_for(path: &Path) -> Figment {
    Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MELO_").split("__"))
}

/// Load and validate the config at `path`. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = figment_for(path).extract()?;
    config.validate()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write it to `path`.
pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Validation & translation ────────────────────────────────────────

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url: url::Url = self.api_url.parse().map_err(|e| ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("invalid URL '{}': {e}", self.api_url),
        })?;
        if url.cannot_be_a_base() {
            return Err(ConfigError::Validation {
                field: "api_url".into(),
                reason: format!("'{}' cannot be used as a base URL", self.api_url),
            });
        }

        if self.status.fresh_secs >= self.status.stale_secs {
            return Err(ConfigError::Validation {
                field: "status".into(),
                reason: format!(
                    "fresh_secs ({}) must be less than stale_secs ({})",
                    self.status.fresh_secs, self.status.stale_secs
                ),
            });
        }

        Ok(())
    }

    pub fn tls(&self) -> TlsVerification {
        if self.insecure {
            TlsVerification::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsVerification::CustomCa(ca_path.clone())
        } else {
            TlsVerification::SystemDefaults
        }
    }

    /// Build a `DiscoverConfig`. No CLI flag overrides.
    pub fn to_discover_config(&self) -> Result<DiscoverConfig, ConfigError> {
        self.validate()?;

        Ok(DiscoverConfig {
            api_url: self.api_url.clone(),
            tls: self.tls(),
            timeout: Duration::from_secs(self.timeout),
            thresholds: StatusThresholds {
                fresh_secs: self.status.fresh_secs,
                stale_secs: self.status.stale_secs,
            },
            url_style: UrlStyle::from_include_port(self.navigation.include_port),
            opener: self.navigation.opener.clone(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, body: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.api_url, "https://api.melo.re");
    }

    #[test]
    fn file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            r#"
api_url = "http://localhost:9000"
timeout = 5

[navigation]
include_port = false
opener = "firefox"

[status]
fresh_secs = 10
"#,
        );

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.api_url, "http://localhost:9000");
        assert_eq!(cfg.timeout, 5);
        assert!(!cfg.navigation.include_port);
        assert_eq!(cfg.status.fresh_secs, 10);
        assert_eq!(cfg.status.stale_secs, 120);
        assert_eq!(cfg.defaults.output, "table");

        let discover = cfg.to_discover_config().unwrap();
        assert_eq!(discover.url_style, UrlStyle::HostOnly);
        assert_eq!(discover.timeout, Duration::from_secs(5));
        assert_eq!(discover.opener.as_deref(), Some("firefox"));
        assert_eq!(discover.thresholds.fresh_secs, 10);
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "[status]\nfresh_secs = 120\nstale_secs = 45\n");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "status"));
    }

    #[test]
    fn bad_url_rejected() {
        let cfg = Config {
            api_url: "not a url".into(),
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "api_url"
        ));
    }

    #[test]
    fn malformed_toml_is_figment_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "timeout = \"soon\"\n");
        assert!(matches!(load_config_from(&path), Err(ConfigError::Figment(_))));
    }

    #[test]
    fn tls_precedence() {
        let mut cfg = Config {
            ca_cert: Some(PathBuf::from("/etc/melo/ca.pem")),
            ..Config::default()
        };
        assert_eq!(cfg.tls(), TlsVerification::CustomCa("/etc/melo/ca.pem".into()));
        cfg.insecure = true;
        assert_eq!(cfg.tls(), TlsVerification::DangerAcceptInvalid);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");
        let cfg = Config {
            timeout: 12,
            ..Config::default()
        };

        save_config_to(&cfg, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("[status]"));
        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }
}
