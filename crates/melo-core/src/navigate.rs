// ── Interface navigation ──
//
// Turns an interface into the URL of its web UI and hands that URL to a
// `Navigator`. Opening a browser is a side effect, so front ends inject
// the navigator and tests substitute a recording closure.

use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::model::{Device, Interface};

/// Whether interface URLs carry the device port.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlStyle {
    /// `http://<addr>:<https_port-or-http_port>`
    #[default]
    WithPort,
    /// `http://<addr>`
    HostOnly,
}

impl UrlStyle {
    pub fn from_include_port(include_port: bool) -> Self {
        if include_port { Self::WithPort } else { Self::HostOnly }
    }
}

/// Build the web URL for `iface` on `device`.
///
/// The address goes in verbatim, so an IPv6 address is not bracketed.
/// Returns `None` when the interface has no address at all; the port is
/// omitted when the device advertises none.
pub fn interface_url(device: &Device, iface: &Interface, style: UrlStyle) -> Option<String> {
    let address = iface.address()?;
    let url = match (style, device.web_port()) {
        (UrlStyle::WithPort, Some(port)) => format!("http://{address}:{port}"),
        _ => format!("http://{address}"),
    };
    Some(url)
}

// ── Navigator ───────────────────────────────────────────────────────

/// Something that can open a URL.
pub trait Navigator: Send + Sync {
    fn navigate(&self, url: &str) -> Result<(), CoreError>;
}

impl<F> Navigator for F
where
    F: Fn(&str) -> Result<(), CoreError> + Send + Sync,
{
    fn navigate(&self, url: &str) -> Result<(), CoreError> {
        self(url)
    }
}

/// Opens URLs with the platform's default browser launcher.
#[derive(Debug, Clone, Default)]
pub struct SystemBrowser {
    opener: Option<String>,
}

impl SystemBrowser {
    /// `opener` overrides the platform launcher (`xdg-open`, `open`, `start`).
    pub fn new(opener: Option<String>) -> Self {
        Self {
            opener: opener.filter(|o| !o.trim().is_empty()),
        }
    }

    fn command(&self, url: &str) -> Command {
        if let Some(opener) = &self.opener {
            let mut cmd = Command::new(opener);
            cmd.arg(url);
            return cmd;
        }
        if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(url);
            cmd
        } else if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", "", url]);
            cmd
        } else {
            let mut cmd = Command::new("xdg-open");
            cmd.arg(url);
            cmd
        }
    }
}

impl Navigator for SystemBrowser {
    fn navigate(&self, url: &str) -> Result<(), CoreError> {
        let mut cmd = self.command(url);
        debug!(program = ?cmd.get_program(), url, "launching browser");

        let mut child = cmd
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| CoreError::Navigation {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;

        // Reap the launcher without blocking the caller.
        std::thread::spawn(move || child.wait());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::model::{DeviceIcon, InterfaceKind};

    fn device(http_port: Option<u16>, https_port: Option<u16>) -> Device {
        Device {
            serial: "MELO-0001".into(),
            name: "Living room".into(),
            description: String::new(),
            icon: DeviceIcon::Living,
            online: true,
            last_update: 0,
            http_port,
            https_port,
            interfaces: Vec::new(),
        }
    }

    fn iface(ipv4: Option<&str>, ipv6: Option<&str>) -> Interface {
        Interface {
            mac: "aa:bb:cc:dd:ee:ff".into(),
            name: "eth0".into(),
            kind: InterfaceKind::Ethernet,
            ipv4: ipv4.map(Into::into),
            ipv6: ipv6.map(Into::into),
        }
    }

    #[test]
    fn ipv4_with_https_port() {
        let url = interface_url(
            &device(Some(80), Some(443)),
            &iface(Some("10.0.0.5"), Some("fe80::1")),
            UrlStyle::WithPort,
        );
        assert_eq!(url.as_deref(), Some("http://10.0.0.5:443"));
    }

    #[test]
    fn ipv6_is_not_bracketed() {
        let url = interface_url(
            &device(Some(8080), None),
            &iface(None, Some("fe80::1")),
            UrlStyle::WithPort,
        );
        assert_eq!(url.as_deref(), Some("http://fe80::1:8080"));
    }

    #[test]
    fn host_only_drops_port() {
        let url = interface_url(
            &device(Some(80), Some(443)),
            &iface(Some("10.0.0.5"), None),
            UrlStyle::HostOnly,
        );
        assert_eq!(url.as_deref(), Some("http://10.0.0.5"));
    }

    #[test]
    fn missing_port_is_omitted() {
        let url = interface_url(&device(None, None), &iface(Some("10.0.0.5"), None), UrlStyle::WithPort);
        assert_eq!(url.as_deref(), Some("http://10.0.0.5"));
    }

    #[test]
    fn no_address_no_url() {
        assert_eq!(
            interface_url(&device(Some(80), None), &iface(None, None), UrlStyle::WithPort),
            None
        );
    }

    #[test]
    fn include_port_maps_to_style() {
        assert_eq!(UrlStyle::from_include_port(true), UrlStyle::WithPort);
        assert_eq!(UrlStyle::from_include_port(false), UrlStyle::HostOnly);
    }

    #[test]
    fn closures_are_navigators() {
        let seen = Mutex::new(Vec::new());
        let nav = |url: &str| -> Result<(), CoreError> {
            seen.lock().unwrap().push(url.to_owned());
            Ok(())
        };
        nav.navigate("http://10.0.0.5:443").unwrap();
        assert_eq!(*seen.lock().unwrap(), ["http://10.0.0.5:443"]);
    }

    #[test]
    fn missing_opener_is_a_navigation_error() {
        let browser = SystemBrowser::new(Some("/nonexistent/melo-opener".into()));
        let err = browser.navigate("http://10.0.0.5").unwrap_err();
        assert!(matches!(err, CoreError::Navigation { ref url, .. } if url == "http://10.0.0.5"));
    }

    #[test]
    fn blank_opener_falls_back_to_platform() {
        let browser = SystemBrowser::new(Some("  ".into()));
        assert!(browser.opener.is_none());
    }
}
