// ── Device domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use super::status::{LinkStatus, StatusThresholds};
use crate::error::CoreError;

/// Device category reported in the `icon` tag.
///
/// Closed lookup: any tag the service sends that is not listed here maps
/// to [`DeviceIcon::Unknown`].
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeviceIcon {
    Living,
    Kitchen,
    Bed,
    #[default]
    Unknown,
}

impl DeviceIcon {
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or_default()
    }
}

/// Link type of a network interface (the wire `type` field).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum InterfaceKind {
    Ethernet,
    Wifi,
    #[default]
    Other,
}

impl InterfaceKind {
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or_default()
    }
}

/// A network interface of a [`Device`]. Read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interface {
    pub mac: String,
    pub name: String,
    pub kind: InterfaceKind,
    /// Never `Some("")`: empty addresses are normalized to `None`.
    pub ipv4: Option<String>,
    pub ipv6: Option<String>,
}

impl Interface {
    /// The address used for navigation. IPv4 wins over IPv6.
    pub fn address(&self) -> Option<&str> {
        self.ipv4.as_deref().or(self.ipv6.as_deref())
    }

    /// `ipv4 - ipv6`, with missing sides left blank.
    pub fn address_label(&self) -> String {
        format!(
            "{} - {}",
            self.ipv4.as_deref().unwrap_or_default(),
            self.ipv6.as_deref().unwrap_or_default()
        )
    }
}

/// A device registered with the discovery service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub serial: String,
    pub name: String,
    pub description: String,
    pub icon: DeviceIcon,
    pub online: bool,
    /// Seconds since the Unix epoch.
    pub last_update: i64,
    /// Never `Some(0)`.
    pub http_port: Option<u16>,
    pub https_port: Option<u16>,
    pub interfaces: Vec<Interface>,
}

impl Device {
    /// Port used for navigation. HTTPS wins over HTTP.
    pub fn web_port(&self) -> Option<u16> {
        self.https_port.or(self.http_port)
    }

    pub fn last_update_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.last_update, 0)
    }

    /// Freshness relative to `now` (epoch seconds).
    pub fn status_at(&self, now: i64, thresholds: StatusThresholds) -> LinkStatus {
        LinkStatus::classify(self.online, self.last_update, now, thresholds)
    }

    /// Look up an interface by MAC address or name.
    pub fn interface(&self, key: &str) -> Option<&Interface> {
        self.interfaces
            .iter()
            .find(|i| i.mac.eq_ignore_ascii_case(key) || i.name == key)
    }
}

/// Look up a device by serial.
pub fn find_device<'a>(devices: &'a [Device], serial: &str) -> Result<&'a Device, CoreError> {
    devices
        .iter()
        .find(|d| d.serial == serial)
        .ok_or_else(|| CoreError::DeviceNotFound {
            serial: serial.into(),
        })
}

/// Order devices most recently seen first. Stable for equal timestamps.
pub fn sort_by_last_update(devices: &mut [Device]) {
    devices.sort_by(|a, b| b.last_update.cmp(&a.last_update));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(serial: &str, last_update: i64) -> Device {
        Device {
            serial: serial.into(),
            name: serial.into(),
            description: String::new(),
            icon: DeviceIcon::Unknown,
            online: true,
            last_update,
            http_port: None,
            https_port: None,
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
    fn icon_lookup_is_closed() {
        assert_eq!(DeviceIcon::from_tag("living"), DeviceIcon::Living);
        assert_eq!(DeviceIcon::from_tag("kitchen"), DeviceIcon::Kitchen);
        assert_eq!(DeviceIcon::from_tag("bed"), DeviceIcon::Bed);
        assert_eq!(DeviceIcon::from_tag("garage"), DeviceIcon::Unknown);
        assert_eq!(DeviceIcon::from_tag(""), DeviceIcon::Unknown);
    }

    #[test]
    fn interface_kind_lookup_is_closed() {
        assert_eq!(InterfaceKind::from_tag("ethernet"), InterfaceKind::Ethernet);
        assert_eq!(InterfaceKind::from_tag("wifi"), InterfaceKind::Wifi);
        assert_eq!(InterfaceKind::from_tag("lte"), InterfaceKind::Other);
    }

    #[test]
    fn sorts_most_recent_first() {
        let mut devices = vec![device("a", 10), device("b", 30), device("c", 20)];
        sort_by_last_update(&mut devices);
        let order: Vec<_> = devices.iter().map(|d| d.serial.as_str()).collect();
        assert_eq!(order, ["b", "c", "a"]);
    }

    #[test]
    fn sort_keeps_ties_in_arrival_order() {
        let mut devices = vec![device("a", 5), device("b", 5), device("c", 9)];
        sort_by_last_update(&mut devices);
        let order: Vec<_> = devices.iter().map(|d| d.serial.as_str()).collect();
        assert_eq!(order, ["c", "a", "b"]);
    }

    #[test]
    fn ipv4_preferred_over_ipv6() {
        assert_eq!(iface(Some("10.0.0.5"), Some("fe80::1")).address(), Some("10.0.0.5"));
        assert_eq!(iface(None, Some("fe80::1")).address(), Some("fe80::1"));
        assert_eq!(iface(None, None).address(), None);
    }

    #[test]
    fn address_label_leaves_gaps() {
        assert_eq!(iface(Some("10.0.0.5"), None).address_label(), "10.0.0.5 - ");
        assert_eq!(iface(None, Some("fe80::1")).address_label(), " - fe80::1");
    }

    #[test]
    fn web_port_prefers_https() {
        let mut dev = device("a", 0);
        dev.http_port = Some(80);
        assert_eq!(dev.web_port(), Some(80));
        dev.https_port = Some(443);
        assert_eq!(dev.web_port(), Some(443));
    }

    #[test]
    fn interface_lookup_by_mac_or_name() {
        let mut dev = device("a", 0);
        dev.interfaces.push(iface(Some("10.0.0.5"), None));
        assert!(dev.interface("AA:BB:CC:DD:EE:FF").is_some());
        assert!(dev.interface("eth0").is_some());
        assert!(dev.interface("wlan0").is_none());
    }

    #[test]
    fn device_lookup_by_serial() {
        let devices = vec![device("a", 0), device("b", 0)];
        assert_eq!(find_device(&devices, "b").map(|d| d.serial.as_str()).ok(), Some("b"));
        assert!(matches!(
            find_device(&devices, "zz"),
            Err(CoreError::DeviceNotFound { serial }) if serial == "zz"
        ));
    }
}
