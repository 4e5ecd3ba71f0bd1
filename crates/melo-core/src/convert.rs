// ── API-to-domain type conversions ──
//
// Bridges raw `melo_api` response types into canonical `melo_core::model`
// domain types. Empty strings and zero ports are treated as absent so the
// rest of the crate only ever sees `None`.

use melo_api::{DeviceResponse, InterfaceResponse};

use crate::model::{Device, DeviceIcon, Interface, InterfaceKind};

// ── Helpers ────────────────────────────────────────────────────────

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty())
}

fn non_zero(port: Option<u16>) -> Option<u16> {
    port.filter(|p| *p != 0)
}

// ── Conversions ────────────────────────────────────────────────────

impl From<InterfaceResponse> for Interface {
    fn from(raw: InterfaceResponse) -> Self {
        Self {
            kind: InterfaceKind::from_tag(&raw.kind),
            mac: raw.mac,
            name: raw.name,
            ipv4: non_empty(raw.ipv4),
            ipv6: non_empty(raw.ipv6),
        }
    }
}

impl From<DeviceResponse> for Device {
    fn from(raw: DeviceResponse) -> Self {
        Self {
            icon: DeviceIcon::from_tag(&raw.icon),
            serial: raw.serial,
            name: raw.name,
            description: raw.description,
            online: raw.online,
            last_update: raw.last_update,
            http_port: non_zero(raw.http_port),
            https_port: non_zero(raw.https_port),
            interfaces: raw.ifaces.into_iter().map(Interface::from).collect(),
        }
    }
}
