//! Glyphs for device and interface tags. Unknown tags get a neutral glyph.

use melo_core::{DeviceIcon, InterfaceKind};

pub fn device_glyph(icon: DeviceIcon) -> &'static str {
    match icon {
        DeviceIcon::Living => "⌂",
        DeviceIcon::Kitchen => "♨",
        DeviceIcon::Bed => "☾",
        DeviceIcon::Unknown => "◇",
    }
}

pub fn interface_glyph(kind: InterfaceKind) -> &'static str {
    match kind {
        InterfaceKind::Ethernet => "⇌",
        InterfaceKind::Wifi => "≈",
        InterfaceKind::Other => "·",
    }
}
