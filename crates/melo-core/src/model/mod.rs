// ── Discover domain model ──
//
// Canonical representation of what the discovery service reports. Wire
// records from melo-api are normalized into these types (see `convert`)
// before any front end sees them.

pub mod device;
pub mod status;

// ── Re-exports ──────────────────────────────────────────────────────

pub use device::{Device, DeviceIcon, Interface, InterfaceKind, find_device, sort_by_last_update};
pub use status::{LinkStatus, StatusThresholds, age_label};
