//! View logic between `melo-api` and UI consumers (CLI / TUI).
//!
//! - **[`Discover`]**: owns the device list as an explicit [`ViewState`]
//!   (`Idle` / `Loading` / `Loaded` / `Failed`) published through a `watch`
//!   channel. [`refresh()`](Discover::refresh) supersedes any in-flight fetch;
//!   [`delete()`](Discover::delete) removes a device by serial once the
//!   service confirms.
//!
//! - **Domain model** ([`model`]): `Device` / `Interface` with closed icon
//!   and interface-kind lookups, plus the [`LinkStatus`] freshness policy.
//!
//! - **Navigation** ([`navigate`]): builds the web URL for an interface and
//!   hands it to an injectable [`Navigator`].

pub mod config;
pub mod convert;
pub mod discover;
pub mod error;
pub mod model;
pub mod navigate;
pub mod source;

// ── Primary re-exports ──────────────────────────────────────────────
pub use config::{DiscoverConfig, TlsVerification};
pub use discover::{Discover, ViewState};
pub use error::CoreError;
pub use navigate::{Navigator, SystemBrowser, UrlStyle, interface_url};
pub use source::DeviceSource;

pub use model::{
    Device, DeviceIcon, Interface, InterfaceKind, LinkStatus, StatusThresholds,
    age_label, find_device, sort_by_last_update,
};
