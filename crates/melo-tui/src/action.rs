//! Everything that can happen in the UI. Actions are the only way state changes.

use std::fmt;

use melo_core::ViewState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Short-lived message shown in the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            level: NotificationLevel::Error,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // ── Lifecycle ──
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Overlays ──
    ToggleHelp,
    Notify(Notification),
    DismissNotification,

    // ── Device list ──
    /// Re-fetch the device list.
    Refresh,
    /// The discover controller published a new state.
    StateChanged(ViewState),
    /// Delete the device with this serial.
    RequestDelete(String),
    /// Open this interface URL in the browser.
    OpenUrl(String),
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StateChanged(state) => write!(f, "StateChanged({})", state_label(state)),
            Self::RequestDelete(serial) => write!(f, "RequestDelete({serial})"),
            Self::OpenUrl(url) => write!(f, "OpenUrl({url})"),
            other => write!(f, "{other:?}"),
        }
    }
}

fn state_label(state: &ViewState) -> String {
    match state {
        ViewState::Idle => "idle".into(),
        ViewState::Loading => "loading".into(),
        ViewState::Loaded(devices) => format!("loaded: {}", devices.len()),
        ViewState::Failed(_) => "failed".into(),
    }
}
