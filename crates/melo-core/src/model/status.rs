// ── Link freshness policy ──

use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::Display;

/// How recently a device checked in, as shown by the status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LinkStatus {
    /// Online and seen within the fresh window (green).
    Fresh,
    /// Online and seen within the stale window (orange).
    Stale,
    /// Offline, or silent longer than the stale window (red).
    Lost,
}

/// Freshness windows, in seconds. `fresh_secs < stale_secs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusThresholds {
    pub fresh_secs: u64,
    pub stale_secs: u64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            fresh_secs: 45,
            stale_secs: 120,
        }
    }
}

impl LinkStatus {
    /// Classify a device given the current time in epoch seconds.
    pub fn classify(online: bool, last_update: i64, now: i64, thresholds: StatusThresholds) -> Self {
        if !online {
            return Self::Lost;
        }
        let age = now.saturating_sub(last_update);
        if age < to_i64(thresholds.fresh_secs) {
            Self::Fresh
        } else if age < to_i64(thresholds.stale_secs) {
            Self::Stale
        } else {
            Self::Lost
        }
    }
}

/// "12s ago", "3m 5s ago"; "in the future" when the clocks disagree.
pub fn age_label(last_update: i64, now: i64) -> String {
    match u64::try_from(now.saturating_sub(last_update)) {
        Ok(secs) => format!("{} ago", humantime::format_duration(Duration::from_secs(secs))),
        Err(_) => "in the future".into(),
    }
}

fn to_i64(secs: u64) -> i64 {
    i64::try_from(secs).unwrap_or(i64::MAX)
}
