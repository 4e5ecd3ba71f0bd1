//! CLI configuration: a thin wrapper around `melo_config` shared types.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--config, --api-url, --timeout, --insecure, --output, --color).

use std::path::PathBuf;

use clap::ValueEnum;

use melo_core::DiscoverConfig;

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Re-exports from shared crate ────────────────────────────────────

pub use melo_config::{Config, config_path, save_config_to};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Presentation settings after merging flags over config defaults.
#[derive(Debug, Clone, Copy)]
pub struct OutputOpts {
    pub format: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    pub yes: bool,
}

/// Config file in effect: `--config` / `MELO_CONFIG`, else the platform path.
pub fn active_path(global: &GlobalOpts) -> PathBuf {
    global.config.clone().unwrap_or_else(config_path)
}

/// Load the config file in effect, layered with `MELO_*` env vars.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    Ok(melo_config::load_config_from(&active_path(global))?)
}

/// Translate config + global flags into a `DiscoverConfig`.
///
/// CLI flag overrides take priority over file values.
pub fn resolve_discover(cfg: &Config, global: &GlobalOpts) -> Result<DiscoverConfig, CliError> {
    let mut cfg = cfg.clone();
    if let Some(ref url) = global.api_url {
        cfg.api_url.clone_from(url);
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout = timeout;
    }
    if global.insecure {
        cfg.insecure = true;
    }
    Ok(cfg.to_discover_config()?)
}

pub fn resolve_output(cfg: &Config, global: &GlobalOpts) -> OutputOpts {
    let format = global
        .output
        .or_else(|| OutputFormat::from_str(&cfg.defaults.output, true).ok())
        .unwrap_or(OutputFormat::Table);
    let color = global
        .color
        .or_else(|| ColorMode::from_str(&cfg.defaults.color, true).ok())
        .unwrap_or(ColorMode::Auto);

    OutputOpts {
        format,
        color: output::should_color(color),
        quiet: global.quiet,
        yes: global.yes,
    }
}
