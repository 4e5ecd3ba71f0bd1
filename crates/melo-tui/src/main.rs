//! `melo-tui`: browse and manage discovered melo devices in the terminal.
//!
//! Built on [ratatui](https://ratatui.rs) over `melo-core`'s `Discover`
//! controller: the device list is fetched on start and on `r`, devices can
//! be deleted, and activating an interface opens its web UI in the browser.
//!
//! Logs go to a file (default `/tmp/melo-tui.log`) so they never corrupt the
//! terminal.

mod action;
mod app;
mod component;
mod data_bridge;
mod event;
mod screens;
#[cfg(test)]
mod test_util;
mod theme;
mod tui;
mod widgets;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use melo_core::{Discover, DiscoverConfig, Navigator};

use crate::app::App;
use crate::screens::discover::DiscoverScreen;

/// Terminal UI for the melo device discovery service.
#[derive(Parser, Debug)]
#[command(name = "melo-tui", version, about)]
struct Cli {
    /// Device service URL (e.g., https://api.melo.re)
    #[arg(short = 'u', long, env = "MELO_API_URL")]
    api_url: Option<String>,

    /// Config file path (defaults to the platform config directory)
    #[arg(long, env = "MELO_CONFIG")]
    config: Option<PathBuf>,

    /// Accept invalid TLS certificates
    #[arg(short = 'k', long)]
    insecure: bool,

    /// Log file path (defaults to /tmp/melo-tui.log)
    #[arg(long, default_value = "/tmp/melo-tui.log")]
    log_file: PathBuf,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// File-based tracing. Nothing may log to stdout/stderr while the UI owns
/// the terminal. Hold the returned guard until exit so logs get flushed.
fn setup_tracing(cli: &Cli) -> WorkerGuard {
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("melo_tui={log_level},melo_core={log_level},melo_api={log_level}"))
    });

    let log_dir = cli
        .log_file
        .parent()
        .unwrap_or(std::path::Path::new("/tmp"));
    let log_filename = cli
        .log_file
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("melo-tui.log"));

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .init();

    guard
}

/// Config file (or defaults), then `MELO_*` env, then flags.
fn load_config(cli: &Cli) -> Result<DiscoverConfig> {
    let path = cli.config.clone().unwrap_or_else(melo_config::config_path);
    let mut cfg = melo_config::load_config_from(&path)?;

    if let Some(ref url) = cli.api_url {
        cfg.api_url.clone_from(url);
    }
    if cli.insecure {
        cfg.insecure = true;
    }

    Ok(cfg.to_discover_config()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Hooks go in before the terminal is touched
    tui::install_hooks()?;

    let _log_guard = setup_tracing(&cli);

    let config = load_config(&cli)?;
    info!(api_url = %config.api_url, "starting melo-tui");

    let discover = Discover::from_config(&config)?;
    let navigator: Arc<dyn Navigator> = Arc::new(config.navigator());
    let screen = DiscoverScreen::new(config.thresholds, config.url_style);

    let mut app = App::new(discover, navigator, screen);
    app.run().await?;

    Ok(())
}
