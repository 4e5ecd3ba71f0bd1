//! `melo`: list, inspect, open and delete discovered melo devices.

mod cli;
mod commands;
mod config;
mod error;
mod output;

use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use melo_core::Discover;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    match dispatch(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

/// Diagnostics go to stderr so stdout stays clean for `--output json`.
/// `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = ["warn", "info", "debug"]
        .get(usize::from(verbose))
        .copied()
        .unwrap_or("trace");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("melo={level},melo_core={level},melo_api={level}"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn dispatch(cli: Cli) -> Result<(), CliError> {
    let Cli { global, command } = cli;

    match command {
        Command::Config(args) => commands::config_cmd::handle(args, &global),

        Command::Completions(args) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "melo", &mut std::io::stdout());
            Ok(())
        }

        Command::Devices(args) => {
            let file = config::load(&global)?;
            let discover_config = config::resolve_discover(&file, &global)?;
            let opts = config::resolve_output(&file, &global);
            let discover = Discover::from_config(&discover_config)?;

            debug!(command = ?args.command, api_url = %discover_config.api_url, "dispatching");
            commands::devices::handle(&discover, &discover_config, args, opts).await
        }
    }
}
