//! Device command handlers.

use std::fmt::Write;

use tabled::Tabled;
use tracing::debug;

use melo_core::{
    CoreError, Device, Discover, DiscoverConfig, Interface, Navigator, interface_url,
};

use crate::cli::{DevicesArgs, DevicesCommand, OutputFormat};
use crate::config::OutputOpts;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Serial")]
    serial: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Description")]
    description: String,
    #[tabled(rename = "Icon")]
    icon: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last Update")]
    last_update: String,
    #[tabled(rename = "Addresses")]
    addresses: String,
}

struct RowContext<'a> {
    config: &'a DiscoverConfig,
    now: i64,
    color: bool,
}

impl DeviceRow {
    fn new(d: &Device, ctx: &RowContext<'_>) -> Self {
        Self {
            serial: d.serial.clone(),
            name: d.name.clone(),
            description: d.description.clone(),
            icon: d.icon.to_string(),
            status: output::paint_status(d.status_at(ctx.now, ctx.config.thresholds), ctx.color),
            last_update: melo_core::age_label(d.last_update, ctx.now),
            addresses: d
                .interfaces
                .iter()
                .filter_map(Interface::address)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

fn detail(d: &Device, ctx: &RowContext<'_>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Serial:      {}", d.serial);
    let _ = writeln!(out, "Name:        {}", d.name);
    let _ = writeln!(
        out,
        "Description: {}",
        if d.description.is_empty() { "-" } else { d.description.as_str() }
    );
    let _ = writeln!(out, "Icon:        {}", d.icon);
    let _ = writeln!(out, "Online:      {}", d.online);
    let _ = writeln!(
        out,
        "Status:      {}",
        output::paint_status(d.status_at(ctx.now, ctx.config.thresholds), ctx.color)
    );
    let _ = writeln!(
        out,
        "Last update: {} ({})",
        d.last_update_at()
            .map_or_else(|| "-".into(), |t| t.to_rfc3339()),
        melo_core::age_label(d.last_update, ctx.now)
    );
    let _ = writeln!(
        out,
        "HTTP port:   {}",
        d.http_port.map_or_else(|| "-".into(), |p| p.to_string())
    );
    let _ = writeln!(
        out,
        "HTTPS port:  {}",
        d.https_port.map_or_else(|| "-".into(), |p| p.to_string())
    );

    if d.interfaces.is_empty() {
        let _ = write!(out, "Interfaces:  -");
        return out;
    }
    let _ = write!(out, "Interfaces:");
    for iface in &d.interfaces {
        let url = interface_url(d, iface, ctx.config.url_style).unwrap_or_else(|| "-".into());
        let _ = write!(
            out,
            "\n  {} {:<8} {:<17} {}  {}",
            iface.kind,
            iface.name,
            iface.mac,
            iface.address_label(),
            url
        );
    }
    out
}

/// Pick the requested interface, or the first one with an address.
fn select_interface<'a>(device: &'a Device, key: Option<&str>) -> Result<&'a Interface, CoreError> {
    match key {
        Some(key) => device.interface(key).ok_or_else(|| CoreError::InterfaceNotFound {
            serial: device.serial.clone(),
            interface: key.into(),
        }),
        None => device
            .interfaces
            .iter()
            .find(|i| i.address().is_some())
            .ok_or_else(|| CoreError::NoAddress {
                interface: device
                    .interfaces
                    .first()
                    .map_or_else(|| device.serial.clone(), |i| i.name.clone()),
            }),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    discover: &Discover,
    config: &DiscoverConfig,
    args: DevicesArgs,
    opts: OutputOpts,
) -> Result<(), CliError> {
    let ctx = RowContext {
        config,
        now: util::now(),
        color: opts.color,
    };

    match args.command {
        DevicesCommand::List { online } => {
            let devices = discover.load().await?;
            let shown: Vec<Device> = devices
                .iter()
                .filter(|d| !online || d.online)
                .cloned()
                .collect();

            if shown.is_empty() && opts.format == OutputFormat::Table {
                output::print_output("No devices!", opts.quiet);
                return Ok(());
            }

            let out = output::render_list(
                opts.format,
                &shown,
                |d| DeviceRow::new(d, &ctx),
                |d| d.serial.clone(),
            )?;
            output::print_output(&out, opts.quiet);
            Ok(())
        }

        DevicesCommand::Get { serial } => {
            let devices = discover.load().await?;
            let device = melo_core::find_device(&devices, &serial)?;
            let out = output::render_single(
                opts.format,
                device,
                |d| detail(d, &ctx),
                |d| d.serial.clone(),
            )?;
            output::print_output(&out, opts.quiet);
            Ok(())
        }

        DevicesCommand::Delete { serial } => {
            if !util::confirm(&format!("Delete device {serial}?"), "devices delete", opts.yes)? {
                return Ok(());
            }
            discover.delete(&serial).await?;
            if !opts.quiet {
                eprintln!("Device {serial} deleted");
            }
            Ok(())
        }

        DevicesCommand::Url {
            serial,
            iface,
            open,
        } => {
            let devices = discover.load().await?;
            let device = melo_core::find_device(&devices, &serial)?;
            let chosen = select_interface(device, iface.as_deref())?;
            let url = interface_url(device, chosen, config.url_style).ok_or_else(|| {
                CliError::NoAddress {
                    interface: chosen.name.clone(),
                }
            })?;

            output::print_output(&url, opts.quiet);
            if open {
                debug!(url, "opening interface");
                config.navigator().navigate(&url)?;
            }
            Ok(())
        }
    }
}
