use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, Result};
use mi_light_bridge::*;
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the host configuration file
    #[arg(short, long, global = true, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the configuration registers the platform
    Check,
    /// List the accessories and characteristics that would be exposed
    Accessories,
}

#[tokio::main]
#[instrument]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("RUST_LOG")
                .unwrap_or_else(|_| EnvFilter::new("mi_light_bridge=info,milight=info")),
        )
        .compact()
        .init();

    color_eyre::install()?;

    let cli = Cli::parse();
    debug!("Parsed command line arguments");

    let host = HostConfig::load(&cli.config)?;
    let Some(entry) = host.platform(PLATFORM_NAME) else {
        bail!(
            "{} has no \"{}\" platform entry",
            cli.config.display(),
            PLATFORM_NAME
        );
    };
    let platform = PlatformConfig::from_value(entry)?;

    match cli.command.unwrap_or(Commands::Check) {
        Commands::Check => check(&platform),
        Commands::Accessories => list_accessories(&platform),
    }

    Ok(())
}

/// Report which device entries are usable
fn check(platform: &PlatformConfig) {
    info!(
        "{} is configured with {} device entries",
        PLATFORM_NAME,
        platform.devices.len()
    );
    for (index, device) in platform.devices.iter().enumerate() {
        match device.credentials() {
            Some((ip, _)) => println!("device {index}: {ip} OK"),
            None => {
                warn!("Device entry {} is missing ip or token", index);
                println!("device {index}: skipped (missing ip or token)");
            }
        }
    }
}

/// Print the service layout of every accessory
fn list_accessories(platform: &PlatformConfig) {
    let mut count = 0;
    for device in platform.usable_devices() {
        let ip = device.ip.as_deref().unwrap_or_default();
        let Some(spec) = device::light_spec(device) else {
            println!("{ip}: no accessories");
            continue;
        };

        count += 1;
        println!("{ip}: {}", spec.name);
        for service in spec.services() {
            println!("  {:?} ({})", service.kind, service.kind.uuid());
            for characteristic in &service.characteristics {
                let bounds = characteristic
                    .effective_props()
                    .map(|p| format!(" [{}..{} step {}]", p.min_value, p.max_value, p.min_step))
                    .unwrap_or_default();
                let value = characteristic
                    .value
                    .as_ref()
                    .map(|v| format!(" = {v:?}"))
                    .unwrap_or_default();
                println!("    {:?}{}{}", characteristic.kind, bounds, value);
            }
        }
    }
    info!("{} accessories would be exposed", count);
}
