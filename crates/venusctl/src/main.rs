//! venusctl - poll and configure a Marstek Venus battery over the local UDP API
//!
//! Subcommands:
//! - `venusctl discover` - Broadcast-scan the local network for devices
//! - `venusctl probe <host>` - One-shot connectivity check
//! - `venusctl setup` - Interactive wizard; writes a config file
//! - `venusctl watch` - Poll on a timer and render readings
//! - `venusctl set-mode <mode>` - Change the operating mode, verified
//! - `venusctl diag` - Diagnostics report after one poll

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod wizard;

#[derive(Parser)]
#[command(name = "venusctl")]
#[command(about = "Local UDP control for the Marstek Venus battery")]
#[command(version)]
struct Cli {
    /// Config file (overrides ./venuslink.toml)
    #[arg(short, long, global = true, env = "VENUSLINK_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Broadcast-scan the local network for devices
    Discover {
        /// UDP port to broadcast to
        #[arg(long, default_value_t = 30000)]
        port: u16,

        /// Collection window in seconds
        #[arg(long, default_value_t = 2.0)]
        timeout: f64,
    },

    /// One-shot connectivity check against a device
    Probe {
        /// Device IP or hostname
        host: String,

        /// UDP port of the local API
        #[arg(long, default_value_t = 30000)]
        port: u16,

        /// Probe timeout in seconds
        #[arg(long, default_value_t = 2.0)]
        timeout: f64,
    },

    /// Interactive setup: discover, pick a device, probe, write a config
    Setup {
        /// Where to write the config file
        #[arg(short, long, default_value = "venuslink.toml")]
        output: PathBuf,
    },

    /// Poll the device on a timer and render readings
    Watch {
        /// Print raw snapshot JSON per tick instead of the readings table
        #[arg(long)]
        json: bool,
    },

    /// Change the operating mode, verified against a read-back
    SetMode {
        /// Target mode (Auto, AI, Manual)
        mode: String,
    },

    /// Print a diagnostics report after one poll
    Diag,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Discover { port, timeout } => commands::discover(port, timeout).await,
        Commands::Probe {
            host,
            port,
            timeout,
        } => commands::probe(&host, port, timeout).await,
        Commands::Setup { output } => wizard::run(&output).await,
        Commands::Watch { json } => commands::watch(config, json).await,
        Commands::SetMode { mode } => commands::set_mode(config, &mode).await,
        Commands::Diag => commands::diag(config).await,
    }
}
