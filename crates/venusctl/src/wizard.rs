//! Interactive setup: discover devices, probe the pick, write a config.

use anyhow::{bail, Context, Result};
use dialoguer::{Input, Select};
use owo_colors::OwoColorize;
use std::path::Path;
use std::time::Duration;
use venusconf::VenusConfig;

const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(2);
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);
const DEFAULT_PORT: u16 = 30000;

pub async fn run(output: &Path) -> Result<()> {
    println!("Scanning for devices on port {DEFAULT_PORT}...");
    let devices = venuslink::discover(DEFAULT_PORT, DISCOVERY_TIMEOUT)
        .await
        .context("Discovery broadcast failed")?;

    let mut items: Vec<String> = devices.iter().map(|d| d.label()).collect();
    items.push("Enter IP manually".to_string());

    let pick = Select::new()
        .with_prompt("Device")
        .items(&items)
        .default(0)
        .interact()
        .context("Selection cancelled")?;

    let (host, port) = if pick == devices.len() {
        let host: String = Input::new()
            .with_prompt("Host")
            .interact_text()
            .context("Input cancelled")?;
        let port: u16 = Input::new()
            .with_prompt("Port")
            .default(DEFAULT_PORT)
            .interact_text()
            .context("Input cancelled")?;
        (host, port)
    } else {
        (devices[pick].ip.clone(), DEFAULT_PORT)
    };

    println!("Probing {host}:{port}...");
    if !venuslink::probe(&host, port, PROBE_TIMEOUT).await {
        bail!("Cannot connect to {}:{}", host, port);
    }
    println!("{}", "Device answered.".green());

    let mut config = VenusConfig::default();
    config.device.host = host;
    config.device.port = port;

    std::fs::write(output, config.to_toml())
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Wrote {}", output.display().bold());
    println!("Try: venusctl watch --config {}", output.display());
    Ok(())
}
