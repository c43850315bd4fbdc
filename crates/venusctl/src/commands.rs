//! Subcommand implementations.

use anyhow::{bail, Context, Result};
use owo_colors::OwoColorize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use venusconf::VenusConfig;
use venuslink::{DiagnosticsReport, Scheduler};
use venusproto::DeviceMode;

fn load_config(path: Option<&Path>) -> Result<VenusConfig> {
    let config = VenusConfig::load_from(path).context("Failed to load configuration")?;
    if config.device.host.is_empty() {
        bail!("No device host configured; run `venusctl setup` or set VENUSLINK_HOST");
    }
    Ok(config)
}

pub async fn discover(port: u16, timeout: f64) -> Result<()> {
    let devices = venuslink::discover(port, Duration::from_secs_f64(timeout))
        .await
        .context("Discovery broadcast failed")?;

    if devices.is_empty() {
        println!("{}", "No devices answered.".yellow());
        return Ok(());
    }

    for device in &devices {
        println!("{}", device.label().green());
    }
    println!("{} device(s) found", devices.len());
    Ok(())
}

pub async fn probe(host: &str, port: u16, timeout: f64) -> Result<()> {
    if venuslink::probe(host, port, Duration::from_secs_f64(timeout)).await {
        println!("{} {}:{}", "reachable".green(), host, port);
        Ok(())
    } else {
        bail!("No response from {}:{}", host, port);
    }
}

pub async fn watch(config: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config)?;
    let scheduler = Scheduler::new(&config.device, &config.schedule);

    println!(
        "Watching {}:{} (tick every {}s, ctrl-c to stop)",
        config.device.host, config.device.port, config.schedule.loop_interval
    );

    let mut interval = tokio::time::interval(config.schedule.loop_interval());
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let snapshot = scheduler.tick().await;
                if json {
                    println!("{}", serde_json::to_string(&snapshot)?);
                } else {
                    render(&snapshot);
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    scheduler.close().await;
    println!("\nStopped.");
    Ok(())
}

/// One readings block per tick; null readings render as "-".
fn render(snapshot: &venuslink::DeviceSnapshot) {
    let ts = snapshot
        .ts
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_default();
    println!("\n{}", ts.bold());

    for reading in venuslink::extract(snapshot) {
        let value = match &reading.value {
            Value::Null => "-".to_string(),
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        match reading.unit {
            Some(unit) => println!("  {:<26} {} {}", reading.key, value, unit),
            None => println!("  {:<26} {}", reading.key, value),
        }
    }
}

pub async fn set_mode(config: Option<&Path>, mode: &str) -> Result<()> {
    let config = load_config(config)?;
    let scheduler = Scheduler::new(&config.device, &config.schedule);

    let ok = scheduler.set_mode(mode).await;
    let snapshot = scheduler.snapshot().await;
    scheduler.close().await;

    if ok {
        println!("{} mode is now {}", "verified".green(), mode.bold());
        return Ok(());
    }

    if let Some(detail) = snapshot.last_error {
        eprintln!("{}", serde_json::to_string_pretty(&detail)?);
    }
    let supported: Vec<&str> = DeviceMode::all().map(|m| m.name()).collect();
    bail!(
        "Mode change to {:?} failed (supported modes: {})",
        mode,
        supported.join(", ")
    );
}

pub async fn diag(config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let scheduler = Scheduler::new(&config.device, &config.schedule);

    // One tick so the report reflects a live exchange, not just defaults.
    scheduler.tick().await;
    let report = DiagnosticsReport::collect(&scheduler, &config.device, &config.schedule).await;
    scheduler.close().await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
