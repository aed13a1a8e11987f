//! `sos-dispatch`: runs one alert dispatcher invocation.
//!
//! ```text
//! sos-dispatch --path sos_alerts/d1/a1 --endpoint https://push.example/v1/messages:send record.json
//! echo '{"location":{"latitude":41.0}}' | sos-dispatch --path sos_alerts/d1/a1
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use agentvisor::dispatch::{AlertDispatcher, HttpPublisher};
use agentvisor::{DispatcherConfig, load_yaml};
use anyhow::{Context, Result, bail};
use clap::Parser;
use tokio::io::AsyncReadExt;

#[derive(Parser)]
#[command(name = "sos-dispatch")]
#[command(version, about = "Publish one SOS alert record to the alert topic", long_about = None)]
struct Cli {
    /// Store path of the appended record (`sos_alerts/{deviceId}/{alertId}`)
    #[arg(long)]
    path: String,

    /// Push endpoint; overrides `endpoint` from the config file
    #[arg(long)]
    endpoint: Option<String>,

    /// Environment variable holding the bearer token
    #[arg(long, value_name = "VAR")]
    token_env: Option<String>,

    /// YAML dispatcher configuration
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (overridden by RUST_LOG)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Record JSON file; stdin when omitted or `-`
    record: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    let mut cfg = match &cli.config {
        Some(path) => load_yaml::<DispatcherConfig>(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => DispatcherConfig::default(),
    };
    if let Some(endpoint) = cli.endpoint {
        cfg.endpoint = Some(endpoint);
    }
    let Some(endpoint) = cfg.endpoint.clone() else {
        bail!("No push endpoint configured (use --endpoint or `endpoint` in the config file)");
    };

    let mut publisher = HttpPublisher::new(endpoint).context("Failed to create publisher")?;
    if let Some(var) = &cli.token_env {
        let token = std::env::var(var).with_context(|| format!("{var} is not set"))?;
        publisher = publisher.with_bearer_token(token);
    }

    let raw = read_record(cli.record.as_ref()).await?;
    let dispatcher = AlertDispatcher::new(cfg, Arc::new(publisher));
    let id = dispatcher
        .handle_json(&cli.path, &raw)
        .await
        .with_context(|| format!("Dispatch failed for {}", cli.path))?;

    println!("{id}");
    Ok(())
}

async fn read_record(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(p) if p.as_os_str() != "-" => tokio::fs::read_to_string(p)
            .await
            .with_context(|| format!("Failed to read {}", p.display())),
        _ => {
            let mut buf = String::new();
            tokio::io::stdin()
                .read_to_string(&mut buf)
                .await
                .context("Failed to read record from stdin")?;
            Ok(buf)
        }
    }
}

fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    Ok(())
}
