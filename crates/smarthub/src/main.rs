//! smarthub command-line client.
//!
//! Connects to a hub, runs one session and exits with 0 when the hub
//! ends the session cleanly (204) or 99 on any failure.
//!
//! # Usage
//!
//! ```bash
//! smarthub http://localhost:9998 ef0
//! smarthub --json-logs --config hub.json http://localhost:9998 0x2a
//! RUST_LOG=smarthub=debug smarthub http://localhost:9998 ef0
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use smarthub::prelude::*;
use tracing_subscriber::EnvFilter;

/// Exit code for every kind of failure.
const EXIT_FAILURE: u8 = 99;

#[derive(Parser)]
#[command(name = "smarthub")]
#[command(about = "Smart-home hub client")]
#[command(version)]
struct Cli {
    /// Hub endpoint URL
    url: String,

    /// This client's hub address, in hex (optional 0x prefix)
    #[arg(value_parser = parse_hub_address)]
    hub_address: Address,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// JSON configuration file
    #[arg(long, env = "SMARTHUB_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version land here too and are not failures.
            let code = if err.use_stderr() { EXIT_FAILURE } else { 0 };
            let _ = err.print();
            return ExitCode::from(code);
        }
    };

    init_tracing(&cli);

    match run(cli) {
        Ok(summary) => {
            tracing::info!(
                devices = summary.devices,
                rounds = summary.stats.rounds,
                exchanges = summary.stats.exchanges,
                "done"
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "session failed");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn init_tracing(cli: &Cli) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if cli.json_logs {
        builder.json().init();
    } else {
        builder.compact().init();
    }
}

fn run(cli: Cli) -> Result<SessionSummary> {
    let config = match &cli.config {
        Some(path) => HubConfig::from_json_file(path)?,
        None => HubConfig::default(),
    }
    .validated()?;

    let transport = HttpTransport::with_timeout(&cli.url, config.http.timeout())
        .with_context(|| format!("cannot use endpoint {}", cli.url))?;

    // One logical thread: the only await points are transport calls.
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start runtime")?;

    let summary = runtime.block_on(async {
        let mut client = HubClientBuilder::new(cli.hub_address)
            .config(config)
            .build(transport);
        client.run().await
    })?;

    Ok(summary)
}
