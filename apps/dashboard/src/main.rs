mod config;
mod console;

use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{DashboardApi, DashboardRuntime};
use tokio::{io::BufReader, sync::broadcast::error::RecvError};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(about = "Touchless imaging dashboard driven by recognized intents")]
struct Args {
    /// Backend base url, e.g. http://127.0.0.1:5000
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
    /// Replace the live channel with simulated telemetry.
    #[arg(long)]
    simulate: bool,
    #[arg(long)]
    log_filter: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let loaded = load_settings(args.config.as_deref());
    let mut settings = loaded.settings;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    if args.simulate {
        settings.simulation = true;
    }
    if args.log_filter.is_some() {
        settings.log_filter = args.log_filter;
    }

    init_tracing(&settings);
    for warning in &loaded.warnings {
        warn!("config: {warning}");
    }

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    let result = runtime.block_on(run(settings));
    // stdin reads park a blocking thread that would otherwise hold shutdown
    runtime.shutdown_timeout(Duration::from_millis(200));
    result
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(settings.log_filter.as_deref().unwrap_or("info")))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(settings: Settings) -> Result<()> {
    let api = DashboardApi::new(&settings.server_url)
        .with_context(|| format!("invalid server url '{}'", settings.server_url))?;
    let dashboard = DashboardRuntime::new(api, settings.runtime_config()?)?;
    let handle = dashboard.handle();
    let mut updates = dashboard.subscribe_updates();
    let dashboard_task = tokio::spawn(dashboard.run());

    let printer = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(update) => {
                    if let Some(line) = console::describe(&update) {
                        println!("{line}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "console: dropped updates"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    println!("type 'help' for commands");
    let console_task = tokio::spawn(console::run_console(
        BufReader::new(tokio::io::stdin()),
        handle.clone(),
    ));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("dashboard: interrupted"),
        finished = console_task => {
            if let Ok(Err(err)) = finished {
                warn!(error = %err, "console: input failed");
            }
        }
    }

    handle.shutdown();
    let last = dashboard_task.await.context("dashboard task failed")?;
    let _ = printer.await;
    info!(
        images = last.images.len(),
        selected = last.selected.as_deref().unwrap_or("-"),
        "dashboard: session ended"
    );
    Ok(())
}
