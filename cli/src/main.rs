//! CLI entrypoint for hacrud
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use hacrud_application::CrudService;
use hacrud_infrastructure::{CommandOrchestrator, ConfigLoader, FileConfig};
use hacrud_presentation::{
    AppState, Cli, Command, HelperToolset, StaticTokenResolver, router,
};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        for line in ConfigLoader::describe_sources(cli.config.as_deref()) {
            println!("{}", line);
        }
        return Ok(());
    }

    // === Configuration ===
    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref()).context("Failed to load configuration")?
    };
    let issues = config.validate();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("config error: {}", issue);
        }
        bail!("Invalid configuration ({} issue(s))", issues.len());
    }

    match cli.command {
        Command::Tools => {
            let definitions = HelperToolset::definitions();
            println!("{}", serde_json::to_string_pretty(&definitions)?);
            Ok(())
        }
        Command::Call { tool, args, admin } => {
            let args: serde_json::Value =
                serde_json::from_str(&args).context("Tool arguments are not valid JSON")?;
            let (host, service) = connect(&config).await?;
            let profile = service.profile_for(admin);
            let result = HelperToolset::new(service).call(&tool, &args, &profile).await;
            host.close();
            match result {
                Ok(value) => {
                    println!("{}", serde_json::to_string_pretty(&value)?);
                    Ok(())
                }
                Err(err) => {
                    println!("{}", serde_json::to_string_pretty(&err)?);
                    bail!("{} failed: {}", tool, err)
                }
            }
        }
        Command::Serve { bind } => {
            let bind = bind.unwrap_or_else(|| config.server.bind.clone());
            let (host, service) = connect(&config).await?;

            let callers = StaticTokenResolver::new(
                config
                    .auth
                    .tokens
                    .iter()
                    .map(|t| (t.token.clone(), t.admin)),
            );
            if callers.is_empty() {
                warn!("No bearer tokens configured; every REST request will be rejected");
            }

            let app = router(AppState::new(service, Arc::new(callers)));
            let listener = TcpListener::bind(&bind)
                .await
                .with_context(|| format!("Failed to bind {}", bind))?;
            info!("Serving helpers on http://{}", bind);

            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                    info!("Shutdown requested");
                })
                .await?;

            host.close();
            Ok(())
        }
    }
}

/// Open the host connection and build the shared service.
async fn connect(config: &FileConfig) -> Result<(Arc<CommandOrchestrator>, Arc<CrudService>)> {
    let host = Arc::new(
        CommandOrchestrator::connect(
            &config.host.address,
            config.host.access_token.as_deref(),
            config.host.timeout(),
        )
        .await
        .with_context(|| format!("Failed to connect to host at {}", config.host.address))?,
    );
    info!("Connected to host at {}", config.host.address);
    let service = Arc::new(CrudService::new(host.clone(), config.crud_config()));
    Ok((host, service))
}

/// Install the tracing subscriber. `RUST_LOG` overrides the `-v` level.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(file_layer)
        .init();

    Ok(guard)
}
