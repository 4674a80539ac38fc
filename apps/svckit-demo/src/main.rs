use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;
use svckit::{
    Assembly, HostedServiceHost, RegistrationReport, ServiceCollection, SmartServices, TypeKey,
};
use svckit_bootstrap::{AppConfig, CliArgs};

use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

mod controllers;
mod services;

use controllers::TestCamelCaseAttributeController;
use services::TestServiceAttributeService;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

/// svckit demo - convention-driven service registration
#[derive(Parser)]
#[command(name = "svckit-demo")]
#[command(about = "svckit demo - convention-driven service registration")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port override for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print effective configuration (YAML) and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Register services, start hosted services and serve HTTP
    Run,
    /// Validate configuration and the registration pass, then exit
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        port: cli.port,
        verbose: cli.verbose,
    };

    // Layered config:
    // 1) defaults -> 2) YAML (if provided) -> 3) env (APP__*) -> 4) CLI overrides
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    svckit_bootstrap::init_logging(&logging_config, &config.home_dir());

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config).await,
        Commands::Check => check_config(config),
    }
}

fn register_services(config: &AppConfig) -> (ServiceCollection, RegistrationReport) {
    let options = config.auto_register_options();
    tracing::info!(?options, "Registering services");

    let assembly = Assembly::discover_crate(env!("CARGO_CRATE_NAME"));
    let mut services = ServiceCollection::new();
    let report = services.add_smart_services_with(&options, &[assembly]);

    for descriptor in services.descriptors() {
        tracing::info!(registration = %descriptor, "Service registered");
    }
    for hosted in services.hosted_services() {
        tracing::info!(
            implementation = hosted.implementation.short_name(),
            "Hosted service registered"
        );
    }
    (services, report)
}

async fn run_server(config: AppConfig) -> Result<()> {
    let (services, _report) = register_services(&config);

    if !services.contains(TypeKey::of::<TestServiceAttributeService>()) {
        anyhow::bail!("TestServiceAttributeService is not registered; enable services.by_marker");
    }
    let controller =
        TestCamelCaseAttributeController::new(Arc::new(TestServiceAttributeService::default()));
    let router = controller.router();

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "HTTP server listening");

    let cancel = CancellationToken::new();
    svckit_bootstrap::cancel_on_shutdown(cancel.clone());

    let host = HostedServiceHost::new(&services, cancel.clone());
    if let Err(e) = host.start().await {
        host.stop().await;
        return Err(e.into());
    }

    let shutdown = cancel.clone();
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await;

    // Make sure hosted services see the cancellation even if the server exited on its own.
    cancel.cancel();
    host.stop().await;

    served.context("HTTP server failed")
}

fn check_config(config: AppConfig) -> Result<()> {
    tracing::info!("Checking configuration…");
    let (services, report) = register_services(&config);

    println!("Configuration is valid");
    println!("{}", config.to_yaml()?);
    println!("Registrations:");
    for descriptor in services.descriptors() {
        println!("  {descriptor}");
    }
    for hosted in services.hosted_services() {
        println!("  hosted {}", hosted.implementation.short_name());
    }

    if !report.failures.is_empty() {
        for failure in &report.failures {
            eprintln!("  skipped: {failure}");
        }
        anyhow::bail!("{} candidate(s) failed to register", report.failures.len());
    }
    Ok(())
}
