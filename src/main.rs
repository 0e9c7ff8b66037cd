// Satchel - form submission pull and export tool
// Copyright (c) 2025 Satchel Contributors
// Licensed under the MIT License

use satchel::cli::{Cli, Commands, EXIT_FATAL};
use satchel::config::{load_config, LoggingConfig};
use satchel::core::export::CancellationToken;
use satchel::logging::init_logging;
use clap::Parser;
use std::process;

#[tokio::main]
async fn main() {
    // Optional; a missing .env is ignored
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // File logging follows the config file when it loads; otherwise console only
    let (config_level, logging_config) = match load_config(&cli.config) {
        Ok(config) => (Some(config.application.log_level), config.logging),
        Err(_) => (None, LoggingConfig::default()),
    };
    let log_level = cli
        .log_level
        .clone()
        .or(config_level)
        .unwrap_or_else(|| "info".to_string());
    let logging_guard = match init_logging(&log_level, &logging_config) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Failed to initialize logging: {e}");
            process::exit(EXIT_FATAL);
        }
    };

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Satchel - form submission pull and export tool"
    );

    let cancellation = CancellationToken::new();
    let signal_token = cancellation.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        println!("\n⚠️  Shutdown signal received, finishing running exports...");
        signal_token.cancel();
    });

    let exit_code = match execute_command(&cli, cancellation).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Command execution failed");
            eprintln!("Error: {e}");
            EXIT_FATAL
        }
    };

    // process::exit skips destructors; flush file logs first
    drop(logging_guard);
    process::exit(exit_code);
}

/// Resolve on SIGINT, or SIGTERM on unix
async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        tracing::info!("Received SIGINT (Ctrl+C), cancelling export");
                    }
                    _ = sigterm.recv() => {
                        tracing::info!("Received SIGTERM, cancelling export");
                    }
                }
                return;
            }
            Err(e) => tracing::warn!(error = %e, "Failed to install SIGTERM handler"),
        }
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received SIGINT (Ctrl+C), cancelling export"),
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    }
}

/// Execute the CLI command
async fn execute_command(cli: &Cli, cancellation: CancellationToken) -> anyhow::Result<i32> {
    match &cli.command {
        Commands::Init(args) => args.execute().await,
        Commands::ValidateConfig(args) => args.execute(&cli.config).await,
        Commands::Pull(args) => args.execute(&cli.config).await,
        Commands::Forms(args) => args.execute(&cli.config).await,
        Commands::Configure(args) => args.execute(&cli.config).await,
        Commands::Export(args) => args.execute(&cli.config, cancellation).await,
        Commands::ClearPrefs(args) => args.execute(&cli.config).await,
    }
}
