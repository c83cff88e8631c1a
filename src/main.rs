//! Irradiance forecasting - Main Entry Point

use clap::Parser;
use colored::*;
use irradiance_forecast::cli::{cmd_forecast, cmd_inspect, Cli, Commands};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "irradiance_forecast=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Forecast { data, output, report, config } => {
            cmd_forecast(&data, output.as_deref(), report.as_deref(), config.as_deref())
        }
        Commands::Inspect { data } => cmd_inspect(&data),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}
