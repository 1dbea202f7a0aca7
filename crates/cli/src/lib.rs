pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use ordertrack_core::config::{AppConfig, LoadOptions, LogFormat};

#[derive(Debug, Parser)]
#[command(
    name = "ordertrack",
    about = "Order lookup operator CLI",
    long_about = "Manage the order database and resolve orders from partial or free-text queries.",
    after_help = "Examples:\n  ordertrack seed\n  ordertrack track --tracking-id 1Z999AA10123456784\n  ordertrack track --query \"my iPhone from last Friday\" --today 2024-06-10"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to an ordertrack.toml config file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load and verify the deterministic demo order dataset")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Resolve an order and print the structured resolution summary")]
    Track(TrackArgs),
}

#[derive(Debug, Default, Args)]
pub struct TrackArgs {
    #[arg(long, help = "Exact order id")]
    pub order_id: Option<String>,
    #[arg(long, help = "Carrier tracking id")]
    pub tracking_id: Option<String>,
    #[arg(long, help = "Customer id; filters free-text search or lists recent orders")]
    pub customer_id: Option<String>,
    #[arg(long, help = "Free-text description such as \"my iPhone from last Friday\"")]
    pub query: Option<String>,
    #[arg(long, value_name = "YYYY-MM-DD", help = "Reference date for relative phrases")]
    pub today: Option<NaiveDate>,
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions { config_path: cli.config, ..LoadOptions::default() };

    if let Ok(config) = AppConfig::load(options.clone()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(options),
        Command::Seed => commands::seed::run(options),
        Command::Config => commands::config::run(options),
        Command::Track(args) => commands::track::run(options, args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout stays a single JSON document.
fn init_logging(config: &AppConfig) {
    use tracing::Level;
    use LogFormat::*;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    match config.logging.format {
        Compact => builder.compact().init(),
        Pretty => builder.pretty().init(),
        Json => builder.json().init(),
    }
}
