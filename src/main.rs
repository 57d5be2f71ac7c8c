mod config;
mod database;
mod history;
mod remote;
mod strategy;
mod types;
mod web;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::AppConfig;
use database::Database;
use history::HistoryLedger;
use strategy::{select_rows, NodeStore, ParamFilter, Scope};
use web::{start_server, AppState};

#[derive(Parser)]
#[command(name = "strategy-console")]
#[command(version = "0.1.0")]
#[command(about = "Operations console for remote trading-bot instances", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the dashboard API server
    Serve {
        /// Listen port (overrides the config file)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Parse a strategy export file and print its structure
    Inspect {
        /// Path to a strategy export file
        file: String,

        /// Only show parameters with this exact name
        #[arg(long)]
        param: Option<String>,
    },
    /// List committed change-sets from the history database
    History,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = AppConfig::load(&cli.config)?;

    match cli.command {
        Commands::Serve { port } => {
            let port = port.unwrap_or(config.port);
            run_serve(config, port).await?;
        }
        Commands::Inspect { file, param } => {
            run_inspect(&file, param)?;
        }
        Commands::History => {
            run_history(&config).await?;
        }
    }

    Ok(())
}

async fn run_serve(config: AppConfig, port: u16) -> Result<()> {
    let database = Database::new(&config.database_path).await?;
    let entries = database.load_history().await?;
    info!("Loaded {} persisted history entries", entries.len());

    let state = AppState::new(config, Some(database));
    {
        let mut workspace = state.workspace.write().await;
        workspace.ledger = HistoryLedger::from_entries(entries);
    }

    start_server(state, port).await
}

fn run_inspect(file: &str, param: Option<String>) -> Result<()> {
    let text = std::fs::read_to_string(file)?;
    let mut store = NodeStore::from_text(&text);
    if store.is_empty() {
        warn!("Nothing parsed from {}", file);
        return Ok(());
    }

    println!(
        "{}: {} folders, {} strategies",
        file,
        store.folder_count(),
        store.strategy_count()
    );

    let filter = ParamFilter::from_option(param);
    for row in select_rows(&mut store, &Scope::AllStrategies, &filter) {
        println!("  {:<24} {:<24} = {}", row.strategy_name, row.param_name, row.value);
    }

    println!("catalogue: {}", store.catalogue().join(", "));
    Ok(())
}

async fn run_history(config: &AppConfig) -> Result<()> {
    let database = Database::new(&config.database_path).await?;
    let entries = database.load_history().await?;
    if entries.is_empty() {
        println!("No committed change-sets.");
        return Ok(());
    }

    for (index, entry) in entries.iter().enumerate() {
        println!("[{}] {} ({} records)", index, entry.saved_at.to_rfc3339(), entry.changes.len());
        for change in &entry.changes {
            println!(
                "    {} {}: {} -> {}",
                change.target, change.param_name, change.old_value, change.new_value
            );
            println!("      forward: {}", change.forward);
            println!("      revert:  {}", change.revert);
        }
    }
    Ok(())
}
