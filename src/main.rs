mod api;
mod cli;
mod config;
mod db;
mod error;
mod seed;
mod validation;

use crate::cli::{Cli, Commands, ConfigCommands};
use crate::config::Config;
use crate::db::Database;
use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port } => {
            let mut config = load_or_default_config()?;
            if let Some(port) = port {
                config.api_port = port;
            }
            run_service(config).await
        }
        Commands::Seed { reset } => handle_seed(reset),
        Commands::Status => handle_status(),
        Commands::Doctor => handle_doctor(),
        Commands::Config { command } => handle_config_command(command),
    }
}

fn handle_config_command(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Set { key, value } => {
            let mut config = load_or_default_config()?;
            config.set_value(&key, &value)?;
            config.save()?;

            println!("Config saved: {key} = {value}");
            Ok(())
        }
        ConfigCommands::Get { key } => {
            let config = load_or_default_config()?;
            let value = config
                .get_value(&key)
                .with_context(|| format!("Unsupported config key: {key}"))?;

            println!("{value}");
            Ok(())
        }
    }
}

fn handle_seed(reset: bool) -> Result<()> {
    let config = load_or_default_config()?;
    let mut database = Database::open(&config.db_path)?;

    let summary = seed::seed_database(&mut database, reset).context("Failed to seed database")?;

    println!("Database seeded: {}", config.db_path.display());
    println!(
        "- exercises: {} created, {} reused",
        summary.exercises_created, summary.exercises_reused
    );
    println!("- workouts: {}", summary.counts.workouts);
    println!("- workout_exercises: {}", summary.counts.workout_exercises);

    Ok(())
}

fn handle_status() -> Result<()> {
    let config = load_or_default_config()?;
    let database = Database::open(&config.db_path)?;
    let counts = database.counts().context("Failed to count records")?;

    println!("workout-log status");
    println!("- db_path: {}", config.db_path.display());
    println!("- api: http://{}:{}", config.bind_address, config.api_port);
    println!("- exercises: {}", counts.exercises);
    println!("- workouts: {}", counts.workouts);
    println!("- workout_exercises: {}", counts.workout_exercises);

    Ok(())
}

fn handle_doctor() -> Result<()> {
    let config_path = Config::config_path()?;
    let mut issues = Vec::new();

    if config_path.exists() {
        println!("[OK] config.json found: {}", config_path.display());
    } else {
        println!("[WARN] config.json not found: {}", config_path.display());
        issues.push("config missing".to_string());
    }

    let config = load_or_default_config()?;

    match Database::open(&config.db_path) {
        Ok(database) => {
            println!("[OK] SQLite reachable: {}", config.db_path.display());
            if let Err(error) = database.counts() {
                println!("[WARN] schema check failed: {error}");
                issues.push("schema unreadable".to_string());
            }
        }
        Err(error) => {
            println!("[WARN] SQLite check failed: {error}");
            issues.push("db unreachable".to_string());
        }
    }

    if issues.is_empty() {
        println!("doctor result: no issues");
    } else {
        println!("doctor result: {} warning(s)", issues.len());
    }

    Ok(())
}

fn init_database(config: &Config) -> Result<()> {
    Database::open(&config.db_path).context("Failed to initialize database")?;
    Ok(())
}

async fn run_service(config: Config) -> Result<()> {
    init_database(&config)?;
    let shared_config = Arc::new(config);

    info!(db_path = %shared_config.db_path.display(), "workout-log service started");

    tokio::select! {
        api_result = api::run_server(shared_config) => {
            api_result?;
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    Ok(())
}

fn load_or_default_config() -> Result<Config> {
    Config::load().or_else(|_| {
        let config = Config::default();
        config.save()?;
        Ok(config)
    })
}
