use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "workout-log",
    about = "Exercise, workout and pairing record-keeping backend"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run the HTTP API until Ctrl+C
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Populate sample exercises, workouts and pairings
    Seed {
        #[arg(long, default_value_t = false)]
        reset: bool,
    },
    Status,
    Doctor,
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    Set { key: String, value: String },
    Get { key: String },
}
