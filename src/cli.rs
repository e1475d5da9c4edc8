use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long, global = true, env = "GUTENSYNC_CONFIG")]
    pub config: Option<PathBuf>,
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Load every catalog entry that is not stored yet
    Sync {
        /// Catalog root, overriding the configuration
        #[arg(short, long)]
        root: Option<PathBuf>,
        /// Load all stored ids up front instead of one lookup per entry
        #[arg(long)]
        preload: bool,
        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract one record straight from its catalog document
    Show {
        id: String,
        #[arg(short, long)]
        root: Option<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Print stored records
    Get {
        #[arg(required = true)]
        ids: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print every stored record
    List {
        #[arg(long)]
        json: bool,
    },
    /// Delete a stored record
    Delete { id: String },
}
