use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Settings;

#[derive(Debug, Parser)]
#[command(name = "alphadb", version, about = "Manage database versions from the command line", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the session store (overrides ALPHADB_CONFIG_PATH)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Show debug logs and full error details
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,
}

impl Cli {
    /// Flags take precedence over environment and defaults.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(path) = &self.config {
            settings.config_path = Some(path.clone());
        }
        if self.debug {
            settings.debug = true;
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Connect to a new database
    Connect,
    /// Initialize the currently active database
    Init,
    /// Show the status of the currently active database
    Status,
    /// Update the database (requires a version source)
    Update {
        /// Update only the database structure, without default data
        #[arg(long = "no-data", default_value_t = false)]
        no_data: bool,
    },
    /// Irreversibly deletes ALL data in the database
    Vacate {
        /// Needs to be specified. Only with this option the vacate function will run
        #[arg(long, default_value_t = false)]
        confirm: bool,
    },
    /// Verify a version source
    Verify,
    /// Forget the saved database session
    Disconnect,
    /// Manage registered version sources
    Sources {
        #[command(subcommand)]
        action: SourcesCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum SourcesCommand {
    /// List registered version sources
    List,
    /// Register a new version source
    Add,
    /// Remove a version source by name
    Remove {
        /// The name the source was registered under
        name: String,
    },
}
