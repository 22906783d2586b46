//! # portal-sync
//!
//! CLI for the course portal's local store and sync coordinator.
//!
//! ## Commands
//!
//! - `get`, `set`, `remove`, `keys`, `clear`: inspect and edit the local store
//! - `status`: show the last sync result for each data set
//! - `run`: sign in with a role and keep that role's data set fresh
//!
//! ## Example
//!
//! ```bash
//! # Keep assignments fresh for a student until ctrl-c
//! portal-sync run --role student --user-id u123
//!
//! # Look at what was synced
//! portal-sync status
//! portal-sync get assignments
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use sync_store::{FileBackend, PersistentStore};
use sync_types::Role;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{run, status, store};

/// File name of the store inside the data directory.
const STORE_FILE: &str = "store.json";

/// File name of the optional configuration inside the data directory.
const CONFIG_FILE: &str = "portal-sync.toml";

/// CLI for the course portal's local store and sync coordinator.
#[derive(Parser, Debug)]
#[command(name = "portal-sync")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory holding the store and configuration
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Configuration file (default: <data-dir>/portal-sync.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the JSON value stored under a key
    Get {
        /// Store key
        key: String,
    },

    /// Store a JSON value under a key
    Set {
        /// Store key
        key: String,
        /// Value as JSON (e.g. '"dark"', '42', '{"a":1}')
        value: String,
    },

    /// Delete a key
    Remove {
        /// Store key
        key: String,
    },

    /// List all keys
    Keys,

    /// Delete every key
    Clear,

    /// Show sync status for assignments and submissions
    Status,

    /// Sign in and run the sync coordinator
    Run {
        /// Role of the signed-in user (student, faculty, admin)
        #[arg(long)]
        role: Role,

        /// User identifier
        #[arg(long, default_value = "cli-user")]
        user_id: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Stop after this many seconds (default: run until ctrl-c)
        #[arg(long)]
        duration_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Determine data directory
    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };

    // Ensure data directory exists
    tokio::fs::create_dir_all(&data_dir)
        .await
        .context("Failed to create data directory")?;

    let config_path = cli
        .config
        .unwrap_or_else(|| data_dir.join(CONFIG_FILE));

    match cli.command {
        Commands::Get { key } => {
            store::get(&open_store(&data_dir)?, &key)?;
        }
        Commands::Set { key, value } => {
            store::set(&open_store(&data_dir)?, &key, &value)?;
        }
        Commands::Remove { key } => {
            store::remove(&open_store(&data_dir)?, &key);
        }
        Commands::Keys => {
            store::keys(&open_store(&data_dir)?);
        }
        Commands::Clear => {
            store::clear(&open_store(&data_dir)?);
        }
        Commands::Status => {
            status::run(&open_store(&data_dir)?);
        }
        Commands::Run {
            role,
            user_id,
            name,
            duration_secs,
        } => {
            let args = run::RunArgs {
                role,
                user_id,
                name,
                duration_secs,
            };
            run::run(open_store(&data_dir)?, &config_path, args).await?;
        }
    }

    Ok(())
}

/// Open the file-backed store in `data_dir`.
fn open_store(data_dir: &Path) -> Result<PersistentStore> {
    let path = data_dir.join(STORE_FILE);
    let backend = FileBackend::open(&path)
        .with_context(|| format!("Failed to open store at {}", path.display()))?;
    Ok(PersistentStore::new(backend))
}

/// Get the default data directory for portal-sync.
fn default_data_dir() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("io", "ydun", "portal-sync")
        .context("Could not determine home directory")?;
    Ok(dirs.data_dir().to_path_buf())
}
