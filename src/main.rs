//! ProjectNote CLI - serve the research-note backend and manage its database

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;

#[derive(Parser)]
#[command(name = "projectnote")]
#[command(version)]
#[command(about = "Research-data management backend with hash-chained research notes")]
#[command(long_about = r#"
ProjectNote keeps organizations, projects, researchers and research notes.
Every note edit is stored as a revision chained to the previous one by
SHA-256, so tampering with history is detectable.

Example usage:
  projectnote init
  projectnote seed-demo
  projectnote serve --bind 0.0.0.0:8000
  projectnote verify --note 6f1c...e2
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file (defaults to ./projectnote.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server
    Serve {
        /// Address to listen on
        #[arg(short, long)]
        bind: Option<String>,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Insert the demo dataset (skipped when already present)
    SeedDemo {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,

        /// Clear every table first
        #[arg(long)]
        reset: bool,
    },

    /// Show row counts of every table
    Stats {
        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Verify the revision hash chain of a research note
    Verify {
        /// Note id
        #[arg(short, long)]
        note: String,

        /// Path to the database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve { bind, database } => commands::run_serve(config_path, bind, database),
        Commands::Init { force } => commands::run_init(config_path, force),
        Commands::SeedDemo { database, reset } => commands::run_seed_demo(config_path, database, reset),
        Commands::Stats { database } => commands::run_stats(config_path, database),
        Commands::Verify { note, database } => commands::run_verify(config_path, &note, database),
    }
}
