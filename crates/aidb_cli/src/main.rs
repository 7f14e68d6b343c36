//! aidb CLI - Command-line interface for the aidb knowledge-file tracker.

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::Output;

#[derive(Parser)]
#[command(name = "aidb")]
#[command(about = "Track knowledge files for AI agents in a central store", long_about = None)]
#[command(version)]
struct Cli {
    /// Emit machine-readable JSON
    #[arg(long, global = true)]
    json: bool,
    /// Only print errors
    #[arg(short, long, global = true)]
    quiet: bool,
    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the storage root as a git repository
    Init {
        /// Remote URL to register as origin
        #[arg(long)]
        remote: Option<String>,
    },
    /// Move files into storage and leave symlinks behind
    Add {
        /// Files, directories or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Move tracked files back out of storage
    #[command(alias = "rm")]
    Remove {
        /// Tracked symlinks, directories or glob patterns
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Mark stored files as processed at their current content
    Seen {
        /// Storage-relative files, directories or glob patterns
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// Clear the processed flag on stored files
    Unseen {
        /// Storage-relative files, directories or glob patterns
        #[arg(required = true)]
        patterns: Vec<String>,
    },
    /// List stored files with their seen state
    #[command(alias = "ls")]
    List {
        /// Only show files that are unseen
        #[arg(long)]
        unseen: bool,
    },
    /// Show which LEARN.md summaries need updating
    Status,
    /// Show or change configuration
    Config {
        /// Key to read or write (storage.root, git.enabled, git.binary)
        key: Option<String>,
        /// New value for the key
        value: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins over --debug when both are given
    let default_level = if cli.debug { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if cli.no_color {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let out = Output {
        json: cli.json,
        quiet: cli.quiet,
    };

    match cli.command {
        Commands::Init { remote } => commands::init::run(&out, remote.as_deref()),
        Commands::Add { paths } => commands::add::run(&out, &paths),
        Commands::Remove { paths } => commands::remove::run(&out, &paths),
        Commands::Seen { patterns } => commands::seen::seen(&out, &patterns),
        Commands::Unseen { patterns } => commands::seen::unseen(&out, &patterns),
        Commands::List { unseen } => commands::list::run(&out, unseen),
        Commands::Status => commands::status::run(&out),
        Commands::Config { key, value } => {
            commands::config::run(&out, key.as_deref(), value.as_deref())
        }
    }
}
