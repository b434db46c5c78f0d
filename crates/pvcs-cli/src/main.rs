//! pvcs CLI - command-line interface for pvcs repositories.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

/// pvcs - a minimal local version-control system
#[derive(Parser, Debug)]
#[command(name = "pvcs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Working root of the repository
    #[arg(short = 'C', long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty repository
    Init,

    /// Record the working directory as a new commit
    Snapshot {
        /// Message to record and later revert by
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Reset the working directory to a stored commit
    Revert {
        /// Commit hash (full or at least 7 characters)
        #[arg(required_unless_present = "message", conflicts_with = "message")]
        hash: Option<String>,
        /// Revert to the latest snapshot with this message
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Show history from HEAD
    Log {
        /// Maximum number of commits to show
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },

    /// Show changed files between commits and the working directory
    Diff {
        /// Also show line changes of modified files
        #[arg(long)]
        detailed: bool,
        /// Zero, one or two commit hashes or snapshot messages
        #[arg(num_args = 0..=2)]
        refs: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("pvcs={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let root = cli.root.as_path();
    let result = match cli.command {
        Commands::Init => commands::init(root),
        Commands::Snapshot { message } => commands::snapshot(root, message.as_deref()),
        Commands::Revert { hash, message } => {
            commands::revert(root, hash.as_deref(), message.as_deref())
        }
        Commands::Log { count } => commands::log(root, count),
        Commands::Diff { detailed, refs } => commands::diff(root, &refs, detailed),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
