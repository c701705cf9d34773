use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "bazaar")]
#[command(about = "Bookmark tutoring and service listings from the command line")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// CLI profile name for remote configuration
    #[arg(long, global = true, value_name = "NAME")]
    pub profile: Option<String>,

    /// Keep bookmarks on this device only, ignoring any remote
    #[arg(long, global = true)]
    pub local_only: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Bookmark a listing
    #[command(alias = "add")]
    Bookmark {
        /// Listing title
        #[arg(long)]
        title: String,
        /// Listing price
        #[arg(long)]
        price: f64,
        /// Listing ID (a new one is generated when omitted)
        #[arg(long, value_name = "UUID")]
        id: Option<String>,
        /// Listing description
        #[arg(long, default_value = "")]
        description: String,
        /// Owner display name
        #[arg(long, default_value = "")]
        owner: String,
    },
    /// Remove a bookmark
    #[command(alias = "rm")]
    Remove {
        /// Listing ID or unique ID prefix
        id: String,
    },
    /// List bookmarks sorted by title
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every bookmark
    Clear,
    /// Reconcile local bookmarks with the remote store
    Sync,
    /// Show remote availability and bookmark count
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Configure CLI profiles
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Initialize or update profile config
    Init {
        /// Profile name to initialize
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
        /// Record service base URL
        #[arg(long, value_name = "URL")]
        remote_url: Option<String>,
        /// Keep current active profile instead of activating this one
        #[arg(long)]
        no_activate: bool,
    },
    /// Print the resolved profile
    Show {
        /// Optional profile override
        #[arg(long, value_name = "NAME")]
        profile: Option<String>,
    },
}
