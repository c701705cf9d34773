//! Bazaar CLI - Command-line interface for bookmarking marketplace listings
//!
//! Bookmarks live in a local database and mirror to the hosted record
//! service when a profile and token are configured.

mod cli;
mod commands;
mod config_profiles;
mod error;

#[cfg(test)]
mod tests;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::bookmark::{run_bookmark, NewBookmark};
use crate::commands::clear::run_clear;
use crate::commands::common::{open_store, resolve_remote_config, StoreArgs};
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::list::run_list;
use crate::commands::remove::run_remove;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                "bazaar_core=info"
                    .parse()
                    .map_err(|error| CliError::Config(format!("{error}")))?,
            ),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let args = StoreArgs {
        db_path: cli.db_path,
        profile: cli.profile,
        local_only: cli.local_only,
    };

    match cli.command {
        Some(Commands::Bookmark {
            title,
            price,
            id,
            description,
            owner,
        }) => {
            let store = open_store(&args)?;
            store.initialize().await;
            let new = NewBookmark {
                id,
                title,
                description,
                price,
                owner,
            };
            let result = run_bookmark(&store, new).await;
            store.shutdown().await;
            result?;
        }
        Some(Commands::Remove { id }) => {
            let store = open_store(&args)?;
            store.initialize().await;
            let result = run_remove(&store, &id).await;
            store.shutdown().await;
            result?;
        }
        Some(Commands::List { json }) => {
            let store = open_store(&args)?;
            run_list(&store, json)?;
        }
        Some(Commands::Clear) => {
            let store = open_store(&args)?;
            store.connect().await;
            run_clear(&store);
            store.shutdown().await;
        }
        Some(Commands::Sync) => {
            let store = open_store(&args)?;
            let result = run_sync(&store).await;
            store.shutdown().await;
            result?;
        }
        Some(Commands::Status { json }) => {
            let remote_url = resolve_remote_config(&args)?.and_then(|config| config.base_url);
            let store = open_store(&args)?;
            run_status(&store, remote_url, json).await?;
        }
        Some(Commands::Config { command }) => run_config(command, args.profile.as_deref())?,
        Some(Commands::Completions { shell, output }) => {
            run_completions(shell, output.as_deref())?;
        }
        None => {
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
