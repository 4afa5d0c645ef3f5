//! # CLI Layer
//!
//! This module is **one possible UI client** for docsafe, not the application itself.
//!
//! The CLI layer is the **only** place in the codebase that:
//! - Knows about terminal I/O (stdout, stderr)
//! - Installs a log subscriber
//! - Handles argument parsing
//! - Formats output for human consumption
//!
//! ## Documents by Id Prefix
//!
//! Commands that take a document accept its full id or any unique prefix of it, the
//! way git accepts short hashes. `docsafe list` shows the first eight characters.
//!
//! ## Output
//!
//! `--output json` prints the library's own serialized types (records, scan reports,
//! share targets) instead of the terminal rendering.
//!
//! ## Logging
//!
//! Library diagnostics go through `tracing` to stderr. The default level is WARN,
//! which surfaces orphaned files and dangling references found when the vault is
//! opened. `-v` raises it to DEBUG.
//!
//! ## Module Structure
//!
//! - `setup`: Argument parsing via clap
//! - `handlers`: Per-command handlers that call the record manager
//! - `render`: Output formatting (tables, colors, messages)

mod handlers;
mod render;
pub mod setup;

use anyhow::Result;
use clap::Parser;
use docsafeapp::init::{open_vault, resolve_vault_root};
use docsafeapp::model::RecordFilter;
use handlers::{AddArgs, AppState, UpdateArgs};
use setup::{Cli, Commands, OutputMode};
use std::path::Path;
use tracing::Level;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let root = resolve_vault_root(cli.vault.clone())?;
    let output = dispatch(&root, cli.output, cli.command)?;
    print!("{}", output);
    Ok(())
}

/// Init creates the vault, every other command opens an existing one.
fn dispatch(root: &Path, output: OutputMode, command: Commands) -> Result<String> {
    let open = || -> Result<AppState> { Ok(AppState::new(open_vault(root)?, output)) };

    match command {
        Commands::Init => handlers::handle_init(root, output),
        Commands::Add {
            name,
            principal,
            secondary,
            description,
            url,
            expires,
            archived,
        } => handlers::handle_add(
            &open()?,
            AddArgs {
                name,
                principal,
                secondary,
                description,
                url,
                expires,
                archived,
            },
        ),
        Commands::List { archived, all } => {
            let filter = if all {
                RecordFilter::All
            } else if archived {
                RecordFilter::Archived
            } else {
                RecordFilter::Active
            };
            handlers::handle_list(&open()?, filter)
        }
        Commands::Show { id } => handlers::handle_show(&open()?, &id),
        Commands::Update {
            id,
            name,
            description,
            url,
            clear_url,
            expires,
            archive,
            unarchive,
            principal,
            secondary,
        } => handlers::handle_update(
            &open()?,
            &id,
            UpdateArgs {
                name,
                description,
                url,
                clear_url,
                expires,
                archive: match (archive, unarchive) {
                    (true, _) => Some(true),
                    (_, true) => Some(false),
                    _ => None,
                },
                principal,
                secondary,
            },
        ),
        Commands::Detach { id, slot } => handlers::handle_detach(&open()?, &id, slot),
        Commands::Delete { id } => handlers::handle_delete(&open()?, &id),
        Commands::Path { id, slot } => handlers::handle_path(&open()?, &id, slot),
        Commands::Doctor { reclaim } => handlers::handle_doctor(&open()?, reclaim),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    // A second subscriber (e.g. in tests) is not an error
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
