//! LedgerDesk CLI
//!
//! Command-line access to the LedgerDesk persistence engine

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Debug, Parser)]
#[command(name = "ledgerdesk")]
#[command(about = "LedgerDesk - local ledger storage", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file (overrides config and LEDGERDESK_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Storage backend: sqlite or local-store
    #[arg(long, global = true)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Create the database file and its schema
    Init,
    /// Print every row of a table
    List(commands::records::ListArgs),
    /// Print one row by id
    Get(commands::records::GetArgs),
    /// Insert or update a row from a JSON object
    Upsert(commands::records::UpsertArgs),
    /// Update selected columns of a row
    Patch(commands::records::PatchArgs),
    /// Delete a row by id
    Delete(commands::records::DeleteArgs),
    /// Wipe every table
    Reset,
    /// Copy the database file to a backup location
    Backup(commands::maintenance::BackupArgs),
    /// Replace the database file with a backup
    Restore(commands::maintenance::RestoreArgs),
}

fn main() {
    let cli = Cli::parse();
    let options = commands::GlobalOptions {
        config: cli.config,
        db: cli.db,
        backend: cli.backend,
    };

    let result = match cli.command {
        Commands::Init => commands::maintenance::init(&options),
        Commands::List(args) => commands::records::list(&options, args),
        Commands::Get(args) => commands::records::get(&options, args),
        Commands::Upsert(args) => commands::records::upsert(&options, args),
        Commands::Patch(args) => commands::records::patch(&options, args),
        Commands::Delete(args) => commands::records::delete(&options, args),
        Commands::Reset => commands::maintenance::reset(&options),
        Commands::Backup(args) => commands::maintenance::backup(&options, args),
        Commands::Restore(args) => commands::maintenance::restore(&options, args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
