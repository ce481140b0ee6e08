//! Store-wide commands: init, reset, backup, restore

use super::{CommandResult, GlobalOptions};
use clap::Args;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Destination file
    pub dest: PathBuf,
}

#[derive(Debug, Args)]
pub struct RestoreArgs {
    /// Backup file to restore from
    pub src: PathBuf,
}

pub fn init(options: &GlobalOptions) -> CommandResult {
    let mut db = options.database()?;
    db.ensure_database_exists()?;
    db.open()?;
    db.close()?;

    if let Some(path) = db.storage_path() {
        println!("Initialized {} store at {}", db.backend(), path.display());
    }
    Ok(())
}

pub fn reset(options: &GlobalOptions) -> CommandResult {
    let mut db = options.database()?;
    db.reset()?;
    db.close()?;
    println!("Store reset");
    Ok(())
}

pub fn backup(options: &GlobalOptions, args: BackupArgs) -> CommandResult {
    let mut db = options.database()?;
    let bytes = db.backup(&args.dest)?;
    println!("Backed up {} bytes to {}", bytes, args.dest.display());
    Ok(())
}

pub fn restore(options: &GlobalOptions, args: RestoreArgs) -> CommandResult {
    let mut db = options.database()?;
    let bytes = db.restore(&args.src)?;
    println!("Restored {} bytes from {}", bytes, args.src.display());
    Ok(())
}
