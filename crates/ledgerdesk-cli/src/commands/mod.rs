//! Subcommand implementations

pub mod maintenance;
pub mod records;

use ledgerdesk_core::config::LedgerConfig;
use ledgerdesk_core::engine::BackendKind;
use ledgerdesk_core::logging_facility;
use ledgerdesk_engine::Database;
use std::path::PathBuf;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

const DEFAULT_SQLITE_PATH: &str = ".ledgerdesk/ledger.db";
const DEFAULT_LOCAL_STORE_PATH: &str = ".ledgerdesk/ledger.json";

/// Flags shared by every subcommand
#[derive(Debug, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub db: Option<PathBuf>,
    pub backend: Option<String>,
}

impl GlobalOptions {
    /// Resolve configuration: file, then environment, then flags
    pub fn resolve_config(&self) -> Result<LedgerConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => LedgerConfig::load(path)?,
            None => LedgerConfig::default(),
        };
        config.apply_env_overrides()?;

        if let Some(backend) = &self.backend {
            config.store.backend = backend.parse()?;
        }
        if let Some(db) = &self.db {
            config.store.path = Some(db.clone());
        }
        if config.store.path.is_none() {
            let default = match config.store.backend {
                BackendKind::Sqlite => DEFAULT_SQLITE_PATH,
                BackendKind::LocalStore => DEFAULT_LOCAL_STORE_PATH,
            };
            config.store.path = Some(PathBuf::from(default));
        }

        Ok(config)
    }

    /// Initialize logging and build the (closed) database
    pub fn database(&self) -> Result<Database, Box<dyn std::error::Error>> {
        let config = self.resolve_config()?;
        logging_facility::init(config.logging.profile);
        Ok(Database::from_config(&config.store))
    }

    /// Like [`GlobalOptions::database`], opened
    pub fn open_database(&self) -> Result<Database, Box<dyn std::error::Error>> {
        let mut db = self.database()?;
        db.open()?;
        Ok(db)
    }
}

/// Print a JSON value to stdout
pub fn print_json(value: &serde_json::Value) -> CommandResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
