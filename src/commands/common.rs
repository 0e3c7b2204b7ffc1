//! Common utilities shared across commands.
//!
//! Path resolution for the database and config file, and the context most
//! commands start from.

use std::env;
use std::path::PathBuf;

use crate::{
    core::config::{default_config_path, ConfigOverrides, PipelineConfig},
    error::ProjError,
    storage::ProjectionDatabase,
    Result, CONFIG_ENV_VAR, DB_ENV_VAR,
};

/// Default database location: `<data_dir>/ffl-proj/fantasy.db`.
pub fn default_database_path() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("ffl-proj").join("fantasy.db"))
}

/// `--db`, else `FFL_PROJ_DB`, else the platform data directory.
pub fn resolve_database_path(db: Option<PathBuf>) -> Result<PathBuf> {
    db.or_else(|| env::var_os(DB_ENV_VAR).map(PathBuf::from))
        .or_else(default_database_path)
        .ok_or_else(|| ProjError::NoHomeDirectory {
            kind: "data".to_string(),
        })
}

/// `--config`, else `FFL_PROJ_CONFIG`, else the default path if a file
/// exists there. `None` means run on defaults.
pub fn resolve_config_path(config: Option<PathBuf>) -> Option<PathBuf> {
    config
        .or_else(|| env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
        .or_else(|| default_config_path().filter(|path| path.is_file()))
}

/// Context containing the resources every command needs
pub struct CommandContext {
    pub db: ProjectionDatabase,
    pub config: PipelineConfig,
}

impl CommandContext {
    /// Resolve the config and open the database
    pub fn new(
        db: Option<PathBuf>,
        config: Option<PathBuf>,
        overrides: &ConfigOverrides,
    ) -> Result<Self> {
        let config_path = resolve_config_path(config);
        let config = PipelineConfig::resolve(config_path.as_deref(), overrides)?;

        let db_path = resolve_database_path(db)?;
        tracing::info!(path = %db_path.display(), "Opening database");
        let db = ProjectionDatabase::open(&db_path)?;

        Ok(Self { db, config })
    }

    /// Context over an existing database, used by tests
    pub fn with_database(db: ProjectionDatabase, config: PipelineConfig) -> Self {
        Self { db, config }
    }
}

/// Format an optional stat for table output.
pub fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.1}", v))
}
