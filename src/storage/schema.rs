//! Database schema and connection management

use rusqlite::Connection;
use std::path::Path;

use crate::core::cache::{TableCache, TableKey};
use crate::error::Result;
use crate::projection::types::{BaselineUsage, DefenseStrength, PlayerWeekRecord, ProjectionRow};

pub const PLAYER_WEEKS: &str = "player_weeks";
pub const DEFENSE_STRENGTH: &str = "defense_strength";
pub const WEEK_INPUTS: &str = "week_inputs";
pub const MODEL_COEFFICIENTS: &str = "model_coefficients";
pub const MODEL_RESIDUALS: &str = "model_residuals";
pub const PROJECTIONS: &str = "projections";

const CACHE_CAPACITY: usize = 32;

/// Read-through caches for the tables the pipeline loads.
pub struct TableCaches {
    pub history: TableCache<TableKey, Vec<PlayerWeekRecord>>,
    pub defense: TableCache<TableKey, DefenseStrength>,
    pub week_inputs: TableCache<TableKey, Vec<BaselineUsage>>,
    pub projections: TableCache<TableKey, Vec<ProjectionRow>>,
}

impl TableCaches {
    fn new(capacity: usize) -> Self {
        Self {
            history: TableCache::new(capacity),
            defense: TableCache::new(capacity),
            week_inputs: TableCache::new(capacity),
            projections: TableCache::new(capacity),
        }
    }

    /// Drop every cached entry that was loaded from, or joined with, `table`.
    pub fn invalidate_table(&self, table: &str) {
        self.history.invalidate_table(table);
        self.defense.invalidate_table(table);
        self.week_inputs.invalidate_table(table);
        self.projections.invalidate_table(table);
        // History and week inputs are joined with the defense table
        if table == DEFENSE_STRENGTH {
            self.history.invalidate_table(PLAYER_WEEKS);
            self.week_inputs.invalidate_table(WEEK_INPUTS);
        }
    }

    pub fn clear(&self) {
        self.history.clear();
        self.defense.clear();
        self.week_inputs.clear();
        self.projections.clear();
    }
}

/// SQLite-backed store for pipeline inputs and outputs
pub struct ProjectionDatabase {
    pub(crate) conn: Connection,
    pub(crate) caches: TableCaches,
}

impl ProjectionDatabase {
    /// Open (or create) the database file and ensure tables exist
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// In-memory database, used by tests
    pub fn new_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let mut db = Self {
            conn,
            caches: TableCaches::new(CACHE_CAPACITY),
        };
        db.initialize_schema()?;
        Ok(db)
    }

    pub fn caches(&self) -> &TableCaches {
        &self.caches
    }

    /// Initialize the database schema
    pub(crate) fn initialize_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS player_weeks (
                playerID TEXT NOT NULL,
                playerName TEXT NOT NULL,
                team TEXT NOT NULL,
                position TEXT NOT NULL,
                opponent TEXT NOT NULL,
                week_num INTEGER NOT NULL,
                pass_att REAL,
                pass_cmp REAL,
                pass_yd REAL,
                pass_td REAL,
                pass_int REAL,
                rush_att REAL,
                rush_yd REAL,
                rush_td REAL,
                rec_tgt REAL,
                rec REAL,
                rec_yd REAL,
                rec_td REAL,
                off_snp REAL,
                pts_ppr REAL,
                ease_factor REAL,
                PRIMARY KEY (playerID, week_num)
            );

            CREATE INDEX IF NOT EXISTS idx_player_weeks_week
                ON player_weeks(week_num);

            CREATE TABLE IF NOT EXISTS defense_strength (
                defense_team TEXT NOT NULL,
                position TEXT NOT NULL,
                ease_factor REAL NOT NULL,
                PRIMARY KEY (defense_team, position)
            );

            CREATE TABLE IF NOT EXISTS week_inputs (
                playerID TEXT NOT NULL,
                playerName TEXT NOT NULL,
                team TEXT NOT NULL,
                position TEXT NOT NULL,
                opponent TEXT NOT NULL,
                week_num INTEGER NOT NULL,
                rec_tgt_base REAL,
                rush_att_base REAL,
                pass_att_base REAL,
                off_snp_base REAL,
                ease_base REAL,
                PRIMARY KEY (playerID, week_num)
            );

            CREATE TABLE IF NOT EXISTS model_coefficients (
                position TEXT NOT NULL,
                feature TEXT NOT NULL,
                coefficient REAL NOT NULL,
                PRIMARY KEY (position, feature)
            );

            CREATE TABLE IF NOT EXISTS model_residuals (
                position TEXT NOT NULL,
                playerID TEXT NOT NULL,
                week_num INTEGER NOT NULL,
                residual REAL NOT NULL
            );

            CREATE TABLE IF NOT EXISTS projections (
                week_num INTEGER NOT NULL,
                playerID TEXT NOT NULL,
                playerName TEXT NOT NULL,
                team TEXT NOT NULL,
                position TEXT NOT NULL,
                opponent TEXT NOT NULL,
                rank INTEGER NOT NULL,
                mu REAL NOT NULL,
                median REAL NOT NULL,
                p10 REAL NOT NULL,
                p90 REAL NOT NULL,
                proj_pass_att REAL,
                proj_pass_cmp REAL,
                proj_pass_yd REAL,
                proj_pass_td REAL,
                proj_pass_int REAL,
                proj_rush_att REAL,
                proj_rush_yd REAL,
                proj_rush_td REAL,
                proj_rec_tgt REAL,
                proj_rec REAL,
                proj_rec_yd REAL,
                proj_rec_td REAL,
                PRIMARY KEY (week_num, playerID)
            );",
        )?;

        Ok(())
    }
}
