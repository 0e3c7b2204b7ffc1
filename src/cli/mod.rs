//! CLI argument definitions and parsing.

pub mod types;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use types::{Position, Week};

use crate::core::config::{ConfigOverrides, ResidualScope};

/// Options shared by every command
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// SQLite database path (or set `FFL_PROJ_DB` env var).
    #[clap(long, global = true)]
    pub db: Option<PathBuf>,

    /// JSON config file (or set `FFL_PROJ_CONFIG` env var).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Seed for the Monte Carlo draws; a random seed is used when omitted.
    #[clap(long, global = true)]
    pub seed: Option<u64>,

    /// Log stage progress to stderr.
    #[clap(long, short, global = true)]
    pub verbose: bool,
}

/// Training window and simulation settings; unset flags keep the config value.
#[derive(Debug, Args)]
pub struct PipelineArgs {
    /// First training week (inclusive).
    #[clap(long)]
    pub train_start: Option<Week>,

    /// Last training week (inclusive).
    #[clap(long)]
    pub train_end: Option<Week>,

    /// Week to project.
    #[clap(long, short = 'w')]
    pub week: Option<Week>,

    /// Minimum training rows before a position is modeled.
    #[clap(long)]
    pub min_rows: Option<usize>,

    /// Monte Carlo draws per player.
    #[clap(long)]
    pub simulations: Option<usize>,

    /// Residual pool each player resamples from.
    #[clap(long, value_enum)]
    pub residual_scope: Option<ResidualScope>,
}

impl PipelineArgs {
    pub fn overrides(&self, seed: Option<u64>) -> ConfigOverrides {
        ConfigOverrides {
            train_start: self.train_start,
            train_end: self.train_end,
            target_week: self.week,
            min_training_rows: self.min_rows,
            simulations: self.simulations,
            residual_scope: self.residual_scope,
            seed,
        }
    }
}

#[derive(Debug, Parser)]
#[clap(
    name = "ffl-proj",
    about = "Weekly fantasy football projections: per-position regression plus Monte Carlo"
)]
pub struct Cli {
    #[clap(flatten)]
    pub global: GlobalArgs,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fit one regression per position and store coefficients and residuals.
    Train {
        #[clap(flatten)]
        pipeline: PipelineArgs,

        /// Output the fitted models as JSON.
        #[clap(long)]
        json: bool,
    },

    /// Run the full pipeline for the target week and store projections.
    Project {
        #[clap(flatten)]
        pipeline: PipelineArgs,

        /// Number of players to print.
        #[clap(long, short = 't', default_value_t = 10)]
        top: usize,

        /// Also print each player's projected stat line.
        #[clap(long)]
        stats: bool,

        /// Output every projection as JSON instead of text lines.
        #[clap(long)]
        json: bool,
    },

    /// Show stored projections ranked by median with boom/bust odds.
    Rankings {
        /// Week to show (defaults to the latest projected week).
        #[clap(long, short = 'w')]
        week: Option<Week>,

        /// Filter by position (repeatable): `-p QB -p WR`.
        #[clap(short = 'p', long = "position")]
        positions: Option<Vec<Position>>,

        /// Filter by player name (case-insensitive substring).
        #[clap(long, short = 'n')]
        player_name: Option<String>,

        /// Show at most this many rows.
        #[clap(long, short = 'l')]
        limit: Option<usize>,

        /// Boom/bust draws per player.
        #[clap(long)]
        simulations: Option<usize>,

        /// Output results as JSON instead of text lines.
        #[clap(long)]
        json: bool,
    },

    /// Check how well the defense ease factor alone explains points, per position.
    ValidateEase {
        /// Last week of history to use (defaults to the training window end).
        #[clap(long, short = 'w')]
        through_week: Option<Week>,

        /// Output the per-position fits as JSON.
        #[clap(long)]
        json: bool,
    },
}
