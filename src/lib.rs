//! Weekly fantasy football projections
//!
//! Fits one ordinary-least-squares model per position on historical
//! player-weeks, predicts a forward week, and turns each point estimate into
//! a projection interval by resampling training residuals.
//!
//! ## Pipeline
//!
//! - **Features**: share-of-team usage, per-attempt efficiency and
//!   opponent ease, computed over the whole history at once
//! - **Regression**: a fixed feature set per position, solved by SVD
//! - **Prediction**: forward-week features from baseline usage and clamped
//!   season-to-date rates
//! - **Simulation**: 5,000 residual resamples per player, reduced to
//!   p10/median/p90
//! - **Board**: median ranking with boom/bust odds
//! - **Ease check**: per-position fit of points on the defense ease factor
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ffl_proj::{core::PipelineConfig, storage::ProjectionDatabase, Week};
//! use ffl_proj::projection::{run, PipelineInputs};
//!
//! # fn example() -> ffl_proj::Result<()> {
//! let db = ProjectionDatabase::open(std::path::Path::new("fantasy.db"))?;
//! let config = PipelineConfig { seed: Some(42), ..Default::default() };
//!
//! let inputs = PipelineInputs {
//!     history: db.load_history(Week::new(10))?,
//!     defense: db.load_defense_strength()?,
//!     baselines: db.load_week_inputs(config.target_week)?,
//! };
//! let projection = run(&inputs, &config)?;
//! println!("{} players projected", projection.projections.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Environment Configuration
//!
//! ```bash
//! export FFL_PROJ_DB=/path/to/fantasy.db
//! export FFL_PROJ_CONFIG=/path/to/config.json
//! ```

pub mod cli;
pub mod commands;
pub mod core;
pub mod error;
pub mod projection;
pub mod storage;

// Re-export commonly used types
pub use cli::types::{PlayerId, Position, Week};
pub use error::{ProjError, Result};

pub const DB_ENV_VAR: &str = "FFL_PROJ_DB";
pub const CONFIG_ENV_VAR: &str = "FFL_PROJ_CONFIG";
