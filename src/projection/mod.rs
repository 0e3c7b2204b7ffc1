//! The projection pipeline
//!
//! - `types`: records, feature vectors and projection rows
//! - `profile`: fixed per-position feature sets, rate bounds and filters
//! - `features`: training and forward-week feature engineering
//! - `regression`: per-position OLS fitting
//! - `predict`: forward-week point estimates
//! - `simulate`: residual-resampling Monte Carlo
//! - `boom_bust`: tail odds from the simulated interval
//! - `ease_check`: how well the defense ease factor alone explains points
//! - `pipeline`: the end-to-end run
//! - `board`: the filtered ranking board

pub mod board;
pub mod boom_bust;
pub mod ease_check;
pub mod features;
pub mod pipeline;
pub mod predict;
pub mod profile;
pub mod regression;
pub mod simulate;
pub mod types;

pub use board::{build_board, BoardFilter, BoardRow};
pub use ease_check::{validate_ease, EaseFit, EaseReport};
pub use pipeline::{run, train, PipelineInputs, ProjectionRun};
pub use regression::{ModelSet, PositionModel};
pub use types::{
    BaselineUsage, DefenseStrength, PlayerWeekRecord, ProjectionRow, Stat, StatLine,
};
