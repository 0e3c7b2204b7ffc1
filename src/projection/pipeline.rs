//! End-to-end projection run: features, training, prediction, simulation.
//!
//! The pipeline takes its data as explicit parameters and returns plain
//! values; reading and writing tables is the caller's job.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info};

use super::features::{build_forward_rows, build_training_rows, Exclusion};
use super::predict::{predict_rows, rank_by_mu, Unmodeled};
use super::regression::{fit_all, ModelSet};
use super::simulate::{player_rng, Simulator};
use super::types::{BaselineUsage, DefenseStrength, PlayerWeekRecord, ProjectionRow};
use crate::cli::types::{PlayerId, Position, Week};
use crate::core::config::{PipelineConfig, ResidualScope};
use crate::error::Result;

/// Everything a projection run reads.
#[derive(Debug, Clone, Default)]
pub struct PipelineInputs {
    /// Historical player-weeks. Weeks at or after the target are ignored.
    pub history: Vec<PlayerWeekRecord>,
    pub defense: DefenseStrength,
    /// Forward-week baseline usage for the target week.
    pub baselines: Vec<BaselineUsage>,
}

/// The outcome of one projection run.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectionRun {
    pub target_week: Week,
    /// Seed actually used, so an unseeded run can be replayed.
    pub seed: u64,
    pub models: ModelSet,
    pub projections: Vec<ProjectionRow>,
    pub excluded: Vec<Exclusion>,
    pub unmodeled: Vec<Unmodeled>,
}

/// The configured seed, or a fresh random one.
pub fn resolve_seed(config: &PipelineConfig) -> u64 {
    match config.seed {
        Some(seed) => seed,
        None => {
            let seed = rand::random::<u64>();
            info!(seed, "No seed configured, drew a random one");
            seed
        }
    }
}

/// Fit one model per position on the configured training window.
pub fn train(
    history: &[PlayerWeekRecord],
    defense: &DefenseStrength,
    config: &PipelineConfig,
) -> Result<ModelSet> {
    let rows = build_training_rows(history, defense);
    info!(
        rows = rows.len(),
        start = %config.train_start,
        end = %config.train_end,
        "Built training rows"
    );
    fit_all(&rows, config.window(), config.min_training_rows)
}

/// Residual pools, keyed by position or by player depending on scope.
enum ResidualPools {
    Position(HashMap<Position, Vec<f64>>),
    Player(HashMap<PlayerId, Vec<f64>>),
}

impl ResidualPools {
    fn build(models: &ModelSet, scope: ResidualScope) -> Self {
        match scope {
            ResidualScope::Position => Self::Position(
                models
                    .models
                    .iter()
                    .map(|(position, model)| (*position, model.residual_values()))
                    .collect(),
            ),
            ResidualScope::Player => {
                let mut pools: HashMap<PlayerId, Vec<f64>> = HashMap::new();
                for model in models.models.values() {
                    for residual in &model.residuals {
                        pools
                            .entry(residual.player_id.clone())
                            .or_default()
                            .push(residual.value);
                    }
                }
                Self::Player(pools)
            }
        }
    }

    fn pool(&self, player_id: &PlayerId, position: Position) -> &[f64] {
        let pool = match self {
            Self::Position(pools) => pools.get(&position),
            Self::Player(pools) => pools.get(player_id),
        };
        pool.map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Run the whole pipeline for `config.target_week`.
pub fn run(inputs: &PipelineInputs, config: &PipelineConfig) -> Result<ProjectionRun> {
    config.validate()?;
    let seed = resolve_seed(config);
    let target_week = config.target_week;

    let history: Vec<PlayerWeekRecord> = inputs
        .history
        .iter()
        .filter(|r| r.week < target_week)
        .cloned()
        .collect();

    let models = train(&history, &inputs.defense, config)?;

    let forward = build_forward_rows(
        &inputs.baselines,
        &history,
        &inputs.defense,
        config.min_rate_volume,
    )?;
    info!(
        players = forward.rows.len(),
        excluded = forward.excluded.len(),
        "Built forward-week features"
    );

    let predictions = predict_rows(&models, forward.rows)?;
    let mut estimates = predictions.estimates;
    rank_by_mu(&mut estimates);

    let pools = ResidualPools::build(&models, config.residual_scope);
    let simulator = Simulator::new(config.simulations, config.fallback_std);

    let projections: Vec<ProjectionRow> = estimates
        .into_par_iter()
        .enumerate()
        .map(|(idx, estimate)| {
            let row = estimate.row;
            let pool = pools.pool(&row.player_id, row.position);
            if pool.is_empty() {
                debug!(player = %row.player_id, "Empty residual pool, using normal fallback");
            }
            let mut rng = player_rng(seed, idx as u64);
            let interval = simulator.simulate(estimate.mu, pool, &mut rng);

            ProjectionRow {
                player_id: row.player_id,
                player_name: row.player_name,
                team: row.team,
                position: row.position,
                opponent: row.opponent,
                week: row.week,
                rank: idx as u32 + 1,
                mu: estimate.mu,
                median: interval.median,
                p10: interval.p10,
                p90: interval.p90,
                statline: row.statline,
            }
        })
        .collect();

    info!(
        week = %target_week,
        projections = projections.len(),
        unmodeled = predictions.unmodeled.len(),
        seed,
        "Projection run complete"
    );

    Ok(ProjectionRun {
        target_week,
        seed,
        models,
        projections,
        excluded: forward.excluded,
        unmodeled: predictions.unmodeled,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::regression::{PositionModel, Residual};

    fn model_with_residuals(position: Position, residuals: &[(&str, f64)]) -> PositionModel {
        PositionModel {
            position,
            features: Vec::new(),
            intercept: 0.0,
            coefficients: Vec::new(),
            residuals: residuals
                .iter()
                .map(|(id, value)| Residual {
                    player_id: PlayerId::new(*id),
                    week: Week::new(1),
                    value: *value,
                })
                .collect(),
            r_squared: 0.0,
        }
    }

    fn model_set() -> ModelSet {
        let mut set = ModelSet::default();
        set.models.insert(
            Position::WR,
            model_with_residuals(Position::WR, &[("A", 1.0), ("B", -2.0), ("A", 3.0)]),
        );
        set.models
            .insert(Position::TE, model_with_residuals(Position::TE, &[("T", 0.5)]));
        set
    }

    #[test]
    fn test_position_scope_pools_whole_position() {
        let pools = ResidualPools::build(&model_set(), ResidualScope::Position);
        assert_eq!(pools.pool(&PlayerId::new("Z"), Position::WR), &[1.0, -2.0, 3.0]);
        assert!(pools.pool(&PlayerId::new("A"), Position::QB).is_empty());
    }

    #[test]
    fn test_player_scope_pools_own_residuals() {
        let pools = ResidualPools::build(&model_set(), ResidualScope::Player);
        assert_eq!(pools.pool(&PlayerId::new("A"), Position::WR), &[1.0, 3.0]);
        assert_eq!(pools.pool(&PlayerId::new("T"), Position::TE), &[0.5]);
        assert!(pools.pool(&PlayerId::new("rookie"), Position::WR).is_empty());
    }

    #[test]
    fn test_configured_seed_is_used() {
        let config = PipelineConfig {
            seed: Some(1234),
            ..Default::default()
        };
        assert_eq!(resolve_seed(&config), 1234);
    }

    #[test]
    fn test_run_with_no_inputs_is_empty() {
        let config = PipelineConfig {
            seed: Some(1),
            ..Default::default()
        };
        let run = run(&PipelineInputs::default(), &config).unwrap();
        assert!(run.projections.is_empty());
        assert!(run.models.models.is_empty());
        assert_eq!(run.models.skipped.len(), 4);
        assert_eq!(run.seed, 1);
    }
}
