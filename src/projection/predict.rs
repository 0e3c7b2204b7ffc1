//! Forward-week point estimates and stable ranking.

use rayon::prelude::*;
use serde::Serialize;

use super::regression::ModelSet;
use super::types::ForwardRow;
use crate::cli::types::{PlayerId, Position};
use crate::error::Result;

/// A forward row paired with its point estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate {
    pub row: ForwardRow,
    pub mu: f64,
}

/// A player left without a projection because their position has no model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unmodeled {
    pub player_id: PlayerId,
    pub player_name: String,
    pub position: Position,
}

#[derive(Debug, Clone, Default)]
pub struct Predictions {
    pub estimates: Vec<Estimate>,
    pub unmodeled: Vec<Unmodeled>,
}

/// Apply each position's model to its players.
///
/// Players at a position without a model get no estimate; a missing
/// feature on a modeled player is an error.
pub fn predict_rows(models: &ModelSet, rows: Vec<ForwardRow>) -> Result<Predictions> {
    let (modeled, unmodeled): (Vec<ForwardRow>, Vec<ForwardRow>) = rows
        .into_iter()
        .partition(|row| models.get(row.position).is_some());

    let estimates = modeled
        .into_par_iter()
        .filter_map(|row| {
            models.get(row.position).map(|model| {
                model
                    .predict(&row.player_id, &row.features)
                    .map(|mu| Estimate { row, mu })
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Predictions {
        estimates,
        unmodeled: unmodeled
            .into_iter()
            .map(|row| Unmodeled {
                player_id: row.player_id,
                player_name: row.player_name,
                position: row.position,
            })
            .collect(),
    })
}

/// Sort by descending estimate. Equal estimates keep encounter order.
pub fn rank_by_mu(estimates: &mut [Estimate]) {
    estimates.sort_by(|a, b| b.mu.total_cmp(&a.mu));
}
