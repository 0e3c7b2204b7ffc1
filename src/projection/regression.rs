//! Ordinary least squares fitting, one model per position.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::profile::PositionProfile;
use super::types::{Feature, FeatureVector, TrainingRow};
use crate::cli::types::{PlayerId, Position, Week};
use crate::error::{ProjError, Result};

/// Signed training error (actual − predicted) for one player-week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Residual {
    pub player_id: PlayerId,
    pub week: Week,
    pub value: f64,
}

/// A fitted linear model for one position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionModel {
    pub position: Position,
    pub features: Vec<Feature>,
    pub intercept: f64,
    /// Aligned with `features`.
    pub coefficients: Vec<f64>,
    pub residuals: Vec<Residual>,
    pub r_squared: f64,
}

impl PositionModel {
    pub fn n_rows(&self) -> usize {
        self.residuals.len()
    }

    /// `(feature name, coefficient)` pairs, intercept first.
    pub fn coefficient_table(&self) -> Vec<(String, f64)> {
        std::iter::once(("intercept".to_string(), self.intercept))
            .chain(
                self.features
                    .iter()
                    .zip(&self.coefficients)
                    .map(|(f, c)| (f.to_string(), *c)),
            )
            .collect()
    }

    /// Intercept plus the dot product of coefficients and features.
    pub fn predict(&self, player_id: &PlayerId, features: &FeatureVector) -> Result<f64> {
        let values = features
            .ordered(&self.features)
            .map_err(|missing| ProjError::MissingFeature {
                position: self.position,
                player_id: player_id.clone(),
                feature: missing.to_string(),
            })?;

        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(&values)
                .map(|(c, x)| c * x)
                .sum::<f64>())
    }

    pub fn residual_values(&self) -> Vec<f64> {
        self.residuals.iter().map(|r| r.value).collect()
    }
}

/// A position that was not fitted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedPosition {
    pub position: Position,
    pub rows: usize,
    pub required: usize,
}

/// The outcome of one training run across all positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModelSet {
    pub models: BTreeMap<Position, PositionModel>,
    pub skipped: Vec<SkippedPosition>,
}

impl ModelSet {
    pub fn get(&self, position: Position) -> Option<&PositionModel> {
        self.models.get(&position)
    }
}

/// Inclusive training-week window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TrainingWindow {
    pub start: Week,
    pub end: Week,
}

impl TrainingWindow {
    pub fn contains(&self, week: Week) -> bool {
        week >= self.start && week <= self.end
    }
}

/// Fit one position's model from the rows that have every required
/// feature and a realized point total.
///
/// Rows with missing values are dropped rather than imputed.
pub fn fit_position(
    position: Position,
    rows: &[TrainingRow],
    window: TrainingWindow,
    min_rows: usize,
) -> Result<PositionModel> {
    let profile = PositionProfile::for_position(position);
    let n_features = profile.features.len();

    let mut ids = Vec::new();
    let mut design = Vec::new();
    let mut targets = Vec::new();

    for row in rows
        .iter()
        .filter(|r| r.position == position && window.contains(r.week))
    {
        let (Some(pts), Ok(values)) = (row.pts_ppr, row.features.ordered(profile.features))
        else {
            continue;
        };
        if !pts.is_finite() || values.iter().any(|v| !v.is_finite()) {
            continue;
        }
        design.push(1.0);
        design.extend(values);
        targets.push(pts);
        ids.push((row.player_id.clone(), row.week));
    }

    let n = targets.len();
    if n < min_rows {
        return Err(ProjError::InsufficientTrainingData {
            position,
            rows: n,
            required: min_rows,
        });
    }

    let x = DMatrix::from_row_slice(n, n_features + 1, &design);
    let y = DVector::from_vec(targets);

    let beta = least_squares(&x, &y).map_err(|message| ProjError::Regression {
        position,
        message: message.to_string(),
    })?;

    let fitted = &x * &beta;
    let residual_vec = &y - &fitted;

    let mean = y.mean();
    let ss_tot: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let ss_res: f64 = residual_vec.iter().map(|r| r.powi(2)).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    let residuals = ids
        .into_iter()
        .zip(residual_vec.iter())
        .map(|((player_id, week), value)| Residual {
            player_id,
            week,
            value: *value,
        })
        .collect();

    Ok(PositionModel {
        position,
        features: profile.features.to_vec(),
        intercept: beta[0],
        coefficients: beta.iter().skip(1).copied().collect(),
        residuals,
        r_squared,
    })
}

/// Solve `x * beta ≈ y` by SVD.
///
/// Collinear columns yield the minimum-norm solution instead of an error.
pub(crate) fn least_squares(
    x: &DMatrix<f64>,
    y: &DVector<f64>,
) -> std::result::Result<DVector<f64>, &'static str> {
    let svd = x.clone().svd(true, true);
    let max_singular = svd.singular_values.max();
    let eps = max_singular * (x.nrows().max(x.ncols()) as f64) * f64::EPSILON;
    svd.solve(y, eps)
}

/// Fit every modeled position independently.
///
/// A position below `min_rows` is recorded in `skipped`; any other failure
/// aborts the run.
pub fn fit_all(rows: &[TrainingRow], window: TrainingWindow, min_rows: usize) -> Result<ModelSet> {
    let results: Vec<(Position, Result<PositionModel>)> = Position::ALL
        .par_iter()
        .map(|&position| (position, fit_position(position, rows, window, min_rows)))
        .collect();

    let mut set = ModelSet::default();
    for (position, result) in results {
        match result {
            Ok(model) => {
                info!(
                    position = %position,
                    n = model.n_rows(),
                    r_squared = model.r_squared,
                    "Fitted position model"
                );
                set.models.insert(position, model);
            }
            Err(ProjError::InsufficientTrainingData {
                position,
                rows,
                required,
            }) => {
                warn!(
                    position = %position,
                    rows,
                    required,
                    "Skipping position: not enough training rows"
                );
                set.skipped.push(SkippedPosition {
                    position,
                    rows,
                    required,
                });
            }
            Err(e) => return Err(e),
        }
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wr_row(id: &str, week: u16, tgt: f64, pts: Option<f64>) -> TrainingRow {
        let mut features = FeatureVector::new();
        features.set(Feature::RecTgt, tgt);
        features.set(Feature::Rec, tgt * 0.6);
        features.set(Feature::RecYd, tgt * 8.0 + (week as f64));
        features.set(Feature::RecTd, if week % 3 == 0 { 1.0 } else { 0.0 });
        features.set(Feature::OffSnp, 40.0 + tgt);
        features.set(Feature::EaseFactor, 1.0 + (week as f64) * 0.01);
        TrainingRow {
            player_id: PlayerId::new(id),
            position: Position::WR,
            week: Week::new(week),
            pts_ppr: pts,
            features,
        }
    }

    fn window() -> TrainingWindow {
        TrainingWindow {
            start: Week::new(1),
            end: Week::new(9),
        }
    }

    #[test]
    fn test_recovers_exact_linear_relationship() {
        // pts = 2 + 1.5 * rec_tgt when the other features add nothing
        let mut rows = Vec::new();
        for week in 1..=9u16 {
            let tgt = (week as f64) * 1.3 + 2.0;
            let mut row = wr_row("W1", week, tgt, None);
            row.features.set(Feature::Rec, 0.0);
            row.features.set(Feature::RecYd, 0.0);
            row.features.set(Feature::RecTd, 0.0);
            row.features.set(Feature::OffSnp, 0.0);
            row.features.set(Feature::EaseFactor, 0.0);
            row.pts_ppr = Some(2.0 + 1.5 * tgt);
            rows.push(row);
        }

        let model = fit_position(Position::WR, &rows, window(), 5).unwrap();
        assert!((model.intercept - 2.0).abs() < 1e-6);
        assert!((model.coefficients[0] - 1.5).abs() < 1e-6);
        assert!(model.residuals.iter().all(|r| r.value.abs() < 1e-6));
        assert!((model.r_squared - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_rows_with_missing_values_are_dropped() {
        let mut rows: Vec<TrainingRow> = (1..=6u16)
            .map(|w| wr_row("W1", w, w as f64 + 3.0, Some(10.0 + w as f64)))
            .collect();
        rows.push(wr_row("W2", 2, 5.0, None));
        let mut no_ease = wr_row("W3", 2, 5.0, Some(8.0));
        no_ease.features = FeatureVector::new();
        rows.push(no_ease);

        let model = fit_position(Position::WR, &rows, window(), 5).unwrap();
        assert_eq!(model.n_rows(), 6);
    }

    #[test]
    fn test_window_filters_weeks() {
        let rows: Vec<TrainingRow> = (1..=12u16)
            .map(|w| wr_row("W1", w, w as f64, Some(w as f64 * 2.0)))
            .collect();

        let model = fit_position(Position::WR, &rows, window(), 5).unwrap();
        assert_eq!(model.n_rows(), 9);
        assert!(model.residuals.iter().all(|r| r.week <= Week::new(9)));
    }

    #[test]
    fn test_insufficient_rows() {
        let rows: Vec<TrainingRow> = (1..=3u16)
            .map(|w| wr_row("W1", w, 5.0, Some(12.0)))
            .collect();

        match fit_position(Position::WR, &rows, window(), 5) {
            Err(ProjError::InsufficientTrainingData { rows, required, .. }) => {
                assert_eq!(rows, 3);
                assert_eq!(required, 5);
            }
            other => panic!("Expected InsufficientTrainingData, got {:?}", other),
        }
    }

    #[test]
    fn test_collinear_features_still_fit() {
        // Every row has identical off_snp and ease_factor
        let rows: Vec<TrainingRow> = (1..=8u16)
            .map(|w| {
                let mut row = wr_row("W1", w, w as f64, Some(3.0 * w as f64));
                row.features.set(Feature::OffSnp, 50.0);
                row.features.set(Feature::EaseFactor, 1.0);
                row
            })
            .collect();

        let model = fit_position(Position::WR, &rows, window(), 5).unwrap();
        assert!(model.intercept.is_finite());
        assert!(model.coefficients.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn test_predict_requires_every_feature() {
        let rows: Vec<TrainingRow> = (1..=9u16)
            .map(|w| wr_row("W1", w, w as f64 + 1.0, Some(4.0 + w as f64)))
            .collect();
        let model = fit_position(Position::WR, &rows, window(), 5).unwrap();

        let mut partial = FeatureVector::new();
        partial.set(Feature::RecTgt, 7.0);
        match model.predict(&PlayerId::new("X"), &partial) {
            Err(ProjError::MissingFeature { feature, .. }) => assert_eq!(feature, "rec"),
            other => panic!("Expected MissingFeature, got {:?}", other),
        }

        let full = rows[3].features.clone();
        let mu = model.predict(&PlayerId::new("W1"), &full).unwrap();
        let fitted = rows[3].pts_ppr.unwrap() - model.residuals[3].value;
        assert!((mu - fitted).abs() < 1e-6);
    }

    #[test]
    fn test_fit_all_reports_skipped_positions() {
        let rows: Vec<TrainingRow> = (1..=9u16)
            .map(|w| wr_row("W1", w, w as f64 + 1.0, Some(4.0 + w as f64)))
            .collect();

        let set = fit_all(&rows, window(), 5).unwrap();
        assert!(set.get(Position::WR).is_some());
        assert_eq!(set.skipped.len(), 3);
        assert!(set.skipped.iter().all(|s| s.rows == 0 && s.required == 5));
        assert_eq!(set.skipped[0].position, Position::QB);
    }

    #[test]
    fn test_coefficient_table_has_intercept_first() {
        let rows: Vec<TrainingRow> = (1..=9u16)
            .map(|w| wr_row("W1", w, w as f64 + 1.0, Some(4.0 + w as f64)))
            .collect();
        let model = fit_position(Position::WR, &rows, window(), 5).unwrap();

        let table = model.coefficient_table();
        assert_eq!(table.len(), 7);
        assert_eq!(table[0].0, "intercept");
        assert_eq!(table[1].0, "rec_tgt");
        assert_eq!(table[6].0, "ease_factor");
    }
}
