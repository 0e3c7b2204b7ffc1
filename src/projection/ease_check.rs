//! How much the defense ease factor alone explains realized PPR points.
//!
//! Each position's player-weeks are joined to the defense table by
//! (opponent, position) and `pts_ppr` is regressed on the ease value.

use nalgebra::{DMatrix, DVector};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

use super::regression::{least_squares, SkippedPosition};
use super::types::{DefenseStrength, PlayerWeekRecord};
use crate::cli::types::Position;
use crate::error::{ProjError, Result};

/// Single-feature fit of `pts_ppr` on ease for one position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EaseFit {
    pub position: Position,
    pub n: usize,
    pub r_squared: f64,
    pub intercept: f64,
    pub coefficient: f64,
    pub pearson_r: f64,
    /// Two-sided p-value of `pearson_r` against zero correlation.
    pub p_value: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EaseReport {
    pub fits: Vec<EaseFit>,
    pub skipped: Vec<SkippedPosition>,
}

/// `(ease, pts_ppr)` pairs per position. Rows without points or without a
/// defense entry for their opponent are left out.
pub fn ease_samples(
    history: &[PlayerWeekRecord],
    defense: &DefenseStrength,
) -> BTreeMap<Position, (Vec<f64>, Vec<f64>)> {
    let mut samples: BTreeMap<Position, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for record in history {
        let (Some(pts), Some(ease)) = (
            record.pts_ppr,
            defense.ease_for(&record.opponent, record.position),
        ) else {
            continue;
        };
        let entry = samples.entry(record.position).or_default();
        entry.0.push(ease);
        entry.1.push(pts);
    }
    samples
}

/// Fit every position with at least `min_rows` joined rows.
pub fn validate_ease(
    history: &[PlayerWeekRecord],
    defense: &DefenseStrength,
    min_rows: usize,
) -> Result<EaseReport> {
    let mut report = EaseReport::default();

    for (position, (ease, pts)) in ease_samples(history, defense) {
        if ease.len() < min_rows {
            warn!(
                position = %position,
                rows = ease.len(),
                required = min_rows,
                "Skipping ease check: not enough rows"
            );
            report.skipped.push(SkippedPosition {
                position,
                rows: ease.len(),
                required: min_rows,
            });
            continue;
        }

        let fit = fit_ease(position, &ease, &pts)?;
        info!(
            position = %position,
            n = fit.n,
            r = fit.pearson_r,
            p = fit.p_value,
            "Checked ease factor"
        );
        report.fits.push(fit);
    }

    Ok(report)
}

fn fit_ease(position: Position, ease: &[f64], pts: &[f64]) -> Result<EaseFit> {
    let n = ease.len();
    let design: Vec<f64> = ease.iter().flat_map(|e| [1.0, *e]).collect();
    let x = DMatrix::from_row_slice(n, 2, &design);
    let y = DVector::from_column_slice(pts);

    let beta = least_squares(&x, &y).map_err(|message| ProjError::Regression {
        position,
        message: message.to_string(),
    })?;

    let residuals = &y - &x * &beta;
    let mean = y.mean();
    let ss_tot: f64 = y.iter().map(|v| (v - mean).powi(2)).sum();
    let ss_res: f64 = residuals.iter().map(|r| r.powi(2)).sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 0.0 };

    let pearson_r = pearson(ease, pts);
    Ok(EaseFit {
        position,
        n,
        r_squared,
        intercept: beta[0],
        coefficient: beta[1],
        pearson_r,
        p_value: correlation_p_value(pearson_r, n),
    })
}

/// Pearson correlation; 0 when either side has no variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    let n = xs.len().min(ys.len());
    if n == 0 {
        return 0.0;
    }
    let mean_x = xs[..n].iter().sum::<f64>() / n as f64;
    let mean_y = ys[..n].iter().sum::<f64>() / n as f64;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in xs[..n].iter().zip(&ys[..n]) {
        let dx = x - mean_x;
        let dy = y - mean_y;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }

    if sxx <= 0.0 || syy <= 0.0 {
        return 0.0;
    }
    (sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0)
}

/// Two-sided p-value of a sample correlation `r` over `n` pairs.
///
/// Uses the t-test with `n - 2` degrees of freedom, which reduces to the
/// regularized incomplete beta `I_{1 - r²}(df / 2, 1 / 2)`.
pub fn correlation_p_value(r: f64, n: usize) -> f64 {
    if n < 3 {
        return 1.0;
    }
    let r2 = r * r;
    if r2 >= 1.0 {
        return 0.0;
    }
    let df = (n - 2) as f64;
    regularized_beta(1.0 - r2, df / 2.0, 0.5)
}

const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_572e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of the gamma function for positive `x` (Lanczos, g = 7).
pub fn ln_gamma(x: f64) -> f64 {
    if x < 0.5 {
        let pi = std::f64::consts::PI;
        return (pi / (pi * x).sin()).ln() - ln_gamma(1.0 - x);
    }
    let x = x - 1.0;
    let t = x + 7.5;
    let series = LANCZOS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS[0], |acc, (i, c)| acc + c / (x + i as f64));
    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}

/// Regularized incomplete beta function `I_x(a, b)`.
pub fn regularized_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }
    let ln_front =
        ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln();
    // The continued fraction converges fastest on this side of the mean
    if x < (a + 1.0) / (a + b + 2.0) {
        ln_front.exp() * beta_continued_fraction(x, a, b) / a
    } else {
        1.0 - ln_front.exp() * beta_continued_fraction(1.0 - x, b, a) / b
    }
}

/// Modified Lentz evaluation of the incomplete beta continued fraction.
fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    const MAX_ITER: usize = 300;
    const EPS: f64 = 1e-15;
    const TINY: f64 = 1e-300;

    let guard = |v: f64| if v.abs() < TINY { TINY } else { v };

    let (qab, qap, qam) = (a + b, a + 1.0, a - 1.0);
    let mut c = 1.0;
    let mut d = 1.0 / guard(1.0 - qab * x / qap);
    let mut h = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let m2 = 2.0 * m;

        let even = m * (b - m) * x / ((qam + m2) * (a + m2));
        d = 1.0 / guard(1.0 + even * d);
        c = guard(1.0 + even / c);
        h *= d * c;

        let odd = -(a + m) * (qab + m) * x / ((a + m2) * (qap + m2));
        d = 1.0 / guard(1.0 + odd * d);
        c = guard(1.0 + odd / c);
        let delta = d * c;
        h *= delta;

        if (delta - 1.0).abs() < EPS {
            break;
        }
    }
    h
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::types::{PlayerId, Week};

    fn game(
        id: &str,
        position: Position,
        opponent: &str,
        week: u16,
        pts: Option<f64>,
    ) -> PlayerWeekRecord {
        let mut r = PlayerWeekRecord::blank(
            PlayerId::new(id),
            id,
            "KC",
            position,
            opponent,
            Week::new(week),
        );
        r.pts_ppr = pts;
        r
    }

    fn defense() -> DefenseStrength {
        let mut d = DefenseStrength::new();
        for (i, team) in ["BUF", "MIA", "NYJ", "NE", "DEN", "LV"].iter().enumerate() {
            d.insert(*team, Position::WR, 0.8 + i as f64 * 0.1);
            d.insert(*team, Position::QB, 1.0);
        }
        d
    }

    #[test]
    fn test_ln_gamma_known_values() {
        assert!((ln_gamma(5.0) - 24f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(0.5) - std::f64::consts::PI.sqrt().ln()).abs() < 1e-10);
        assert!((ln_gamma(1.0)).abs() < 1e-10);
    }

    #[test]
    fn test_regularized_beta_edges() {
        assert_eq!(regularized_beta(0.0, 2.0, 3.0), 0.0);
        assert_eq!(regularized_beta(1.0, 2.0, 3.0), 1.0);
        // I_x(1, 1) is the uniform CDF
        assert!((regularized_beta(0.3, 1.0, 1.0) - 0.3).abs() < 1e-10);
        // Symmetric parameters split at one half
        assert!((regularized_beta(0.5, 4.0, 4.0) - 0.5).abs() < 1e-10);
    }

    #[test]
    fn test_correlation_p_value() {
        // r = 0.5 over 10 pairs: t = 1.633 on 8 df
        assert!((correlation_p_value(0.5, 10) - 0.1411).abs() < 1e-3);
        assert!((correlation_p_value(0.0, 10) - 1.0).abs() < 1e-12);
        assert_eq!(correlation_p_value(1.0, 10), 0.0);
        assert_eq!(correlation_p_value(0.9, 2), 1.0);
    }

    #[test]
    fn test_pearson_without_variance_is_zero() {
        assert_eq!(pearson(&[1.0, 1.0, 1.0], &[2.0, 5.0, 9.0]), 0.0);
        assert!((pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]) - 1.0).abs() < 1e-12);
        assert!((pearson(&[1.0, 2.0, 3.0], &[6.0, 4.0, 2.0]) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_exact_ease_relationship_recovered() {
        let opponents = ["BUF", "MIA", "NYJ", "NE", "DEN", "LV"];
        let d = defense();
        let history: Vec<PlayerWeekRecord> = opponents
            .iter()
            .enumerate()
            .map(|(i, opp)| {
                let ease = d.ease_for(opp, Position::WR).unwrap();
                game("W1", Position::WR, opp, i as u16 + 1, Some(3.0 + 10.0 * ease))
            })
            .collect();

        let report = validate_ease(&history, &d, 5).unwrap();
        assert_eq!(report.fits.len(), 1);
        let fit = &report.fits[0];
        assert_eq!(fit.position, Position::WR);
        assert_eq!(fit.n, 6);
        assert!((fit.coefficient - 10.0).abs() < 1e-8);
        assert!((fit.intercept - 3.0).abs() < 1e-8);
        assert!((fit.r_squared - 1.0).abs() < 1e-10);
        assert!((fit.pearson_r - 1.0).abs() < 1e-10);
        assert!(fit.p_value < 1e-6);
    }

    #[test]
    fn test_small_and_unjoined_groups() {
        let d = defense();
        let history = vec![
            game("Q1", Position::QB, "BUF", 1, Some(20.0)),
            game("Q1", Position::QB, "MIA", 2, Some(18.0)),
            game("Q1", Position::QB, "NYJ", 3, Some(25.0)),
            // No defense entry for this opponent
            game("Q1", Position::QB, "KC", 4, Some(30.0)),
            // No points recorded
            game("Q1", Position::QB, "NE", 5, None),
        ];

        let samples = ease_samples(&history, &d);
        assert_eq!(samples[&Position::QB].0.len(), 3);

        let report = validate_ease(&history, &d, 5).unwrap();
        assert!(report.fits.is_empty());
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].position, Position::QB);
        assert_eq!(report.skipped[0].rows, 3);
    }
}
