//! Boom/bust odds from an idealized normal fitted to the simulated interval.
//!
//! This is a second, independent simulation: the tails are re-drawn from a
//! Gaussian instead of counted in the empirical residual draws.

use rand::Rng;
use rand_distr::StandardNormal;
use serde::Serialize;
use tracing::debug;

use super::simulate::Interval;

/// z-distance between the 10th and 90th percentiles of a normal (±1.28σ).
pub const P10_P90_Z_SPAN: f64 = 2.56;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoomBust {
    pub boom_pct: f64,
    pub bust_pct: f64,
}

/// Standard deviation implied by the interval, with a floor of 1.0 when
/// the spread is degenerate.
pub fn implied_std(interval: &Interval) -> f64 {
    let spread = interval.p90 - interval.p10;
    if spread > 0.0 && spread.is_finite() {
        spread / P10_P90_Z_SPAN
    } else {
        debug!(spread, "Degenerate spread, using unit standard deviation");
        1.0
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Percent of `draws` normal samples above p90 (boom) and below p10 (bust).
pub fn estimate<R: Rng + ?Sized>(interval: &Interval, draws: usize, rng: &mut R) -> BoomBust {
    if draws == 0 {
        return BoomBust {
            boom_pct: 0.0,
            bust_pct: 0.0,
        };
    }

    let std = implied_std(interval);
    let mut boom = 0usize;
    let mut bust = 0usize;
    for _ in 0..draws {
        let z: f64 = rng.sample(StandardNormal);
        let x = interval.median + std * z;
        if x > interval.p90 {
            boom += 1;
        }
        if x < interval.p10 {
            bust += 1;
        }
    }

    let n = draws as f64;
    BoomBust {
        boom_pct: round1(boom as f64 / n * 100.0),
        bust_pct: round1(bust as f64 / n * 100.0),
    }
}
