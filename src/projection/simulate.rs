//! Residual-resampling Monte Carlo simulation.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::StandardNormal;
use serde::Serialize;

pub const DEFAULT_SIMULATIONS: usize = 5000;
pub const DEFAULT_FALLBACK_STD: f64 = 4.0;

/// A reproducible per-player random stream.
///
/// Every player gets its own ChaCha stream under the run seed, so results
/// do not depend on the order players are processed in.
pub fn player_rng(seed: u64, stream: u64) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(stream);
    rng
}

/// The published projection interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub p10: f64,
    pub median: f64,
    pub p90: f64,
}

/// Percentile of already-sorted values using linear interpolation between
/// the closest ranks. `pct` is in `[0, 100]`.
pub fn percentile(sorted: &[f64], pct: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (pct / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            let frac = rank - lo as f64;
            sorted[lo] + (sorted[hi] - sorted[lo]) * frac
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simulator {
    pub draws: usize,
    pub fallback_std: f64,
}

impl Default for Simulator {
    fn default() -> Self {
        Self {
            draws: DEFAULT_SIMULATIONS,
            fallback_std: DEFAULT_FALLBACK_STD,
        }
    }
}

impl Simulator {
    pub fn new(draws: usize, fallback_std: f64) -> Self {
        Self {
            draws,
            fallback_std,
        }
    }

    /// Draw `mu + residual` with residuals resampled uniformly with
    /// replacement, or `Normal(mu, fallback_std)` when the pool is empty.
    pub fn draw<R: Rng + ?Sized>(&self, mu: f64, pool: &[f64], rng: &mut R) -> Vec<f64> {
        if pool.is_empty() {
            (0..self.draws)
                .map(|_| mu + self.fallback_std * rng.sample::<f64, _>(StandardNormal))
                .collect()
        } else {
            (0..self.draws)
                .map(|_| mu + pool[rng.gen_range(0..pool.len())])
                .collect()
        }
    }

    pub fn simulate<R: Rng + ?Sized>(&self, mu: f64, pool: &[f64], rng: &mut R) -> Interval {
        let mut draws = self.draw(mu, pool, rng);
        draws.sort_by(|a, b| a.total_cmp(b));
        Interval {
            p10: percentile(&draws, 10.0),
            median: percentile(&draws, 50.0),
            p90: percentile(&draws, 90.0),
        }
    }
}
