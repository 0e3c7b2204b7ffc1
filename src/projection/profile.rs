//! Fixed per-position configuration: model features, rate clamps,
//! relevance thresholds and which statline groups a position fills.

use super::types::{Feature, PlayerWeekRecord};
use crate::cli::types::Position;
use serde::Serialize;

/// Season-to-date efficiency rates used to turn baseline volume into
/// expected production.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rate {
    CatchRate,
    YardsPerTarget,
    RecTdRate,
    YardsPerCarry,
    RushTdRate,
    CompletionPct,
    YardsPerAttempt,
    PassTdRate,
    InterceptionRate,
}

impl Rate {
    pub fn numerator(&self, record: &PlayerWeekRecord) -> f64 {
        match self {
            Rate::CatchRate => record.rec,
            Rate::YardsPerTarget => record.rec_yd,
            Rate::RecTdRate => record.rec_td,
            Rate::YardsPerCarry => record.rush_yd,
            Rate::RushTdRate => record.rush_td,
            Rate::CompletionPct => record.pass_cmp,
            Rate::YardsPerAttempt => record.pass_yd,
            Rate::PassTdRate => record.pass_td,
            Rate::InterceptionRate => record.pass_int,
        }
    }

    pub fn denominator(&self, record: &PlayerWeekRecord) -> f64 {
        match self {
            Rate::CatchRate | Rate::YardsPerTarget | Rate::RecTdRate => record.rec_tgt,
            Rate::YardsPerCarry | Rate::RushTdRate => record.rush_att,
            Rate::CompletionPct
            | Rate::YardsPerAttempt
            | Rate::PassTdRate
            | Rate::InterceptionRate => record.pass_att,
        }
    }
}

/// A rate together with the range it is clamped into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RateBounds {
    pub rate: Rate,
    pub min: f64,
    pub max: f64,
}

impl RateBounds {
    const fn new(rate: Rate, min: f64, max: f64) -> Self {
        Self { rate, min, max }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    /// Used when a position has no volume at all to average over.
    pub fn midpoint(&self) -> f64 {
        (self.min + self.max) / 2.0
    }
}

const CATCH_RATE: RateBounds = RateBounds::new(Rate::CatchRate, 0.3, 0.9);
const YARDS_PER_TARGET: RateBounds = RateBounds::new(Rate::YardsPerTarget, 4.0, 14.0);
const REC_TD_RATE: RateBounds = RateBounds::new(Rate::RecTdRate, 0.0, 0.20);
const YARDS_PER_CARRY: RateBounds = RateBounds::new(Rate::YardsPerCarry, 2.0, 7.0);
const RUSH_TD_RATE: RateBounds = RateBounds::new(Rate::RushTdRate, 0.0, 0.15);
const COMPLETION_PCT: RateBounds = RateBounds::new(Rate::CompletionPct, 0.45, 0.80);
const YARDS_PER_ATTEMPT: RateBounds = RateBounds::new(Rate::YardsPerAttempt, 4.5, 10.0);
const PASS_TD_RATE: RateBounds = RateBounds::new(Rate::PassTdRate, 0.0, 0.12);
const INTERCEPTION_RATE: RateBounds = RateBounds::new(Rate::InterceptionRate, 0.0, 0.06);

/// Minimum season-to-date volume for a player to count as fantasy-relevant.
///
/// A player is dropped only when *both* averages fall below their floors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceThreshold {
    pub min_avg_targets: f64,
    pub min_avg_yards: f64,
}

impl RelevanceThreshold {
    pub fn is_relevant(&self, avg_targets: f64, avg_yards: f64) -> bool {
        !(avg_targets < self.min_avg_targets && avg_yards < self.min_avg_yards)
    }
}

/// Everything the pipeline needs to know about one position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionProfile {
    pub position: Position,
    /// Ordered model inputs; coefficients line up with this order.
    pub features: &'static [Feature],
    pub rates: &'static [RateBounds],
    pub relevance: Option<RelevanceThreshold>,
    pub passing: bool,
    pub rushing: bool,
    pub receiving: bool,
}

const QB_PROFILE: PositionProfile = PositionProfile {
    position: Position::QB,
    features: &[
        Feature::PassAtt,
        Feature::Ypa,
        Feature::CmpPct,
        Feature::RushAtt,
        Feature::RushYd,
        Feature::EaseFactor,
    ],
    rates: &[
        COMPLETION_PCT,
        YARDS_PER_ATTEMPT,
        PASS_TD_RATE,
        INTERCEPTION_RATE,
        YARDS_PER_CARRY,
        RUSH_TD_RATE,
    ],
    relevance: None,
    passing: true,
    rushing: true,
    receiving: false,
};

const RB_PROFILE: PositionProfile = PositionProfile {
    position: Position::RB,
    features: &[
        Feature::RushAtt,
        Feature::RushYd,
        Feature::CarryShare,
        Feature::RecTgt,
        Feature::TargetShare,
        Feature::RecYd,
        Feature::OffSnp,
        Feature::EaseFactor,
    ],
    rates: &[
        YARDS_PER_CARRY,
        RUSH_TD_RATE,
        CATCH_RATE,
        YARDS_PER_TARGET,
        REC_TD_RATE,
    ],
    relevance: None,
    passing: false,
    rushing: true,
    receiving: true,
};

const WR_PROFILE: PositionProfile = PositionProfile {
    position: Position::WR,
    features: &[
        Feature::RecTgt,
        Feature::Rec,
        Feature::RecYd,
        Feature::RecTd,
        Feature::OffSnp,
        Feature::EaseFactor,
    ],
    rates: &[CATCH_RATE, YARDS_PER_TARGET, REC_TD_RATE],
    relevance: Some(RelevanceThreshold {
        min_avg_targets: 2.0,
        min_avg_yards: 20.0,
    }),
    passing: false,
    rushing: false,
    receiving: true,
};

const TE_PROFILE: PositionProfile = PositionProfile {
    position: Position::TE,
    features: &[
        Feature::RecTgt,
        Feature::Rec,
        Feature::RecYd,
        Feature::TargetShare,
        Feature::OffSnp,
        Feature::EaseFactor,
    ],
    rates: &[CATCH_RATE, YARDS_PER_TARGET, REC_TD_RATE],
    relevance: None,
    passing: false,
    rushing: false,
    receiving: true,
};

impl PositionProfile {
    pub fn for_position(position: Position) -> &'static PositionProfile {
        match position {
            Position::QB => &QB_PROFILE,
            Position::RB => &RB_PROFILE,
            Position::WR => &WR_PROFILE,
            Position::TE => &TE_PROFILE,
        }
    }

    pub fn bounds(&self, rate: Rate) -> Option<&RateBounds> {
        self.rates.iter().find(|b| b.rate == rate)
    }
}
