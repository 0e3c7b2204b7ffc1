//! Records flowing through the projection pipeline.

use crate::cli::types::{PlayerId, Position, Week};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Raw counting-stat columns of a player-week, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stat {
    PassAtt,
    PassCmp,
    PassYd,
    PassTd,
    PassInt,
    RushAtt,
    RushYd,
    RushTd,
    RecTgt,
    Rec,
    RecYd,
    RecTd,
    OffSnp,
}

impl Stat {
    pub const ALL: [Stat; 13] = [
        Stat::PassAtt,
        Stat::PassCmp,
        Stat::PassYd,
        Stat::PassTd,
        Stat::PassInt,
        Stat::RushAtt,
        Stat::RushYd,
        Stat::RushTd,
        Stat::RecTgt,
        Stat::Rec,
        Stat::RecYd,
        Stat::RecTd,
        Stat::OffSnp,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Stat::PassAtt => "pass_att",
            Stat::PassCmp => "pass_cmp",
            Stat::PassYd => "pass_yd",
            Stat::PassTd => "pass_td",
            Stat::PassInt => "pass_int",
            Stat::RushAtt => "rush_att",
            Stat::RushYd => "rush_yd",
            Stat::RushTd => "rush_td",
            Stat::RecTgt => "rec_tgt",
            Stat::Rec => "rec",
            Stat::RecYd => "rec_yd",
            Stat::RecTd => "rec_td",
            Stat::OffSnp => "off_snp",
        }
    }
}

/// One player's stat line for one week, as recorded upstream.
///
/// A stat listed in `missing` was not recorded. Its field holds 0 so sums
/// skip it, but any feature derived from it stays unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerWeekRecord {
    pub player_id: PlayerId,
    pub player_name: String,
    pub team: String,
    pub position: Position,
    pub opponent: String,
    pub week: Week,
    pub pass_att: f64,
    pub pass_cmp: f64,
    pub pass_yd: f64,
    pub pass_td: f64,
    pub pass_int: f64,
    pub rush_att: f64,
    pub rush_yd: f64,
    pub rush_td: f64,
    pub rec_tgt: f64,
    pub rec: f64,
    pub rec_yd: f64,
    pub rec_td: f64,
    pub off_snp: f64,
    /// Realized PPR total; rows without it cannot be trained on.
    pub pts_ppr: Option<f64>,
    pub ease_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub missing: BTreeSet<Stat>,
}

impl PlayerWeekRecord {
    /// A record with every counting stat at zero.
    pub fn blank(
        player_id: PlayerId,
        player_name: impl Into<String>,
        team: impl Into<String>,
        position: Position,
        opponent: impl Into<String>,
        week: Week,
    ) -> Self {
        Self {
            player_id,
            player_name: player_name.into(),
            team: team.into(),
            position,
            opponent: opponent.into(),
            week,
            pass_att: 0.0,
            pass_cmp: 0.0,
            pass_yd: 0.0,
            pass_td: 0.0,
            pass_int: 0.0,
            rush_att: 0.0,
            rush_yd: 0.0,
            rush_td: 0.0,
            rec_tgt: 0.0,
            rec: 0.0,
            rec_yd: 0.0,
            rec_td: 0.0,
            off_snp: 0.0,
            pts_ppr: None,
            ease_factor: None,
            missing: BTreeSet::new(),
        }
    }

    fn slot(&self, stat: Stat) -> &f64 {
        match stat {
            Stat::PassAtt => &self.pass_att,
            Stat::PassCmp => &self.pass_cmp,
            Stat::PassYd => &self.pass_yd,
            Stat::PassTd => &self.pass_td,
            Stat::PassInt => &self.pass_int,
            Stat::RushAtt => &self.rush_att,
            Stat::RushYd => &self.rush_yd,
            Stat::RushTd => &self.rush_td,
            Stat::RecTgt => &self.rec_tgt,
            Stat::Rec => &self.rec,
            Stat::RecYd => &self.rec_yd,
            Stat::RecTd => &self.rec_td,
            Stat::OffSnp => &self.off_snp,
        }
    }

    fn slot_mut(&mut self, stat: Stat) -> &mut f64 {
        match stat {
            Stat::PassAtt => &mut self.pass_att,
            Stat::PassCmp => &mut self.pass_cmp,
            Stat::PassYd => &mut self.pass_yd,
            Stat::PassTd => &mut self.pass_td,
            Stat::PassInt => &mut self.pass_int,
            Stat::RushAtt => &mut self.rush_att,
            Stat::RushYd => &mut self.rush_yd,
            Stat::RushTd => &mut self.rush_td,
            Stat::RecTgt => &mut self.rec_tgt,
            Stat::Rec => &mut self.rec,
            Stat::RecYd => &mut self.rec_yd,
            Stat::RecTd => &mut self.rec_td,
            Stat::OffSnp => &mut self.off_snp,
        }
    }

    /// The recorded value, or `None` when the stat was not recorded.
    pub fn stat(&self, stat: Stat) -> Option<f64> {
        if self.missing.contains(&stat) {
            None
        } else {
            Some(*self.slot(stat))
        }
    }

    /// Store a stat as read from storage; `None` marks it missing.
    pub fn set_stat(&mut self, stat: Stat, value: Option<f64>) {
        match value {
            Some(v) => {
                *self.slot_mut(stat) = v;
                self.missing.remove(&stat);
            }
            None => {
                *self.slot_mut(stat) = 0.0;
                self.missing.insert(stat);
            }
        }
    }
}

/// Baseline usage supplied for the forward week.
///
/// Volumes are `None` when the collaborator left them NULL; the ones a
/// position is modeled on must be present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineUsage {
    pub player_id: PlayerId,
    pub player_name: String,
    pub team: String,
    pub position: Position,
    pub opponent: String,
    pub week: Week,
    pub rec_tgt: Option<f64>,
    pub rush_att: Option<f64>,
    pub pass_att: Option<f64>,
    pub off_snp: Option<f64>,
    pub ease_factor: Option<f64>,
}

/// Opponent-defense ease values keyed by (defense team, position).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DefenseStrength {
    entries: BTreeMap<(String, Position), f64>,
}

impl DefenseStrength {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, defense_team: impl Into<String>, position: Position, ease: f64) {
        self.entries.insert((defense_team.into(), position), ease);
    }

    pub fn ease_for(&self, defense_team: &str, position: Position) -> Option<f64> {
        self.entries
            .get(&(defense_team.to_string(), position))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Named model inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    PassAtt,
    Ypa,
    CmpPct,
    RushAtt,
    RushYd,
    CarryShare,
    RecTgt,
    Rec,
    RecYd,
    RecTd,
    TargetShare,
    OffSnp,
    EaseFactor,
    AvgTgt,
    AvgRecYd,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::PassAtt => "pass_att",
            Feature::Ypa => "ypa",
            Feature::CmpPct => "cmp_pct",
            Feature::RushAtt => "rush_att",
            Feature::RushYd => "rush_yd",
            Feature::CarryShare => "carry_share",
            Feature::RecTgt => "rec_tgt",
            Feature::Rec => "rec",
            Feature::RecYd => "rec_yd",
            Feature::RecTd => "rec_td",
            Feature::TargetShare => "target_share",
            Feature::OffSnp => "off_snp",
            Feature::EaseFactor => "ease_factor",
            Feature::AvgTgt => "avg_tgt",
            Feature::AvgRecYd => "avg_rec_yd",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Feature values for one player-week (training) or one forward week (inference).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: BTreeMap<Feature, f64>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        self.values.insert(feature, value);
    }

    /// Set only when the input exists; absence stays visible to the model.
    pub fn set_opt(&mut self, feature: Feature, value: Option<f64>) {
        if let Some(v) = value {
            self.values.insert(feature, v);
        }
    }

    pub fn get(&self, feature: Feature) -> Option<f64> {
        self.values.get(&feature).copied()
    }

    /// Values in the given order, or the first feature that is absent.
    pub fn ordered(&self, features: &[Feature]) -> std::result::Result<Vec<f64>, Feature> {
        features
            .iter()
            .map(|f| self.get(*f).ok_or(*f))
            .collect()
    }
}

/// Training row: identity, target and features for one historical player-week.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingRow {
    pub player_id: PlayerId,
    pub position: Position,
    pub week: Week,
    pub pts_ppr: Option<f64>,
    pub features: FeatureVector,
}

/// Forward-week inputs for one player, ready for prediction.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardRow {
    pub player_id: PlayerId,
    pub player_name: String,
    pub team: String,
    pub position: Position,
    pub opponent: String,
    pub week: Week,
    pub features: FeatureVector,
    pub statline: StatLine,
}

/// Projected counting stats, named the same for every position.
///
/// Columns that do not apply to a position stay `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatLine {
    pub proj_pass_att: Option<f64>,
    pub proj_pass_cmp: Option<f64>,
    pub proj_pass_yd: Option<f64>,
    pub proj_pass_td: Option<f64>,
    pub proj_pass_int: Option<f64>,
    pub proj_rush_att: Option<f64>,
    pub proj_rush_yd: Option<f64>,
    pub proj_rush_td: Option<f64>,
    pub proj_rec_tgt: Option<f64>,
    pub proj_rec: Option<f64>,
    pub proj_rec_yd: Option<f64>,
    pub proj_rec_td: Option<f64>,
}

/// One player's forward-week projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionRow {
    pub player_id: PlayerId,
    pub player_name: String,
    pub team: String,
    pub position: Position,
    pub opponent: String,
    pub week: Week,
    /// Stable ordinal rank by descending `mu`.
    pub rank: u32,
    pub mu: f64,
    pub median: f64,
    pub p10: f64,
    pub p90: f64,
    #[serde(flatten)]
    pub statline: StatLine,
}
