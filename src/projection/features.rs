//! Feature engineering for training rows and forward-week inputs.
//!
//! Records are treated as an arena: aggregates are built once over the
//! whole slice and every row's features are then computed by index.

use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

use super::profile::{PositionProfile, Rate, RateBounds};
use super::types::{
    BaselineUsage, DefenseStrength, Feature, FeatureVector, ForwardRow, PlayerWeekRecord, Stat,
    StatLine, TrainingRow,
};
use crate::cli::types::{PlayerId, Position, Week};
use crate::error::{ProjError, Result};


/// Division that resolves to 0 instead of NaN or infinity.
pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    let value = numerator / denominator;
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// `safe_div` over stats that may be missing; a missing input leaves the ratio unset.
fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    Some(safe_div(numerator?, denominator?))
}

/// Team volume for one week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TeamTotals {
    pub team_pass_att: f64,
    pub team_rush_att: f64,
    pub team_rec_tgt: f64,
}

pub type TeamWeekTotals = HashMap<(String, Week), TeamTotals>;

/// Sum attempts and targets per (team, week).
pub fn team_aggregates(records: &[PlayerWeekRecord]) -> TeamWeekTotals {
    let mut totals: TeamWeekTotals = HashMap::new();
    for record in records {
        let entry = totals
            .entry((record.team.clone(), record.week))
            .or_default();
        entry.team_pass_att += record.pass_att;
        entry.team_rush_att += record.rush_att;
        entry.team_rec_tgt += record.rec_tgt;
    }
    totals
}

/// Cumulative counting stats for one player across the weeks they played.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeasonToDate {
    weeks: BTreeSet<Week>,
    sums: BTreeMap<Rate, (f64, f64)>,
    rec_tgt: f64,
    rec_yd: f64,
}

impl SeasonToDate {
    fn add(&mut self, record: &PlayerWeekRecord, rates: &[Rate]) {
        self.weeks.insert(record.week);
        self.rec_tgt += record.rec_tgt;
        self.rec_yd += record.rec_yd;
        for rate in rates {
            let entry = self.sums.entry(*rate).or_insert((0.0, 0.0));
            entry.0 += rate.numerator(record);
            entry.1 += rate.denominator(record);
        }
    }

    /// Count of distinct weeks with a record.
    pub fn games(&self) -> usize {
        self.weeks.len()
    }

    pub fn avg_targets(&self) -> f64 {
        safe_div(self.rec_tgt, self.games() as f64)
    }

    pub fn avg_rec_yards(&self) -> f64 {
        safe_div(self.rec_yd, self.games() as f64)
    }

    /// `(numerator, denominator)` totals for a rate.
    pub fn totals(&self, rate: Rate) -> (f64, f64) {
        self.sums.get(&rate).copied().unwrap_or((0.0, 0.0))
    }
}

const ALL_RATES: [Rate; 9] = [
    Rate::CatchRate,
    Rate::YardsPerTarget,
    Rate::RecTdRate,
    Rate::YardsPerCarry,
    Rate::RushTdRate,
    Rate::CompletionPct,
    Rate::YardsPerAttempt,
    Rate::PassTdRate,
    Rate::InterceptionRate,
];

/// Season-to-date aggregates for every player, plus position-wide totals.
#[derive(Debug, Clone, Default)]
pub struct SeasonAggregates {
    players: HashMap<PlayerId, SeasonToDate>,
    positions: HashMap<Position, SeasonToDate>,
}

impl SeasonAggregates {
    pub fn from_records(records: &[PlayerWeekRecord]) -> Self {
        let mut aggregates = Self::default();
        for record in records {
            aggregates
                .players
                .entry(record.player_id.clone())
                .or_default()
                .add(record, &ALL_RATES);
            aggregates
                .positions
                .entry(record.position)
                .or_default()
                .add(record, &ALL_RATES);
        }
        aggregates
    }

    pub fn player(&self, player_id: &PlayerId) -> Option<&SeasonToDate> {
        self.players.get(player_id)
    }

    /// Position-wide average rate, clamped.
    pub fn position_rate(&self, position: Position, bounds: &RateBounds) -> f64 {
        match self.positions.get(&position) {
            Some(totals) => {
                let (num, den) = totals.totals(bounds.rate);
                if den > 0.0 {
                    bounds.clamp(num / den)
                } else {
                    bounds.midpoint()
                }
            }
            None => bounds.midpoint(),
        }
    }

    /// A player's clamped rate, or the position-wide rate when their
    /// denominator volume is below `min_volume`.
    pub fn player_rate(
        &self,
        player_id: &PlayerId,
        position: Position,
        bounds: &RateBounds,
        min_volume: f64,
    ) -> f64 {
        let personal = self.player(player_id).and_then(|season| {
            let (num, den) = season.totals(bounds.rate);
            if den >= min_volume && den > 0.0 {
                Some(num / den)
            } else {
                None
            }
        });

        match personal {
            Some(value) if value.is_finite() => bounds.clamp(value),
            _ => {
                debug!(
                    player = %player_id,
                    rate = ?bounds.rate,
                    "Using position-wide rate for player with insufficient history"
                );
                self.position_rate(position, bounds)
            }
        }
    }
}

fn resolve_ease(
    own: Option<f64>,
    defense: &DefenseStrength,
    opponent: &str,
    position: Position,
) -> Option<f64> {
    own.or_else(|| defense.ease_for(opponent, position))
}

/// Compute the full feature set for every historical record.
///
/// Row `i` of the output corresponds to `records[i]`.
pub fn build_training_rows(
    records: &[PlayerWeekRecord],
    defense: &DefenseStrength,
) -> Vec<TrainingRow> {
    let team_totals = team_aggregates(records);
    let season = SeasonAggregates::from_records(records);

    (0..records.len())
        .into_par_iter()
        .map(|idx| {
            let record = &records[idx];
            let totals = team_totals
                .get(&(record.team.clone(), record.week))
                .copied()
                .unwrap_or_default();

            let stat = |s: Stat| record.stat(s);

            let mut features = FeatureVector::new();
            features.set_opt(Feature::PassAtt, stat(Stat::PassAtt));
            features.set_opt(Feature::Ypa, ratio(stat(Stat::PassYd), stat(Stat::PassAtt)));
            features.set_opt(
                Feature::CmpPct,
                ratio(stat(Stat::PassCmp), stat(Stat::PassAtt)),
            );
            features.set_opt(Feature::RushAtt, stat(Stat::RushAtt));
            features.set_opt(Feature::RushYd, stat(Stat::RushYd));
            features.set_opt(
                Feature::CarryShare,
                ratio(stat(Stat::RushAtt), Some(totals.team_rush_att)),
            );
            features.set_opt(Feature::RecTgt, stat(Stat::RecTgt));
            features.set_opt(Feature::Rec, stat(Stat::Rec));
            features.set_opt(Feature::RecYd, stat(Stat::RecYd));
            features.set_opt(Feature::RecTd, stat(Stat::RecTd));
            features.set_opt(
                Feature::TargetShare,
                ratio(stat(Stat::RecTgt), Some(totals.team_rec_tgt)),
            );
            features.set_opt(Feature::OffSnp, stat(Stat::OffSnp));
            features.set_opt(
                Feature::EaseFactor,
                resolve_ease(
                    record.ease_factor,
                    defense,
                    &record.opponent,
                    record.position,
                ),
            );

            if let Some(stats) = season.player(&record.player_id) {
                features.set(Feature::AvgTgt, stats.avg_targets());
                features.set(Feature::AvgRecYd, stats.avg_rec_yards());
            }

            TrainingRow {
                player_id: record.player_id.clone(),
                position: record.position,
                week: record.week,
                pts_ppr: record.pts_ppr,
                features,
            }
        })
        .collect()
}

/// Why a forward-week player was left out of projections.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Exclusion {
    pub player_id: PlayerId,
    pub player_name: String,
    pub position: Position,
    pub avg_targets: f64,
    pub avg_rec_yards: f64,
}

/// Forward rows ready for prediction plus the players dropped as irrelevant.
#[derive(Debug, Clone, Default)]
pub struct ForwardFeatures {
    pub rows: Vec<ForwardRow>,
    pub excluded: Vec<Exclusion>,
}

/// Build forward-week feature vectors from baseline usage and
/// season-to-date rates.
///
/// `history` should only contain weeks before the target week. A baseline
/// row whose ease factor cannot be resolved from either the row itself or
/// the defense table fails the whole build, as does a NULL volume the
/// player's position is modeled on.
pub fn build_forward_rows(
    baselines: &[BaselineUsage],
    history: &[PlayerWeekRecord],
    defense: &DefenseStrength,
    min_rate_volume: f64,
) -> Result<ForwardFeatures> {
    let season = SeasonAggregates::from_records(history);

    let mut team_targets: HashMap<&str, f64> = HashMap::new();
    let mut team_rushes: HashMap<&str, f64> = HashMap::new();
    for baseline in baselines {
        *team_targets.entry(baseline.team.as_str()).or_default() +=
            baseline.rec_tgt.unwrap_or_default();
        *team_rushes.entry(baseline.team.as_str()).or_default() +=
            baseline.rush_att.unwrap_or_default();
    }

    let mut output = ForwardFeatures::default();

    for baseline in baselines {
        let profile = PositionProfile::for_position(baseline.position);
        let player_season = season.player(&baseline.player_id);

        if let (Some(threshold), Some(stats)) = (profile.relevance, player_season) {
            let avg_targets = stats.avg_targets();
            let avg_rec_yards = stats.avg_rec_yards();
            if !threshold.is_relevant(avg_targets, avg_rec_yards) {
                output.excluded.push(Exclusion {
                    player_id: baseline.player_id.clone(),
                    player_name: baseline.player_name.clone(),
                    position: baseline.position,
                    avg_targets,
                    avg_rec_yards,
                });
                continue;
            }
        }

        let missing = |feature: Feature| ProjError::MissingFeature {
            position: baseline.position,
            player_id: baseline.player_id.clone(),
            feature: feature.to_string(),
        };

        let ease = resolve_ease(
            baseline.ease_factor,
            defense,
            &baseline.opponent,
            baseline.position,
        )
        .ok_or_else(|| missing(Feature::EaseFactor))?;
        let off_snp = baseline.off_snp.ok_or_else(|| missing(Feature::OffSnp))?;

        let rate = |r: Rate| -> f64 {
            profile
                .bounds(r)
                .map(|bounds| {
                    season.player_rate(
                        &baseline.player_id,
                        baseline.position,
                        bounds,
                        min_rate_volume,
                    )
                })
                .unwrap_or_default()
        };

        let mut features = FeatureVector::new();
        let mut statline = StatLine::default();

        features.set(Feature::OffSnp, off_snp);
        features.set(Feature::EaseFactor, ease);
        if let Some(stats) = player_season {
            features.set(Feature::AvgTgt, stats.avg_targets());
            features.set(Feature::AvgRecYd, stats.avg_rec_yards());
        }

        if profile.passing {
            let pass_att = baseline.pass_att.ok_or_else(|| missing(Feature::PassAtt))?;
            let cmp_pct = rate(Rate::CompletionPct);
            let ypa = rate(Rate::YardsPerAttempt);
            features.set(Feature::PassAtt, pass_att);
            features.set(Feature::CmpPct, cmp_pct);
            features.set(Feature::Ypa, ypa);
            statline.proj_pass_att = Some(pass_att);
            statline.proj_pass_cmp = Some(pass_att * cmp_pct);
            statline.proj_pass_yd = Some(pass_att * ypa);
            statline.proj_pass_td = Some(pass_att * rate(Rate::PassTdRate));
            statline.proj_pass_int = Some(pass_att * rate(Rate::InterceptionRate));
        }

        if profile.rushing {
            let rush_att = baseline.rush_att.ok_or_else(|| missing(Feature::RushAtt))?;
            let rush_yd = rush_att * rate(Rate::YardsPerCarry);
            features.set(Feature::RushAtt, rush_att);
            features.set(Feature::RushYd, rush_yd);
            features.set(
                Feature::CarryShare,
                safe_div(
                    rush_att,
                    team_rushes
                        .get(baseline.team.as_str())
                        .copied()
                        .unwrap_or_default(),
                ),
            );
            statline.proj_rush_att = Some(rush_att);
            statline.proj_rush_yd = Some(rush_yd);
            statline.proj_rush_td = Some(rush_att * rate(Rate::RushTdRate));
        }

        if profile.receiving {
            let rec_tgt = baseline.rec_tgt.ok_or_else(|| missing(Feature::RecTgt))?;
            let rec = rec_tgt * rate(Rate::CatchRate);
            let rec_yd = rec_tgt * rate(Rate::YardsPerTarget);
            let rec_td = rec_tgt * rate(Rate::RecTdRate);
            features.set(Feature::RecTgt, rec_tgt);
            features.set(Feature::Rec, rec);
            features.set(Feature::RecYd, rec_yd);
            features.set(Feature::RecTd, rec_td);
            features.set(
                Feature::TargetShare,
                safe_div(
                    rec_tgt,
                    team_targets
                        .get(baseline.team.as_str())
                        .copied()
                        .unwrap_or_default(),
                ),
            );
            statline.proj_rec_tgt = Some(rec_tgt);
            statline.proj_rec = Some(rec);
            statline.proj_rec_yd = Some(rec_yd);
            statline.proj_rec_td = Some(rec_td);
        }

        output.rows.push(ForwardRow {
            player_id: baseline.player_id.clone(),
            player_name: baseline.player_name.clone(),
            team: baseline.team.clone(),
            position: baseline.position,
            opponent: baseline.opponent.clone(),
            week: baseline.week,
            features,
            statline,
        });
    }

    if !output.excluded.is_empty() {
        warn!(
            count = output.excluded.len(),
            "Excluded low-volume receivers from projections"
        );
    }

    Ok(output)
}
