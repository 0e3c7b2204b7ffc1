//! Shared fixtures for integration tests

#![allow(dead_code)]

use ffl_proj::projection::types::{BaselineUsage, DefenseStrength, PlayerWeekRecord};
use ffl_proj::storage::ProjectionDatabase;
use ffl_proj::{PlayerId, Position, Week};

pub fn opponent_of(team: &str) -> &'static str {
    match team {
        "KC" => "DEN",
        "BUF" => "MIA",
        "PHI" => "DAL",
        _ => "NYJ",
    }
}

/// Weekly history for one player. `scale` shifts usage so players differ.
pub fn player_history(
    id: &str,
    name: &str,
    position: Position,
    team: &str,
    weeks: std::ops::RangeInclusive<u16>,
    scale: f64,
) -> Vec<PlayerWeekRecord> {
    weeks
        .map(|week| {
            let w = week as f64;
            let mut r = PlayerWeekRecord::blank(
                PlayerId::new(id),
                name,
                team,
                position,
                opponent_of(team),
                Week::new(week),
            );
            r.off_snp = 35.0 + scale * 3.0 + (w % 4.0) * 2.0;
            match position {
                Position::QB => {
                    r.pass_att = 28.0 + scale + (w % 5.0);
                    r.pass_cmp = (r.pass_att * (0.6 + (w % 3.0) * 0.03)).round();
                    r.pass_yd = r.pass_att * (6.8 + (w % 4.0) * 0.2);
                    r.pass_td = 1.0 + (w % 3.0);
                    r.pass_int = w % 2.0;
                    r.rush_att = 2.0 + (w % 4.0);
                    r.rush_yd = r.rush_att * 4.5;
                    r.rush_td = if week % 5 == 0 { 1.0 } else { 0.0 };
                }
                Position::RB => {
                    r.rush_att = 10.0 + scale * 2.0 + (w % 6.0);
                    r.rush_yd = r.rush_att * (3.8 + (w % 3.0) * 0.4);
                    r.rush_td = w % 2.0;
                    r.rec_tgt = 2.0 + (w % 3.0);
                    r.rec = r.rec_tgt - 1.0;
                    r.rec_yd = r.rec * 7.5;
                }
                Position::WR | Position::TE => {
                    r.rec_tgt = 4.0 + scale + (w % 5.0);
                    r.rec = (r.rec_tgt * 0.65).round();
                    r.rec_yd = r.rec_tgt * (7.5 + (w % 3.0));
                    r.rec_td = if week % 4 == 0 { 1.0 } else { 0.0 };
                }
            }
            r.pts_ppr = Some(
                0.04 * r.pass_yd + 4.0 * r.pass_td - 2.0 * r.pass_int
                    + 0.1 * (r.rush_yd + r.rec_yd)
                    + 6.0 * (r.rush_td + r.rec_td)
                    + r.rec
                    + (w % 3.0) * 0.8
                    - 0.5 * scale,
            );
            r.ease_factor = Some(0.9 + (w % 5.0) * 0.05);
            r
        })
        .collect()
}

pub fn baseline(
    id: &str,
    name: &str,
    position: Position,
    team: &str,
    week: u16,
    ease: Option<f64>,
) -> BaselineUsage {
    BaselineUsage {
        player_id: PlayerId::new(id),
        player_name: name.to_string(),
        team: team.to_string(),
        position,
        opponent: opponent_of(team).to_string(),
        week: Week::new(week),
        rec_tgt: Some(match position {
            Position::QB => 0.0,
            Position::RB => 3.0,
            _ => 7.0,
        }),
        rush_att: Some(match position {
            Position::QB => 4.0,
            Position::RB => 15.0,
            _ => 0.0,
        }),
        pass_att: Some(if position == Position::QB { 33.0 } else { 0.0 }),
        off_snp: Some(52.0),
        ease_factor: ease,
    }
}

/// Two players at each position, weeks 1-10.
pub fn league() -> Vec<(&'static str, &'static str, Position, &'static str)> {
    vec![
        ("QB1", "Jalen Hurts", Position::QB, "PHI"),
        ("QB2", "Josh Allen", Position::QB, "BUF"),
        ("RB1", "Saquon Barkley", Position::RB, "PHI"),
        ("RB2", "James Cook", Position::RB, "BUF"),
        ("WR1", "A.J. Brown", Position::WR, "PHI"),
        ("WR2", "Khalil Shakir", Position::WR, "BUF"),
        ("TE1", "Dallas Goedert", Position::TE, "PHI"),
        ("TE2", "Dalton Kincaid", Position::TE, "BUF"),
    ]
}

pub fn league_history() -> Vec<PlayerWeekRecord> {
    league()
        .into_iter()
        .enumerate()
        .flat_map(|(i, (id, name, position, team))| {
            player_history(id, name, position, team, 1..=10, i as f64 % 2.0)
        })
        .collect()
}

pub fn league_baselines(week: u16) -> Vec<BaselineUsage> {
    league()
        .into_iter()
        .map(|(id, name, position, team)| baseline(id, name, position, team, week, Some(1.05)))
        .collect()
}

pub fn league_db() -> ProjectionDatabase {
    let mut db = ProjectionDatabase::new_in_memory().unwrap();
    for record in league_history() {
        db.upsert_player_week(&record).unwrap();
    }
    for baseline in league_baselines(11) {
        db.upsert_week_input(&baseline).unwrap();
    }
    db
}

pub fn empty_defense() -> DefenseStrength {
    DefenseStrength::new()
}
