//! Tests for command handlers over an in-memory database

use super::project::run_project;
use super::rankings::{run_rankings, RankingsParams};
use super::train::run_train;
use super::validate_ease::run_validate_ease;
use super::*;
use crate::cli::types::{PlayerId, Position, Week};
use crate::core::config::PipelineConfig;
use crate::projection::types::{BaselineUsage, PlayerWeekRecord};
use crate::storage::ProjectionDatabase;

const ROSTER: [(&str, &str, Position, &str); 8] = [
    ("QB1", "Patrick Mahomes", Position::QB, "KC"),
    ("QB2", "Josh Allen", Position::QB, "BUF"),
    ("RB1", "Isiah Pacheco", Position::RB, "KC"),
    ("RB2", "James Cook", Position::RB, "BUF"),
    ("WR1", "Rashee Rice", Position::WR, "KC"),
    ("WR2", "Khalil Shakir", Position::WR, "BUF"),
    ("TE1", "Travis Kelce", Position::TE, "KC"),
    ("TE2", "Dalton Kincaid", Position::TE, "BUF"),
];

fn opponent(team: &str) -> &'static str {
    if team == "KC" {
        "DEN"
    } else {
        "MIA"
    }
}

fn seeded_db() -> ProjectionDatabase {
    let mut db = ProjectionDatabase::new_in_memory().unwrap();

    for (i, (id, name, position, team)) in ROSTER.iter().enumerate() {
        db.upsert_defense_strength(opponent(team), *position, 1.0 + i as f64 * 0.02)
            .unwrap();

        for week in 1..=10u16 {
            let w = week as f64;
            let k = i as f64;
            let mut r = PlayerWeekRecord::blank(
                PlayerId::new(*id),
                *name,
                *team,
                *position,
                opponent(team),
                Week::new(week),
            );
            r.off_snp = 40.0 + k + (w % 4.0);
            match position {
                Position::QB => {
                    r.pass_att = 30.0 + (w % 5.0) + k;
                    r.pass_cmp = r.pass_att * 0.65;
                    r.pass_yd = r.pass_att * (6.5 + (w % 3.0) * 0.3);
                    r.pass_td = (w % 3.0) + 1.0;
                    r.pass_int = w % 2.0;
                    r.rush_att = 3.0 + (w % 4.0);
                    r.rush_yd = r.rush_att * 4.0 + k;
                }
                Position::RB => {
                    r.rush_att = 12.0 + (w % 6.0) + k;
                    r.rush_yd = r.rush_att * (4.0 + (w % 2.0) * 0.5);
                    r.rush_td = w % 2.0;
                    r.rec_tgt = 2.0 + (w % 3.0);
                    r.rec = r.rec_tgt - 1.0;
                    r.rec_yd = r.rec * 7.0;
                }
                Position::WR | Position::TE => {
                    r.rec_tgt = 5.0 + (w % 5.0) + k * 0.5;
                    r.rec = (r.rec_tgt * 0.65).round();
                    r.rec_yd = r.rec_tgt * (8.0 + (w % 3.0));
                    r.rec_td = if week % 4 == 0 { 1.0 } else { 0.0 };
                }
            }
            r.pts_ppr = Some(
                0.04 * r.pass_yd + 4.0 * r.pass_td - 2.0 * r.pass_int
                    + 0.1 * (r.rush_yd + r.rec_yd)
                    + 6.0 * (r.rush_td + r.rec_td)
                    + r.rec
                    + (w % 3.0) * 0.7,
            );
            db.upsert_player_week(&r).unwrap();
        }

        db.upsert_week_input(&BaselineUsage {
            player_id: PlayerId::new(*id),
            player_name: name.to_string(),
            team: team.to_string(),
            position: *position,
            opponent: opponent(team).to_string(),
            week: Week::new(11),
            rec_tgt: Some(if *position == Position::QB { 0.0 } else { 6.0 }),
            rush_att: Some(if *position == Position::RB { 15.0 } else { 2.0 }),
            pass_att: Some(if *position == Position::QB { 34.0 } else { 0.0 }),
            off_snp: Some(55.0),
            ease_factor: None,
        })
        .unwrap();
    }

    db
}

fn context() -> CommandContext {
    let config = PipelineConfig {
        train_end: Week::new(10),
        simulations: 1000,
        seed: Some(2024),
        ..Default::default()
    };
    CommandContext::with_database(seeded_db(), config)
}

#[test]
fn test_run_train_writes_coefficients_and_residuals() {
    let mut ctx = context();
    let models = run_train(&mut ctx).unwrap();

    assert!(models.skipped.is_empty());
    for position in Position::ALL {
        let stored = ctx.db.load_coefficients(position).unwrap();
        let model = models.get(position).unwrap();
        assert_eq!(stored.len(), model.features.len() + 1);
        assert_eq!(stored[0].0, "intercept");
        assert_eq!(ctx.db.count_residuals(position).unwrap(), 20);
    }
}

#[test]
fn test_run_project_stores_ranked_projections() {
    let mut ctx = context();
    let run = run_project(&mut ctx).unwrap();

    assert_eq!(run.projections.len(), ROSTER.len());
    let stored = ctx.db.load_projections(Week::new(11)).unwrap();
    assert_eq!(stored, run.projections);

    for (i, row) in stored.iter().enumerate() {
        assert_eq!(row.rank, i as u32 + 1);
        assert!(row.p10 <= row.median && row.median <= row.p90);
    }
    for pair in stored.windows(2) {
        assert!(pair[0].mu >= pair[1].mu);
    }
}

#[test]
fn test_run_project_is_reproducible_with_seed() {
    let mut first = context();
    let mut second = context();
    let a = run_project(&mut first).unwrap();
    let b = run_project(&mut second).unwrap();
    assert_eq!(a.projections, b.projections);
    assert_eq!(a.seed, 2024);
}

#[test]
fn test_rankings_filters_and_dense_ranks() {
    let mut ctx = context();
    run_project(&mut ctx).unwrap();

    let params = RankingsParams {
        positions: Some(vec![Position::WR, Position::TE]),
        ..Default::default()
    };
    let board = run_rankings(&ctx, &params).unwrap();
    assert_eq!(board.len(), 4);
    assert_eq!(board[0].rank, 1);
    assert!(board
        .iter()
        .all(|r| matches!(r.projection.position, Position::WR | Position::TE)));
    for pair in board.windows(2) {
        assert!(pair[0].projection.median >= pair[1].projection.median);
        assert!(pair[1].rank - pair[0].rank <= 1);
    }
}

#[test]
fn test_rankings_search_and_limit() {
    let mut ctx = context();
    run_project(&mut ctx).unwrap();

    let params = RankingsParams {
        search: Some("josh".to_string()),
        ..Default::default()
    };
    let board = run_rankings(&ctx, &params).unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].projection.player_name, "Josh Allen");

    let params = RankingsParams {
        limit: Some(3),
        ..Default::default()
    };
    assert_eq!(run_rankings(&ctx, &params).unwrap().len(), 3);
}

#[test]
fn test_rankings_without_projections_is_empty() {
    let ctx = context();
    let board = run_rankings(&ctx, &RankingsParams::default()).unwrap();
    assert!(board.is_empty());
}

#[test]
fn test_validate_ease_reports_every_position() {
    let ctx = context();
    let report = run_validate_ease(&ctx, None).unwrap();

    assert!(report.skipped.is_empty());
    let positions: Vec<Position> = report.fits.iter().map(|f| f.position).collect();
    assert_eq!(positions, Position::ALL.to_vec());
    for fit in &report.fits {
        assert_eq!(fit.n, 20);
        assert!((-1.0..=1.0).contains(&fit.pearson_r));
        assert!((0.0..=1.0).contains(&fit.p_value));
        assert!((fit.r_squared - fit.pearson_r.powi(2)).abs() < 1e-9);
    }

    let early = run_validate_ease(&ctx, Some(Week::new(2))).unwrap();
    assert!(early.fits.is_empty());
    assert_eq!(early.skipped.len(), 4);
    assert!(early.skipped.iter().all(|s| s.rows == 4));
}
