//! Ranking board: filtered, median-ranked projections with boom/bust odds.

use rayon::prelude::*;
use serde::Serialize;

use super::boom_bust::{estimate, BoomBust};
use super::simulate::{player_rng, Interval};
use super::types::ProjectionRow;
use crate::cli::types::Position;

/// Offset mixed into the run seed so boom/bust draws never reuse the
/// projection simulation's streams.
const BOOM_BUST_SEED_OFFSET: u64 = 0x5eed_b00b;

/// Which projections make it onto the board.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoardFilter {
    /// Empty means every position.
    pub positions: Vec<Position>,
    /// Case-insensitive substring of the player name.
    pub search: Option<String>,
}

impl BoardFilter {
    pub fn matches(&self, row: &ProjectionRow) -> bool {
        let position_ok = self.positions.is_empty() || self.positions.contains(&row.position);
        let search_ok = match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => row
                .player_name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        };
        position_ok && search_ok
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardRow {
    /// Dense rank by descending median, starting at 1.
    pub rank: u32,
    #[serde(flatten)]
    pub projection: ProjectionRow,
    pub boom_pct: f64,
    pub bust_pct: f64,
}

/// Filter, sort by median, dense-rank and attach boom/bust odds.
pub fn build_board(
    rows: &[ProjectionRow],
    filter: &BoardFilter,
    draws: usize,
    seed: u64,
) -> Vec<BoardRow> {
    let mut selected: Vec<&ProjectionRow> = rows.iter().filter(|r| filter.matches(r)).collect();
    selected.sort_by(|a, b| b.median.total_cmp(&a.median));

    let mut ranks = Vec::with_capacity(selected.len());
    let mut rank = 0u32;
    let mut previous: Option<f64> = None;
    for row in &selected {
        if previous != Some(row.median) {
            rank += 1;
            previous = Some(row.median);
        }
        ranks.push(rank);
    }

    let board_seed = seed.wrapping_add(BOOM_BUST_SEED_OFFSET);
    selected
        .into_par_iter()
        .zip(ranks)
        .enumerate()
        .map(|(idx, (row, rank))| {
            let interval = Interval {
                p10: row.p10,
                median: row.median,
                p90: row.p90,
            };
            let BoomBust { boom_pct, bust_pct } =
                estimate(&interval, draws, &mut player_rng(board_seed, idx as u64));
            BoardRow {
                rank,
                projection: row.clone(),
                boom_pct,
                bust_pct,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::types::{PlayerId, Week};
    use crate::projection::types::StatLine;

    fn row(name: &str, position: Position, median: f64) -> ProjectionRow {
        ProjectionRow {
            player_id: PlayerId::new(name),
            player_name: name.to_string(),
            team: "BUF".to_string(),
            position,
            opponent: "MIA".to_string(),
            week: Week::new(11),
            rank: 0,
            mu: median,
            median,
            p10: median - 5.0,
            p90: median + 5.0,
            statline: StatLine::default(),
        }
    }

    fn sample() -> Vec<ProjectionRow> {
        vec![
            row("Josh Allen", Position::QB, 24.0),
            row("James Cook", Position::RB, 15.0),
            row("Khalil Shakir", Position::WR, 12.0),
            row("Dalton Kincaid", Position::TE, 12.0),
            row("Keon Coleman", Position::WR, 8.0),
        ]
    }

    #[test]
    fn test_dense_rank_by_median() {
        let board = build_board(&sample(), &BoardFilter::default(), 500, 7);
        let ranks: Vec<u32> = board.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 2, 3, 3, 4]);
        assert_eq!(board[0].projection.player_name, "Josh Allen");
    }

    #[test]
    fn test_position_filter_then_rank() {
        let filter = BoardFilter {
            positions: vec![Position::WR],
            search: None,
        };
        let board = build_board(&sample(), &filter, 500, 7);
        assert_eq!(board.len(), 2);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].rank, 2);
        assert!(board.iter().all(|r| r.projection.position == Position::WR));
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let filter = BoardFilter {
            positions: Vec::new(),
            search: Some("  KIN".to_string()),
        };
        let board = build_board(&sample(), &filter, 500, 7);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].projection.player_name, "Dalton Kincaid");
    }

    #[test]
    fn test_boom_bust_in_range_and_reproducible() {
        let a = build_board(&sample(), &BoardFilter::default(), 5000, 42);
        let b = build_board(&sample(), &BoardFilter::default(), 5000, 42);
        assert_eq!(a, b);
        for r in &a {
            assert!((0.0..=100.0).contains(&r.boom_pct));
            assert!((0.0..=100.0).contains(&r.bust_pct));
        }
    }
}
