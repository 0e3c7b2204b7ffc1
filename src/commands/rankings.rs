//! Rankings command implementation

use tracing::info;

use super::common::CommandContext;
use crate::{
    cli::types::{Position, Week},
    projection::{board::build_board, pipeline::resolve_seed, BoardFilter, BoardRow},
    Result,
};

/// Parameters for the rankings command
#[derive(Debug, Clone, Default)]
pub struct RankingsParams {
    /// Week to show; defaults to the latest stored week, then the target week.
    pub week: Option<Week>,
    pub positions: Option<Vec<Position>>,
    pub search: Option<String>,
    pub limit: Option<usize>,
    pub as_json: bool,
}

/// Load stored projections and build the ranking board.
pub fn run_rankings(ctx: &CommandContext, params: &RankingsParams) -> Result<Vec<BoardRow>> {
    let week = match params.week {
        Some(week) => week,
        None => ctx
            .db
            .latest_projection_week()?
            .unwrap_or(ctx.config.target_week),
    };

    let rows = ctx.db.load_projections(week)?;
    info!(week = %week, rows = rows.len(), "Loaded projections");

    let filter = BoardFilter {
        positions: params.positions.clone().unwrap_or_default(),
        search: params.search.clone(),
    };
    let mut board = build_board(
        &rows,
        &filter,
        ctx.config.simulations,
        resolve_seed(&ctx.config),
    );
    if let Some(limit) = params.limit {
        board.truncate(limit);
    }
    Ok(board)
}

/// Handle the rankings command
pub fn handle_rankings(ctx: &CommandContext, params: RankingsParams) -> Result<()> {
    let board = run_rankings(ctx, &params)?;

    if params.as_json {
        println!("{}", serde_json::to_string_pretty(&board)?);
        return Ok(());
    }

    if board.is_empty() {
        println!("No projections match the given filters");
        return Ok(());
    }

    println!(
        "{:>4}  {:<24} {:<3} {:<4} {:>6} {:>6} {:>6} {:>6} {:>6}",
        "Rank", "Player", "Pos", "Team", "Median", "P10", "P90", "Boom%", "Bust%"
    );
    for row in &board {
        let p = &row.projection;
        println!(
            "{:>4}  {:<24} {:<3} {:<4} {:>6.1} {:>6.1} {:>6.1} {:>6.1} {:>6.1}",
            row.rank,
            p.player_name,
            p.position,
            p.team,
            p.median,
            p.p10,
            p.p90,
            row.boom_pct,
            row.bust_pct
        );
    }

    Ok(())
}
