//! Project command implementation

use super::common::{fmt_opt, CommandContext};
use crate::{
    cli::types::Week,
    projection::pipeline::{self, PipelineInputs, ProjectionRun},
    Result,
};

/// Run the full pipeline for the configured target week and store the
/// models and projections together.
pub fn run_project(ctx: &mut CommandContext) -> Result<ProjectionRun> {
    let target = ctx.config.target_week;
    let through = Week::new(target.as_u16().saturating_sub(1));

    let inputs = PipelineInputs {
        history: ctx.db.load_history(through)?,
        defense: ctx.db.load_defense_strength()?,
        baselines: ctx.db.load_week_inputs(target)?,
    };

    let run = pipeline::run(&inputs, &ctx.config)?;
    ctx.db
        .replace_run_outputs(&run.models, target, &run.projections)?;
    Ok(run)
}

/// Handle the project command
pub fn handle_project(
    ctx: &mut CommandContext,
    top: usize,
    show_stats: bool,
    as_json: bool,
) -> Result<()> {
    let run = run_project(ctx)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&run.projections)?);
        return Ok(());
    }

    println!(
        "Week {} projections ({} players, seed {})",
        run.target_week,
        run.projections.len(),
        run.seed
    );
    println!(
        "{:>4}  {:<24} {:<3} {:<4} {:<4} {:>6} {:>6} {:>6} {:>6}",
        "Rank", "Player", "Pos", "Team", "Opp", "Mu", "Median", "P10", "P90"
    );
    for row in run.projections.iter().take(top) {
        println!(
            "{:>4}  {:<24} {:<3} {:<4} {:<4} {:>6.1} {:>6.1} {:>6.1} {:>6.1}",
            row.rank,
            row.player_name,
            row.position,
            row.team,
            row.opponent,
            row.mu,
            row.median,
            row.p10,
            row.p90
        );
        if show_stats {
            println!(
                "      tgt {} rec {} rec_yd {} rush {} rush_yd {} pass_yd {}",
                fmt_opt(row.statline.proj_rec_tgt),
                fmt_opt(row.statline.proj_rec),
                fmt_opt(row.statline.proj_rec_yd),
                fmt_opt(row.statline.proj_rush_att),
                fmt_opt(row.statline.proj_rush_yd),
                fmt_opt(row.statline.proj_pass_yd)
            );
        }
    }

    for skipped in &run.models.skipped {
        println!(
            "⚠ No model for {}: {} training rows, {} required",
            skipped.position, skipped.rows, skipped.required
        );
    }
    if !run.unmodeled.is_empty() {
        println!(
            "⚠ {} players left unprojected (position has no model)",
            run.unmodeled.len()
        );
    }
    if !run.excluded.is_empty() {
        println!(
            "{} low-volume receivers excluded from projections",
            run.excluded.len()
        );
    }

    Ok(())
}
