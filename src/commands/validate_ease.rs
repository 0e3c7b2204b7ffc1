//! Validate-ease command implementation

use super::common::CommandContext;
use crate::{
    cli::types::Week,
    projection::ease_check::{validate_ease, EaseReport},
    Result,
};

/// Regress realized points on the defense ease factor for each position,
/// using history through `through_week` (default: the training window end).
pub fn run_validate_ease(ctx: &CommandContext, through_week: Option<Week>) -> Result<EaseReport> {
    let through = through_week.unwrap_or(ctx.config.train_end);
    let history = ctx.db.load_history(through)?;
    let defense = ctx.db.load_defense_strength()?;
    validate_ease(&history, &defense, ctx.config.min_training_rows)
}

/// Handle the validate-ease command
pub fn handle_validate_ease(
    ctx: &CommandContext,
    through_week: Option<Week>,
    as_json: bool,
) -> Result<()> {
    let report = run_validate_ease(ctx, through_week)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if report.fits.is_empty() && report.skipped.is_empty() {
        println!("No player-weeks joined to the defense strength table");
        return Ok(());
    }

    for fit in &report.fits {
        println!(
            "{:<3} R²={:.3} | coef={:.3} | r={:.3} | p={:.3} | n={}",
            fit.position, fit.r_squared, fit.coefficient, fit.pearson_r, fit.p_value, fit.n
        );
    }
    for skipped in &report.skipped {
        println!(
            "⚠ {:<3} skipped: {} rows, {} required",
            skipped.position, skipped.rows, skipped.required
        );
    }

    Ok(())
}
