//! Train command implementation

use super::common::CommandContext;
use crate::{projection::pipeline, projection::regression::ModelSet, Result};

/// Fit every position on the configured window and store coefficients and
/// residuals.
pub fn run_train(ctx: &mut CommandContext) -> Result<ModelSet> {
    let history = ctx.db.load_history(ctx.config.train_end)?;
    let defense = ctx.db.load_defense_strength()?;

    let models = pipeline::train(&history, &defense, &ctx.config)?;
    ctx.db.replace_model_outputs(&models)?;
    Ok(models)
}

/// Handle the train command
pub fn handle_train(ctx: &mut CommandContext, as_json: bool) -> Result<()> {
    let models = run_train(ctx)?;

    if as_json {
        println!("{}", serde_json::to_string_pretty(&models)?);
        return Ok(());
    }

    println!(
        "Trained on weeks {}-{}",
        ctx.config.train_start, ctx.config.train_end
    );
    for (position, model) in &models.models {
        println!(
            "✓ {:<3} n={:<5} R²={:.3}",
            position,
            model.n_rows(),
            model.r_squared
        );
    }
    for skipped in &models.skipped {
        println!(
            "⚠ {:<3} skipped: {} rows, {} required",
            skipped.position, skipped.rows, skipped.required
        );
    }

    Ok(())
}
