//! Entry point: parse CLI, set up logging and dispatch to command handlers.

use clap::Parser;
use ffl_proj::{
    cli::{Cli, Commands},
    commands::{
        project::handle_project,
        rankings::{handle_rankings, RankingsParams},
        train::handle_train,
        validate_ease::handle_validate_ease,
        CommandContext,
    },
    core::ConfigOverrides,
};
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "info" } else { "warn" }));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Run the CLI.
fn main() -> anyhow::Result<()> {
    let app = Cli::parse();
    init_tracing(app.global.verbose);

    let global = app.global;
    match app.command {
        Commands::Train { pipeline, json } => {
            let overrides = pipeline.overrides(global.seed);
            let mut ctx = CommandContext::new(global.db, global.config, &overrides)?;
            handle_train(&mut ctx, json)?
        }

        Commands::Project {
            pipeline,
            top,
            stats,
            json,
        } => {
            let overrides = pipeline.overrides(global.seed);
            let mut ctx = CommandContext::new(global.db, global.config, &overrides)?;
            handle_project(&mut ctx, top, stats, json)?
        }

        Commands::Rankings {
            week,
            positions,
            player_name,
            limit,
            simulations,
            json,
        } => {
            let overrides = ConfigOverrides {
                simulations,
                seed: global.seed,
                ..Default::default()
            };
            let ctx = CommandContext::new(global.db, global.config, &overrides)?;
            handle_rankings(
                &ctx,
                RankingsParams {
                    week,
                    positions,
                    search: player_name,
                    limit,
                    as_json: json,
                },
            )?
        }

        Commands::ValidateEase { through_week, json } => {
            let overrides = ConfigOverrides {
                seed: global.seed,
                ..Default::default()
            };
            let ctx = CommandContext::new(global.db, global.config, &overrides)?;
            handle_validate_ease(&ctx, through_week, json)?
        }
    }

    Ok(())
}
