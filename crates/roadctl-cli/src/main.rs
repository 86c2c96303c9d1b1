//! Roadctl CLI: the `roadctl` command.

mod cli;
mod commands;
mod support;

use clap::Parser;
use cli::{Cli, Commands};

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::ApplyDelta {
            roadmap,
            delta,
            out,
            dry_run,
            no_validate,
            schema,
            delta_schema,
        } => commands::apply_delta::run(commands::apply_delta::Args {
            roadmap,
            delta,
            out,
            dry_run,
            no_validate,
            schema,
            delta_schema,
        }),

        Commands::ValidateRoadmap {
            paths,
            schema,
            strict_evidence,
            repo_root,
            json,
        } => commands::validate_roadmap::run(paths, schema, strict_evidence, repo_root, json),

        Commands::ValidateDecision {
            paths,
            schema,
            json,
        } => commands::validate_decision::run(paths, schema, json),
    }
}
