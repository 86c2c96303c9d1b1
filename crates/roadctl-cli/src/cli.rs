use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "roadctl",
    about = "Roadmap tooling: schema-gated plan-delta application plus roadmap/decision validators",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply plan-delta ops to a roadmap with schema gates before and after
    ApplyDelta {
        /// Path to the roadmap JSON to update
        #[arg(long)]
        roadmap: String,

        /// Plan-delta JSON file(s), directories, or globs (applied in resolved order)
        #[arg(long, required = true, num_args = 1..)]
        delta: Vec<String>,

        /// Output path (defaults to overwriting --roadmap)
        #[arg(long)]
        out: Option<String>,

        /// Print the updated roadmap to stdout without writing any file
        #[arg(long)]
        dry_run: bool,

        /// Skip schema validation of inputs and output
        #[arg(long)]
        no_validate: bool,

        /// Roadmap schema override (defaults to the embedded schema)
        #[arg(long)]
        schema: Option<String>,

        /// Plan-delta schema override (defaults to the embedded schema)
        #[arg(long)]
        delta_schema: Option<String>,
    },

    /// Validate roadmap JSON against schema and authoring checks
    ValidateRoadmap {
        /// JSON files, directories, or globs (e.g. roadmap.json or docs/**/roadmap*.json)
        #[arg(required = true)]
        paths: Vec<String>,

        /// Schema override path (defaults to the embedded roadmap schema)
        #[arg(long)]
        schema: Option<String>,

        /// Enforce evidence format and file/line existence for references[*].evidence
        #[arg(long)]
        strict_evidence: bool,

        /// Repository root for resolving file references
        #[arg(long, default_value = ".")]
        repo_root: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate decision (ADR) JSON against the decision schema
    ValidateDecision {
        /// JSON files, directories, or globs
        #[arg(required = true)]
        paths: Vec<String>,

        /// Schema override path (defaults to the embedded decision schema)
        #[arg(long)]
        schema: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
