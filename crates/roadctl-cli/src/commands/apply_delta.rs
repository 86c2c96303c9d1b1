//! The roadmap update pipeline: validate → apply → validate.
//!
//! Every step is a hard gate unless `--no-validate` is set. A failing gate
//! never persists output: the roadmap file on disk is only touched after
//! the final schema check passes.

use crate::support::{
    EXIT_INVALID, EXIT_IO, PLAN_DELTA_SCHEMA_JSON, ROADMAP_SCHEMA_JSON, compiled_schema_or_exit,
    eprint_findings, resolve_json_inputs,
};
use roadctl_check::{CompiledSchema, DocumentValidator};
use roadctl_plan::{apply_ops, load_document, load_value, to_pretty_string, write_pretty};
use serde_json::Value;
use std::path::PathBuf;

pub struct Args {
    pub roadmap: String,
    pub delta: Vec<String>,
    pub out: Option<String>,
    pub dry_run: bool,
    pub no_validate: bool,
    pub schema: Option<String>,
    pub delta_schema: Option<String>,
}

pub fn run(args: Args) {
    let roadmap_path = PathBuf::from(&args.roadmap);
    let mut roadmap = load_document(&roadmap_path).unwrap_or_else(|err| {
        eprintln!("Failed to load roadmap: {err}");
        std::process::exit(EXIT_IO);
    });

    let gates = (!args.no_validate).then(|| Gates {
        roadmap: compiled_schema_or_exit(ROADMAP_SCHEMA_JSON, args.schema.as_deref()),
        delta: compiled_schema_or_exit(PLAN_DELTA_SCHEMA_JSON, args.delta_schema.as_deref()),
    });

    if let Some(gates) = &gates {
        let findings = gates.roadmap.findings(&Value::Object(roadmap.clone()));
        if !findings.is_empty() {
            eprintln!("Roadmap failed schema validation before applying deltas:");
            eprint_findings(&findings);
            std::process::exit(EXIT_INVALID);
        }
    }

    let delta_files = resolve_json_inputs(&args.delta);
    if delta_files.is_empty() {
        println!("No delta files found.");
        return;
    }

    for delta_path in &delta_files {
        let delta = load_value(delta_path).unwrap_or_else(|err| {
            eprintln!("Failed to load delta {}: {err}", delta_path.display());
            std::process::exit(EXIT_IO);
        });

        if let Some(gates) = &gates {
            let findings = gates.delta.findings(&delta);
            if !findings.is_empty() {
                eprintln!("Delta failed schema validation: {}", delta_path.display());
                eprint_findings(&findings);
                std::process::exit(EXIT_INVALID);
            }
        }

        let ops: Vec<Value> = match delta.get("ops") {
            Some(Value::Array(ops)) => ops.clone(),
            _ => Vec::new(),
        };
        if let Err(err) = apply_ops(&mut roadmap, &ops) {
            eprintln!("Failed applying ops from {}: {err}", delta_path.display());
            std::process::exit(EXIT_INVALID);
        }
    }

    let updated = Value::Object(roadmap);
    if let Some(gates) = &gates {
        // Each op may have succeeded while the combined result still breaks
        // the roadmap shape; never persist silently-invalid output.
        let findings = gates.roadmap.findings(&updated);
        if !findings.is_empty() {
            eprintln!("Updated roadmap failed schema validation:");
            eprint_findings(&findings);
            std::process::exit(EXIT_INVALID);
        }
    }

    if args.dry_run {
        print!("{}", to_pretty_string(&updated));
        return;
    }

    let out_path = args.out.map(PathBuf::from).unwrap_or(roadmap_path);
    write_pretty(&out_path, &updated).unwrap_or_else(|err| {
        eprintln!("Failed to write roadmap: {err}");
        std::process::exit(EXIT_IO);
    });
    println!("Updated roadmap written to {}", out_path.display());
}

struct Gates {
    roadmap: CompiledSchema,
    delta: CompiledSchema,
}
