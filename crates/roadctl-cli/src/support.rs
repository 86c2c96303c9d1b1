use roadctl_check::{CompiledSchema, Finding};
use roadctl_plan::load_value;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Embedded default schemas. `--schema` overrides load from disk instead.
pub const ROADMAP_SCHEMA_JSON: &str = include_str!("../assets/schemas/roadmap.schema.json");
pub const PLAN_DELTA_SCHEMA_JSON: &str = include_str!("../assets/schemas/plan-delta.schema.json");
pub const DECISION_SCHEMA_JSON: &str = include_str!("../assets/schemas/decision.schema.json");

/// Exit code for validation or operation failures.
pub const EXIT_INVALID: i32 = 1;
/// Exit code for environmental failures: unreadable files, bad JSON, bad schema.
pub const EXIT_IO: i32 = 2;

/// Compile the schema used by a command: the embedded default, or an
/// override path. A schema that cannot be read or compiled is an
/// environmental failure, not a validation verdict.
pub fn compiled_schema_or_exit(builtin: &str, override_path: Option<&str>) -> CompiledSchema {
    let schema_value: Value = match override_path {
        Some(path) => load_value(Path::new(path)).unwrap_or_else(|err| {
            eprintln!("Failed to load schema: {err}");
            std::process::exit(EXIT_IO);
        }),
        None => serde_json::from_str(builtin).expect("embedded schema parses"),
    };
    CompiledSchema::new(&schema_value).unwrap_or_else(|err| {
        eprintln!("Failed to compile schema: {err}");
        std::process::exit(EXIT_IO);
    })
}

/// Resolve path arguments into a concrete ordered file list. Each argument
/// may be a literal file, a directory (recursively all `.json` beneath it,
/// in sorted enumeration order), or a glob pattern relative to the CWD.
pub fn resolve_json_inputs(args: &[String]) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for arg in args {
        if arg.contains(['*', '?', '[']) {
            let matches = glob::glob(arg).unwrap_or_else(|err| {
                eprintln!("Bad glob pattern {arg}: {err}");
                std::process::exit(EXIT_IO);
            });
            files.extend(matches.flatten());
            continue;
        }
        let path = PathBuf::from(arg);
        if path.is_dir() {
            for entry in WalkDir::new(&path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(Result::ok)
            {
                if entry.file_type().is_file()
                    && entry.path().extension().is_some_and(|ext| ext == "json")
                {
                    files.push(entry.into_path());
                }
            }
        } else {
            files.push(path);
        }
    }
    files
}

pub fn print_findings(findings: &[Finding]) {
    for finding in findings {
        println!("  - {finding}");
    }
}

pub fn eprint_findings(findings: &[Finding]) {
    for finding in findings {
        eprintln!("  - {finding}");
    }
}

pub fn findings_payload(findings: &[Finding]) -> Value {
    Value::Array(
        findings
            .iter()
            .map(|f| json!({ "location": f.location, "message": f.message }))
            .collect(),
    )
}
