//! Roadmap validator: schema findings, the references authoring check, and
//! (optionally) strict evidence verification against the repository root.

use crate::support::{
    EXIT_INVALID, ROADMAP_SCHEMA_JSON, compiled_schema_or_exit, findings_payload, print_findings,
    resolve_json_inputs,
};
use roadctl_check::{
    DocumentValidator, Finding, reference_count_findings, strict_evidence_findings,
};
use roadctl_plan::load_value;
use serde_json::json;
use std::fs;
use std::path::PathBuf;

pub fn run(
    paths: Vec<String>,
    schema_override: Option<String>,
    strict_evidence: bool,
    repo_root: String,
    json_output: bool,
) {
    let schema = compiled_schema_or_exit(ROADMAP_SCHEMA_JSON, schema_override.as_deref());
    let files = resolve_json_inputs(&paths);
    if files.is_empty() {
        if json_output {
            let payload = json!({
                "action": "validate.roadmap",
                "files": [],
                "issueCount": 0,
                "ok": true
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).expect("json serialization")
            );
        } else {
            println!("No JSON files found for validation.");
        }
        return;
    }

    // Strict file references resolve against the canonical root so lexical
    // escape checks are not fooled by symlinked working directories.
    let repo_root = fs::canonicalize(&repo_root).unwrap_or_else(|_| PathBuf::from(&repo_root));

    let mut total_issues = 0usize;
    let mut reports = Vec::new();
    for path in &files {
        match load_value(path) {
            Err(err) => {
                total_issues += 1;
                if json_output {
                    reports.push(json!({
                        "path": path.display().to_string(),
                        "ok": false,
                        "parseError": err.to_string()
                    }));
                } else {
                    eprintln!("FAIL {}: could not parse JSON ({err})", path.display());
                }
            }
            Ok(document) => {
                let mut findings: Vec<Finding> = schema.findings(&document);
                findings.extend(reference_count_findings(&document));
                if strict_evidence {
                    findings.extend(strict_evidence_findings(&document, &repo_root));
                }
                total_issues += findings.len();

                if json_output {
                    reports.push(json!({
                        "path": path.display().to_string(),
                        "ok": findings.is_empty(),
                        "findings": findings_payload(&findings)
                    }));
                } else if findings.is_empty() {
                    println!("OK   {}", path.display());
                } else {
                    println!("FAIL {}", path.display());
                    print_findings(&findings);
                }
            }
        }
    }

    if json_output {
        let payload = json!({
            "action": "validate.roadmap",
            "strictEvidence": strict_evidence,
            "repoRoot": repo_root.display().to_string(),
            "files": reports,
            "issueCount": total_issues,
            "ok": total_issues == 0
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&payload).expect("json serialization")
        );
    }

    if total_issues > 0 {
        eprintln!("Validation failed with {total_issues} issue(s).");
        std::process::exit(EXIT_INVALID);
    }
}
