//! Decision (ADR) validator: schema findings only, one verdict per file.

use crate::support::{
    DECISION_SCHEMA_JSON, EXIT_INVALID, compiled_schema_or_exit, findings_payload, print_findings,
    resolve_json_inputs,
};
use roadctl_check::DocumentValidator;
use roadctl_plan::load_value;
use serde_json::json;

pub fn run(paths: Vec<String>, schema_override: Option<String>, json_output: bool) {
    let schema = compiled_schema_or_exit(DECISION_SCHEMA_JSON, schema_override.as_deref());
    let files = resolve_json_inputs(&paths);
    if files.is_empty() {
        if json_output {
            let payload = json!({
                "action": "validate.decision",
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
                let findings = schema.findings(&document);
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
            "action": "validate.decision",
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
