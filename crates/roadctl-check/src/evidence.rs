//! Evidence-reference parsing and strict existence checks.
//!
//! A roadmap's `references[*].evidence` strings point at the material that
//! backs each claim. Three shapes are accepted, tried in order:
//!
//! 1. `cmd: <command>` (case-insensitive prefix) — a command reference
//! 2. `path#L<line>` — a file reference, line anchored GitHub-style
//! 3. `path:<line>` — a file reference, line after the last colon
//!
//! Anything else is an unsupported shape. Strict mode additionally resolves
//! file references against a declared repository root and verifies the file
//! and line actually exist. Strict findings are collected per roadmap, never
//! fail-fast.

use crate::schema::Finding;
use regex::Regex;
use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

/// Minimum number of `references` entries a roadmap must carry.
pub const MIN_REFERENCES: usize = 3;

/// A parsed evidence string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvidenceRef {
    /// `cmd: <command>`; the payload may be empty, which strict mode flags.
    Command { command: String },
    /// `path#Lline` or `path:line`.
    File { path: String, line: u64 },
    Unknown,
}

fn hash_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Greedy prefix so the split happens at the last `#L` run of digits.
    RE.get_or_init(|| Regex::new(r"^(.*)#L([0-9]+)$").expect("hash-line regex must compile"))
}

fn colon_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(.*):([0-9]+)$").expect("colon-line regex must compile"))
}

/// Parse a free-text evidence string into its reference shape.
pub fn parse_evidence(raw: &str) -> EvidenceRef {
    let trimmed = raw.trim();
    // `get` guards against byte index 4 landing inside a multibyte char.
    if trimmed
        .get(..4)
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case("cmd:"))
    {
        return EvidenceRef::Command {
            command: trimmed[4..].trim().to_string(),
        };
    }
    for re in [hash_line_re(), colon_line_re()] {
        if let Some(caps) = re.captures(trimmed) {
            // The capture is all digits; parse only fails on overflow, which
            // clamps so strict mode still reports the line as out of range.
            let line = caps[2].parse::<u64>().unwrap_or(u64::MAX);
            return EvidenceRef::File {
                path: caps[1].to_string(),
                line,
            };
        }
    }
    EvidenceRef::Unknown
}

/// Structural precondition, checked independently of strict mode: the
/// roadmap must carry a `references` array with at least [`MIN_REFERENCES`]
/// entries.
pub fn reference_count_findings(document: &Value) -> Vec<Finding> {
    match document.get("references") {
        None => vec![Finding::new(
            "references",
            format!("missing (expect at least {MIN_REFERENCES} entries with claim/evidence)"),
        )],
        Some(Value::Array(rows)) if rows.len() < MIN_REFERENCES => vec![Finding::new(
            "references",
            format!("must contain at least {MIN_REFERENCES} entries"),
        )],
        Some(Value::Array(_)) => Vec::new(),
        Some(_) => vec![Finding::new("references", "must be an array")],
    }
}

/// Strict evidence checks over every `references` entry. The repository
/// root anchors file references; findings are collected, not fail-fast.
pub fn strict_evidence_findings(document: &Value, repo_root: &Path) -> Vec<Finding> {
    let Some(Value::Array(rows)) = document.get("references") else {
        return Vec::new();
    };

    let mut findings = Vec::new();
    for (idx, row) in rows.iter().enumerate() {
        let Some(entry) = row.as_object() else {
            findings.push(Finding::new(
                format!("references[{idx}]"),
                "must be an object with claim/evidence",
            ));
            continue;
        };
        let location = format!("references[{idx}].evidence");
        let evidence = entry
            .get("evidence")
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or("");
        if evidence.is_empty() {
            findings.push(Finding::new(location, "must be a non-empty string"));
            continue;
        }

        match parse_evidence(evidence) {
            EvidenceRef::Command { command } if command.is_empty() => {
                findings.push(Finding::new(
                    location,
                    "cmd must include content after 'cmd:'",
                ));
            }
            EvidenceRef::Command { .. } => {}
            EvidenceRef::File { path, line } => {
                check_file_reference(&location, &path, line, repo_root, &mut findings);
            }
            EvidenceRef::Unknown => {
                findings.push(Finding::new(
                    location,
                    "unsupported format (use path:line, path#Lline, or 'cmd: ...')",
                ));
            }
        }
    }
    findings
}

fn check_file_reference(
    location: &str,
    path: &str,
    line: u64,
    repo_root: &Path,
    findings: &mut Vec<Finding>,
) {
    if path.contains("://") {
        findings.push(Finding::new(
            location,
            format!("external URLs not allowed: {path}"),
        ));
        return;
    }
    let relative = Path::new(path);
    if relative.is_absolute() {
        findings.push(Finding::new(
            location,
            format!("absolute paths not allowed: {path}"),
        ));
        return;
    }
    let Some(resolved) = resolve_within(repo_root, relative) else {
        findings.push(Finding::new(
            location,
            format!("path escapes repository root: {path}"),
        ));
        return;
    };
    if !resolved.is_file() {
        findings.push(Finding::new(
            location,
            format!("file does not exist: {path}"),
        ));
        return;
    }
    if line == 0 {
        findings.push(Finding::new(
            location,
            format!("invalid line number in {path}:{line}"),
        ));
        return;
    }
    match count_lines_lossy(&resolved) {
        Ok(total) if (line as usize) > total => {
            findings.push(Finding::new(
                location,
                format!("line {line} exceeds file length for {path}"),
            ));
        }
        Ok(_) => {}
        Err(err) => {
            findings.push(Finding::new(
                location,
                format!("failed to read file {path}: {err}"),
            ));
        }
    }
}

/// Resolve `relative` under `root` lexically, refusing any traversal that
/// would land outside the root.
fn resolve_within(root: &Path, relative: &Path) -> Option<PathBuf> {
    let mut resolved = root.to_path_buf();
    for component in relative.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() || !resolved.starts_with(root) {
                    return None;
                }
            }
            Component::Normal(part) => resolved.push(part),
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    resolved.starts_with(root).then_some(resolved)
}

/// Count lines as text, tolerating undecodable bytes instead of failing.
fn count_lines_lossy(path: &Path) -> Result<usize, String> {
    let bytes = fs::read(path).map_err(|e| e.to_string())?;
    Ok(String::from_utf8_lossy(&bytes).lines().count())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    struct TempRepo {
        root: PathBuf,
    }

    impl TempRepo {
        fn new(prefix: &str) -> Self {
            let unique = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock should be after unix epoch")
                .as_nanos();
            let root = std::env::temp_dir().join(format!(
                "roadctl-evidence-{prefix}-{}-{unique}",
                std::process::id()
            ));
            fs::create_dir_all(&root).expect("temp repo should be created");
            Self { root }
        }

        fn write(&self, rel: &str, content: &str) {
            let path = self.root.join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("parent dirs should be created");
            }
            fs::write(path, content).expect("fixture should be written");
        }
    }

    impl Drop for TempRepo {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.root);
        }
    }

    fn references_doc(evidence: &[&str]) -> Value {
        let rows: Vec<Value> = evidence
            .iter()
            .map(|ev| json!({"claim": "c", "evidence": ev}))
            .collect();
        json!({ "references": rows })
    }

    #[test]
    fn parses_colon_and_hash_line_file_refs_identically() {
        assert_eq!(
            parse_evidence("tools/x.py:42"),
            EvidenceRef::File {
                path: "tools/x.py".to_string(),
                line: 42
            }
        );
        assert_eq!(
            parse_evidence("tools/x.py#L42"),
            EvidenceRef::File {
                path: "tools/x.py".to_string(),
                line: 42
            }
        );
    }

    #[test]
    fn hash_line_takes_priority_over_colon() {
        assert_eq!(
            parse_evidence("src/a:b.rs#L7"),
            EvidenceRef::File {
                path: "src/a:b.rs".to_string(),
                line: 7
            }
        );
    }

    #[test]
    fn colon_split_happens_at_the_last_colon() {
        assert_eq!(
            parse_evidence("c:dir/file.rs:12"),
            EvidenceRef::File {
                path: "c:dir/file.rs".to_string(),
                line: 12
            }
        );
    }

    #[test]
    fn parses_cmd_prefix_case_insensitively() {
        assert_eq!(
            parse_evidence("cmd: pytest -k foo"),
            EvidenceRef::Command {
                command: "pytest -k foo".to_string()
            }
        );
        assert_eq!(
            parse_evidence("  CMD:cargo test  "),
            EvidenceRef::Command {
                command: "cargo test".to_string()
            }
        );
    }

    #[test]
    fn non_numeric_suffixes_are_unknown() {
        assert_eq!(parse_evidence("just some prose"), EvidenceRef::Unknown);
        assert_eq!(parse_evidence("path:notaline"), EvidenceRef::Unknown);
        assert_eq!(parse_evidence("path#Lxyz"), EvidenceRef::Unknown);
    }

    #[test]
    fn multibyte_evidence_parses_without_panicking() {
        assert_eq!(
            parse_evidence("документ: см. заметки"),
            EvidenceRef::Unknown
        );
        assert_eq!(parse_evidence("说明"), EvidenceRef::Unknown);
        assert_eq!(
            parse_evidence("cmd: проверить сборку"),
            EvidenceRef::Command {
                command: "проверить сборку".to_string()
            }
        );
        assert_eq!(
            parse_evidence("docs/план.md:2"),
            EvidenceRef::File {
                path: "docs/план.md".to_string(),
                line: 2
            }
        );
    }

    #[test]
    fn overflowing_line_number_clamps_to_an_out_of_range_file_ref() {
        assert_eq!(
            parse_evidence("src/lib.rs:99999999999999999999999999"),
            EvidenceRef::File {
                path: "src/lib.rs".to_string(),
                line: u64::MAX
            }
        );

        let repo = TempRepo::new("overflow");
        repo.write("src/lib.rs", "one\ntwo\n");
        let doc = references_doc(&["src/lib.rs:99999999999999999999999999"]);
        let findings = strict_evidence_findings(&doc, &repo.root);
        assert_eq!(findings.len(), 1);
        assert!(findings[0].message.contains("exceeds file length"));
    }

    #[test]
    fn reference_count_enforces_minimum_of_three() {
        assert!(reference_count_findings(&references_doc(&["a:1", "b:2", "c:3"])).is_empty());

        let short = reference_count_findings(&references_doc(&["a:1"]));
        assert_eq!(short.len(), 1);
        assert!(short[0].message.contains("at least 3"));

        let missing = reference_count_findings(&json!({}));
        assert_eq!(missing[0].location, "references");
        assert!(missing[0].message.contains("missing"));

        let wrong_type = reference_count_findings(&json!({"references": "nope"}));
        assert!(wrong_type[0].message.contains("must be an array"));
    }

    #[test]
    fn strict_mode_accepts_existing_file_and_line() {
        let repo = TempRepo::new("ok");
        repo.write("tools/x.py", "one\ntwo\nthree\n");
        let doc = references_doc(&["tools/x.py:3", "tools/x.py#L1", "cmd: pytest -k foo"]);
        assert!(strict_evidence_findings(&doc, &repo.root).is_empty());
    }

    #[test]
    fn strict_mode_rejects_urls_absolute_paths_and_escapes() {
        let repo = TempRepo::new("shapes");
        let doc = references_doc(&[
            "https://example.com/x:1",
            "/etc/passwd:1",
            "../outside.rs:1",
        ]);
        let findings = strict_evidence_findings(&doc, &repo.root);
        assert_eq!(findings.len(), 3);
        assert!(findings[0].message.contains("external URLs not allowed"));
        assert!(findings[1].message.contains("absolute paths not allowed"));
        assert!(findings[2].message.contains("escapes repository root"));
    }

    #[test]
    fn strict_mode_flags_missing_file_and_out_of_range_line() {
        let repo = TempRepo::new("range");
        repo.write("src/lib.rs", "line1\nline2\n");
        let doc = references_doc(&["src/lib.rs:99", "src/ghost.rs:1"]);
        let findings = strict_evidence_findings(&doc, &repo.root);
        assert_eq!(findings.len(), 2);
        assert!(findings[0].message.contains("line 99 exceeds file length"));
        assert!(findings[1].message.contains("file does not exist"));
    }

    #[test]
    fn strict_mode_counts_lines_despite_undecodable_bytes() {
        let repo = TempRepo::new("lossy");
        let path = repo.root.join("notes.txt");
        fs::write(&path, b"ok\n\xff\xfe garbage\nlast\n").expect("fixture should write");
        let doc = references_doc(&["notes.txt:3"]);
        assert!(strict_evidence_findings(&doc, &repo.root).is_empty());
    }

    #[test]
    fn strict_mode_flags_empty_cmd_and_malformed_entries() {
        let repo = TempRepo::new("malformed");
        let doc = json!({
            "references": [
                {"claim": "c", "evidence": "cmd:"},
                {"claim": "c", "evidence": ""},
                "not an object"
            ]
        });
        let findings = strict_evidence_findings(&doc, &repo.root);
        assert_eq!(findings.len(), 3);
        assert!(findings[0].message.contains("content after 'cmd:'"));
        assert!(findings[1].message.contains("non-empty string"));
        assert!(findings[2].message.contains("must be an object"));
    }

    #[test]
    fn interior_dot_dot_that_stays_inside_root_is_allowed() {
        let repo = TempRepo::new("interior");
        repo.write("src/lib.rs", "fn main() {}\n");
        let doc = references_doc(&["src/../src/lib.rs:1"]);
        assert!(strict_evidence_findings(&doc, &repo.root).is_empty());
    }
}
