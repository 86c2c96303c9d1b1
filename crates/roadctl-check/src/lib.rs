//! # roadctl-check
//!
//! Validation capabilities shared by the roadctl CLI:
//! - `CompiledSchema`: a draft-07 JSON Schema compiled behind the
//!   `DocumentValidator` trait, collecting every violation (never
//!   fail-fast) with JSON-pointer locations
//! - evidence-reference parsing (`path:line`, `path#Lline`, `cmd: ...`)
//!   plus strict file/line existence checks against a repository root
//! - the authoring-checklist precondition that a roadmap carries at least
//!   three `references` entries
//!
//! Findings are plain `(location, message)` rows; rendering and exit codes
//! belong to the CLI.

pub mod evidence;
pub mod schema;

pub use evidence::{
    EvidenceRef, MIN_REFERENCES, parse_evidence, reference_count_findings,
    strict_evidence_findings,
};
pub use schema::{CompiledSchema, DocumentValidator, Finding, SchemaError};
