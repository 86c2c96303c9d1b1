//! # roadctl-plan
//!
//! The roadmap document substrate and the plan-delta operation engine.
//!
//! This crate provides:
//! - JSON document load/save with stable formatting (2-space indent,
//!   trailing newline, key order preserved, non-ASCII left unescaped)
//! - `apply_ops`: ordered, fail-fast application of plan-delta operations
//!   to a roadmap while keeping plan ids unique and ordering stable
//! - `deep_merge`: recursive object merge used by `update` operations
//!
//! It intentionally knows nothing about schemas or the CLI surface. Schema
//! gating lives in `roadctl-check`; orchestration lives in `roadctl-cli`.
//!
//! ## Data model
//!
//! ```text
//! roadmap JSON (on disk)
//!     ↕  load / write_pretty
//! Document (ordered map, `plan` = array of id-keyed items)
//!     ←  apply_ops(plan-delta ops)
//! ```

pub mod delta;
pub mod document;

pub use delta::{DeltaError, apply_ops, deep_merge};
pub use document::{
    Document, LoadError, load_document, load_value, to_pretty_string, write_pretty,
};
