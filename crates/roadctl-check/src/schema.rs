//! Draft-07 schema validation behind a capability trait.
//!
//! The operation engine never sees the validator; callers compile a schema
//! once and ask for findings per document. All violations are collected and
//! sorted by location so reports are deterministic.

use serde_json::Value;
use std::fmt;

/// One schema violation: a JSON-pointer-style location plus the validator's
/// message. The document root renders as `$`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub location: String,
    pub message: String,
}

impl Finding {
    pub fn new(location: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.message)
    }
}

/// Errors from compiling a schema document.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("schema is not a valid JSON Schema document: {0}")]
    Invalid(String),
}

/// The pluggable validation seam: a document in, violations out.
pub trait DocumentValidator {
    fn findings(&self, document: &Value) -> Vec<Finding>;
}

/// A compiled draft-07 schema.
pub struct CompiledSchema {
    validator: jsonschema::Validator,
}

impl CompiledSchema {
    pub fn new(schema: &Value) -> Result<Self, SchemaError> {
        let validator = jsonschema::validator_for(schema)
            .map_err(|err| SchemaError::Invalid(err.to_string()))?;
        Ok(Self { validator })
    }
}

impl DocumentValidator for CompiledSchema {
    fn findings(&self, document: &Value) -> Vec<Finding> {
        let mut findings: Vec<Finding> = self
            .validator
            .iter_errors(document)
            .map(|err| {
                let pointer = err.instance_path.to_string();
                let location = if pointer.is_empty() {
                    "$".to_string()
                } else {
                    pointer
                };
                Finding::new(location, err.to_string())
            })
            .collect();
        findings.sort_by(|a, b| a.location.cmp(&b.location).then(a.message.cmp(&b.message)));
        findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn plan_schema() -> CompiledSchema {
        let schema = json!({
            "$schema": "http://json-schema.org/draft-07/schema#",
            "type": "object",
            "required": ["plan"],
            "properties": {
                "plan": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "required": ["id"],
                        "properties": {
                            "id": { "type": "string" },
                            "status": { "type": "string" }
                        }
                    }
                }
            }
        });
        CompiledSchema::new(&schema).expect("schema should compile")
    }

    #[test]
    fn valid_document_yields_no_findings() {
        let doc = json!({"plan": [{"id": "a"}, {"id": "b", "status": "open"}]});
        assert!(plan_schema().findings(&doc).is_empty());
    }

    #[test]
    fn root_violation_is_located_at_dollar() {
        let findings = plan_schema().findings(&json!({"title": "no plan"}));
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].location, "$");
        assert!(findings[0].message.contains("plan"));
    }

    #[test]
    fn all_violations_are_collected_and_sorted_by_location() {
        let doc = json!({"plan": [{"id": 1}, {"id": "ok", "status": 2}, {"title": "no id"}]});
        let findings = plan_schema().findings(&doc);
        assert!(findings.len() >= 3);
        let locations: Vec<&str> = findings.iter().map(|f| f.location.as_str()).collect();
        let mut sorted = locations.clone();
        sorted.sort();
        assert_eq!(locations, sorted);
        assert!(locations.iter().any(|loc| loc.starts_with("/plan/0")));
        assert!(locations.iter().any(|loc| loc.starts_with("/plan/1")));
        assert!(locations.iter().any(|loc| loc.starts_with("/plan/2")));
    }

    #[test]
    fn invalid_schema_documents_are_rejected_at_compile_time() {
        let schema = json!({"type": "definitely-not-a-type"});
        assert!(matches!(
            CompiledSchema::new(&schema),
            Err(SchemaError::Invalid(_))
        ));
    }
}
