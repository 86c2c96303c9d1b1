//! Plan-delta operation engine.
//!
//! Ops arrive as raw JSON objects tagged by `"op"` and are decoded one at a
//! time while the sequence executes. Decoding at application time (instead
//! of up front) is what gives a malformed third op the same contract as a
//! semantically bad one: the first two stay applied, the rest never run.
//!
//! The id→position index over `plan` is a derived cache. Any op that
//! changes membership or order rebuilds it; `add` extends it in place.

use crate::document::Document;
use serde_json::{Map, Value, json};
use std::collections::{HashMap, HashSet};

/// A single failed operation. Aborts the remainder of its op list.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeltaError {
    /// The op entry itself is not an object carrying a string `op` tag.
    #[error("op entry must be a JSON object with a string `op` tag")]
    OpShape,

    /// A known op is missing a required field or carries a wrong type.
    #[error("{op} op is malformed: requires {expected}")]
    Malformed {
        op: &'static str,
        expected: &'static str,
    },

    #[error("duplicate id in add: {0}")]
    DuplicateId(String),

    #[error("update id not found: {0}")]
    UnknownId(String),

    #[error("unsupported op: {0}")]
    Unsupported(String),
}

/// Apply an ordered op list to a roadmap document, fail-fast.
///
/// On error the roadmap still reflects every op applied before the failing
/// one; deciding whether a partially mutated roadmap may be persisted is the
/// caller's concern, not the engine's.
pub fn apply_ops(roadmap: &mut Document, ops: &[Value]) -> Result<(), DeltaError> {
    let mut plan: Vec<Value> = match roadmap.get("plan") {
        Some(Value::Array(items)) => items.clone(),
        _ => Vec::new(),
    };
    let mut index = rebuild_index(&plan);

    let mut outcome = Ok(());
    for op in ops {
        if let Err(err) = apply_one(roadmap, &mut plan, &mut index, op) {
            outcome = Err(err);
            break;
        }
    }

    roadmap.insert("plan".to_string(), Value::Array(plan));
    outcome
}

fn apply_one(
    roadmap: &mut Document,
    plan: &mut Vec<Value>,
    index: &mut HashMap<String, usize>,
    op: &Value,
) -> Result<(), DeltaError> {
    let body = op.as_object().ok_or(DeltaError::OpShape)?;
    let tag = body
        .get("op")
        .and_then(Value::as_str)
        .ok_or(DeltaError::OpShape)?;

    match tag {
        "add" => apply_add(plan, index, body),
        "update" => apply_update(plan, index, body),
        "remove" => apply_remove(plan, index, body),
        "reorder" => apply_reorder(plan, index, body),
        "set_next_step" => apply_set_next_step(roadmap, body),
        other => Err(DeltaError::Unsupported(other.to_string())),
    }
}

fn apply_add(
    plan: &mut Vec<Value>,
    index: &mut HashMap<String, usize>,
    body: &Map<String, Value>,
) -> Result<(), DeltaError> {
    const SHAPE: DeltaError = DeltaError::Malformed {
        op: "add",
        expected: "an object `item` with a string `id`",
    };
    let item = body.get("item").and_then(Value::as_object).ok_or(SHAPE)?;
    let id = item.get("id").and_then(Value::as_str).ok_or(SHAPE)?;
    if index.contains_key(id) {
        return Err(DeltaError::DuplicateId(id.to_string()));
    }
    index.insert(id.to_string(), plan.len());
    plan.push(Value::Object(item.clone()));
    Ok(())
}

fn apply_update(
    plan: &mut [Value],
    index: &HashMap<String, usize>,
    body: &Map<String, Value>,
) -> Result<(), DeltaError> {
    const SHAPE: DeltaError = DeltaError::Malformed {
        op: "update",
        expected: "a string `id` and an object `fields`",
    };
    let id = body.get("id").and_then(Value::as_str).ok_or(SHAPE)?;
    let fields = body.get("fields").and_then(Value::as_object).ok_or(SHAPE)?;
    let pos = *index
        .get(id)
        .ok_or_else(|| DeltaError::UnknownId(id.to_string()))?;
    // Only objects ever enter the index, so the slot is an object.
    if let Some(Value::Object(existing)) = plan.get_mut(pos) {
        deep_merge(existing, fields);
    }
    Ok(())
}

fn apply_remove(
    plan: &mut Vec<Value>,
    index: &mut HashMap<String, usize>,
    body: &Map<String, Value>,
) -> Result<(), DeltaError> {
    let id = body
        .get("id")
        .and_then(Value::as_str)
        .ok_or(DeltaError::Malformed {
            op: "remove",
            expected: "a string `id`",
        })?;
    // Removing an absent id is a no-op: removal is idempotent.
    if let Some(pos) = index.get(id).copied() {
        plan.remove(pos);
        *index = rebuild_index(plan);
    }
    Ok(())
}

fn apply_reorder(
    plan: &mut Vec<Value>,
    index: &mut HashMap<String, usize>,
    body: &Map<String, Value>,
) -> Result<(), DeltaError> {
    const SHAPE: DeltaError = DeltaError::Malformed {
        op: "reorder",
        expected: "an array `order` of string ids",
    };
    let order = body.get("order").and_then(Value::as_array).ok_or(SHAPE)?;
    let mut wanted = Vec::with_capacity(order.len());
    for entry in order {
        wanted.push(entry.as_str().ok_or(SHAPE)?);
    }

    // Stable partial reorder: ids named in `order` that exist move to the
    // front in the given order, everything else keeps its prior relative
    // order behind them. Unknown ids are ignored.
    let named: HashSet<&str> = wanted
        .iter()
        .copied()
        .filter(|id| index.contains_key(*id))
        .collect();

    let mut picked: HashMap<String, Value> = HashMap::new();
    let mut rest = Vec::new();
    for item in plan.drain(..) {
        let id = item_id(&item).map(str::to_string);
        match id {
            Some(id) if named.contains(id.as_str()) => {
                picked.insert(id, item);
            }
            _ => rest.push(item),
        }
    }

    let mut reordered = Vec::with_capacity(picked.len() + rest.len());
    for id in wanted {
        // A duplicate id in `order` yields None on its second visit, so each
        // item lands exactly once.
        if let Some(item) = picked.remove(id) {
            reordered.push(item);
        }
    }
    reordered.extend(rest);

    *plan = reordered;
    *index = rebuild_index(plan);
    Ok(())
}

fn apply_set_next_step(roadmap: &mut Document, body: &Map<String, Value>) -> Result<(), DeltaError> {
    const SHAPE: DeltaError = DeltaError::Malformed {
        op: "set_next_step",
        expected: "string `step_id` and `prompt`",
    };
    let step_id = body.get("step_id").and_then(Value::as_str).ok_or(SHAPE)?;
    let prompt = body.get("prompt").and_then(Value::as_str).ok_or(SHAPE)?;
    // step_id is deliberately not checked against plan ids; a next step may
    // point at work a later delta introduces.
    roadmap.insert(
        "next_step".to_string(),
        json!({ "step_id": step_id, "prompt": prompt }),
    );
    Ok(())
}

/// Recursive deep-merge of `src` into `dst`.
///
/// Object-into-object merges key by key; every other pairing (arrays,
/// scalars, object over scalar, scalar over object) replaces the old value
/// wholesale. Arrays are never merged elementwise.
pub fn deep_merge(dst: &mut Map<String, Value>, src: &Map<String, Value>) {
    for (key, incoming) in src {
        match (dst.get_mut(key), incoming) {
            (Some(Value::Object(existing)), Value::Object(patch)) => deep_merge(existing, patch),
            _ => {
                dst.insert(key.clone(), incoming.clone());
            }
        }
    }
}

fn rebuild_index(plan: &[Value]) -> HashMap<String, usize> {
    plan.iter()
        .enumerate()
        .filter_map(|(pos, item)| item_id(item).map(|id| (id.to_string(), pos)))
        .collect()
}

fn item_id(item: &Value) -> Option<&str> {
    item.get("id").and_then(Value::as_str)
}
