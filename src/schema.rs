//! Response schemas for structured output.
//!
//! `schemars` gives us draft-07 JSON Schema; Gemini's `responseSchema` accepts a
//! narrower OpenAPI subset. `response_schema::<T>()` derives and cleans in one go.

use schemars::{schema_for, JsonSchema};
use serde_json::{json, Map, Value};

const MAX_DEPTH: usize = 20;
const MAX_REF_HOPS: usize = 10;

pub fn response_schema<T: JsonSchema>() -> Value {
  let root = serde_json::to_value(schema_for!(T)).unwrap_or_else(|_| json!({ "type": "object" }));
  clean_schema(root)
}

pub fn clean_schema(mut root: Value) -> Value {
  let definitions = root
    .get("definitions")
    .or_else(|| root.get("$defs"))
    .and_then(Value::as_object)
    .cloned()
    .unwrap_or_default();

  process_node(&mut root, &definitions, 0);

  if let Value::Object(map) = &mut root {
    map.remove("definitions");
    map.remove("$defs");
  }
  root
}

fn process_node(node: &mut Value, definitions: &Map<String, Value>, depth: usize) {
  if depth > MAX_DEPTH {
    *node = json!({ "type": "object", "nullable": true });
    return;
  }

  // Inline $ref chains before touching the map, so we never hold a borrow across the swap.
  for _ in 0..MAX_REF_HOPS {
    let target = match node {
      Value::Object(map) => map.get("$ref").and_then(Value::as_str).map(str::to_owned),
      _ => None,
    };
    let Some(target) = target else { break };
    let name = target.rsplit('/').next().unwrap_or_default();
    *node = definitions
      .get(name)
      .cloned()
      .unwrap_or_else(|| json!({ "type": "object", "description": "Unresolvable reference" }));
  }

  // schemars emits `true` for "any value"
  if let Value::Bool(allow_all) = node {
    *node = if *allow_all {
      json!({ "type": "string" })
    } else {
      json!({ "type": "object", "nullable": true })
    };
  }

  let Value::Object(map) = node else { return };

  for key in [
    "$ref",
    "$schema",
    "$id",
    "title",
    "default",
    "examples",
    "additionalProperties",
    "format",
  ] {
    map.remove(key);
  }

  if let Some(Value::Array(types)) = map.get("type").cloned() {
    let non_null: Vec<&Value> = types.iter().filter(|t| *t != &json!("null")).collect();
    if let Some(first) = non_null.first() {
      map.insert("type".into(), (*first).clone());
    }
    if non_null.len() < types.len() {
      map.insert("nullable".into(), json!(true));
    }
  }

  if let Some(Value::Object(props)) = map.get_mut("properties") {
    for child in props.values_mut() {
      process_node(child, definitions, depth + 1);
    }
  }
  if let Some(items) = map.get_mut("items") {
    process_node(items, definitions, depth + 1);
  }
  for key in ["allOf", "anyOf", "oneOf"] {
    if let Some(Value::Array(arr)) = map.get_mut(key) {
      for child in arr.iter_mut() {
        process_node(child, definitions, depth + 1);
      }
    }
  }
}
