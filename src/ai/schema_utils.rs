use schemars::JsonSchema;
use schemars::schema_for;
use serde_json::{Map, Value, json};

const MAX_DEPTH: usize = 16;

/// Self-contained JSON Schema for `T`, references inlined and metadata removed.
pub fn schema_value<T: JsonSchema>() -> serde_json::Result<Value> {
    let mut root = serde_json::to_value(schema_for!(T))?;

    let definitions = root
        .get("definitions")
        .or_else(|| root.get("$defs"))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    inline_node(&mut root, &definitions, 0);

    if let Value::Object(map) = &mut root {
        map.remove("definitions");
        map.remove("$defs");
    }
    Ok(root)
}

/// Schema text appended to a JSON-mode instruction.
pub fn schema_block<T: JsonSchema>() -> serde_json::Result<String> {
    let schema = serde_json::to_string_pretty(&schema_value::<T>()?)?;
    Ok(format!("REQUIRED OUTPUT SCHEMA:\n{schema}"))
}

fn inline_node(node: &mut Value, definitions: &Map<String, Value>, depth: usize) {
    if depth > MAX_DEPTH {
        *node = json!({ "type": "object" });
        return;
    }

    // Resolve before borrowing the map mutably below.
    let target = node
        .get("$ref")
        .and_then(Value::as_str)
        .and_then(|r| r.rsplit('/').next())
        .map(str::to_string);
    if let Some(name) = target {
        let description = node.get("description").cloned();
        *node = definitions
            .get(&name)
            .cloned()
            .unwrap_or_else(|| json!({ "type": "object" }));
        if let (Some(desc), Value::Object(map)) = (description, &mut *node) {
            map.insert("description".into(), desc);
        }
    }

    // schemars wraps a described $ref as `allOf: [ {$ref} ]`; flatten it.
    if let Value::Object(map) = node {
        if let Some(Value::Array(all_of)) = map.get("allOf") {
            if all_of.len() == 1 {
                let mut inner = all_of[0].clone();
                inline_node(&mut inner, definitions, depth + 1);
                map.remove("allOf");
                if let Value::Object(inner_map) = inner {
                    for (k, v) in inner_map {
                        map.entry(k).or_insert(v);
                    }
                }
            }
        }
    }

    match node {
        Value::Object(map) => {
            for key in ["$schema", "$id", "title", "default", "examples"] {
                map.remove(key);
            }

            if let Some(Value::Object(props)) = map.get_mut("properties") {
                for val in props.values_mut() {
                    inline_node(val, definitions, depth + 1);
                }
            }
            if let Some(val) = map.get_mut("items") {
                inline_node(val, definitions, depth + 1);
            }
            for key in ["allOf", "anyOf", "oneOf"] {
                if let Some(Value::Array(arr)) = map.get_mut(key) {
                    for item in arr.iter_mut() {
                        inline_node(item, definitions, depth + 1);
                    }
                }
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_node(item, definitions, depth + 1);
            }
        }
        _ => {}
    }
}
