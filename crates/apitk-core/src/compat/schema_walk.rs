//! Schema-position-aware normalization of a raw document tree.
//!
//! Rewrites boolean schemas to their object equivalents (`true` → `{}`,
//! `false` → `{not: {}}`), `x-nullable` to `nullable` and Swagger's
//! `type: file` to a binary string.

use serde_json::{Map, Value, json};

const OPERATION_KEYS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Normalize a single schema node and everything nested under it.
pub fn normalize_schema_node(schema: &mut Value) {
    match schema {
        Value::Bool(true) => *schema = json!({}),
        Value::Bool(false) => *schema = json!({ "not": {} }),
        Value::Object(map) => normalize_schema_object(map),
        _ => {}
    }
}

fn normalize_schema_object(map: &mut Map<String, Value>) {
    if let Some(flag) = map.remove("x-nullable") {
        if flag.as_bool() == Some(true) {
            map.insert("nullable".to_string(), Value::Bool(true));
        }
    }
    if map.get("type").and_then(Value::as_str) == Some("file") {
        map.insert("type".to_string(), json!("string"));
        map.insert("format".to_string(), json!("binary"));
    }
    if let Some(Value::Object(props)) = map.get_mut("properties") {
        props.values_mut().for_each(normalize_schema_node);
    }
    for key in ["items", "not"] {
        if let Some(child) = map.get_mut(key) {
            normalize_schema_node(child);
        }
    }
    // `additionalProperties: true|false` is a flag, not a schema.
    if let Some(child) = map.get_mut("additionalProperties") {
        if child.is_object() {
            normalize_schema_node(child);
        }
    }
    for key in ["allOf", "anyOf", "oneOf"] {
        if let Some(Value::Array(branches)) = map.get_mut(key) {
            branches.iter_mut().for_each(normalize_schema_node);
        }
    }
}

/// Normalize every schema slot of an OpenAPI 3 document.
pub fn normalize_document(doc: &mut Value) {
    let Some(root) = doc.as_object_mut() else {
        return;
    };

    if let Some(Value::Object(components)) = root.get_mut("components") {
        if let Some(Value::Object(schemas)) = components.get_mut("schemas") {
            schemas.values_mut().for_each(normalize_schema_node);
        }
        if let Some(Value::Object(params)) = components.get_mut("parameters") {
            params.values_mut().for_each(normalize_parameter);
        }
        if let Some(Value::Object(bodies)) = components.get_mut("requestBodies") {
            bodies.values_mut().for_each(normalize_content_holder);
        }
        if let Some(Value::Object(responses)) = components.get_mut("responses") {
            responses.values_mut().for_each(normalize_response);
        }
    }

    let Some(Value::Object(paths)) = root.get_mut("paths") else {
        return;
    };
    for item in paths.values_mut() {
        let Some(item) = item.as_object_mut() else {
            continue;
        };
        if let Some(Value::Array(params)) = item.get_mut("parameters") {
            params.iter_mut().for_each(normalize_parameter);
        }
        for method in OPERATION_KEYS {
            if let Some(Value::Object(op)) = item.get_mut(method) {
                normalize_operation(op);
            }
        }
    }
}

fn normalize_operation(op: &mut Map<String, Value>) {
    if let Some(Value::Array(params)) = op.get_mut("parameters") {
        params.iter_mut().for_each(normalize_parameter);
    }
    if let Some(body) = op.get_mut("requestBody") {
        normalize_content_holder(body);
    }
    if let Some(Value::Object(responses)) = op.get_mut("responses") {
        responses.values_mut().for_each(normalize_response);
    }
}

fn normalize_parameter(param: &mut Value) {
    if let Some(schema) = param.get_mut("schema") {
        normalize_schema_node(schema);
    }
    normalize_content_holder(param);
}

fn normalize_response(response: &mut Value) {
    normalize_content_holder(response);
    if let Some(Value::Object(headers)) = response.get_mut("headers") {
        headers.values_mut().for_each(normalize_parameter);
    }
}

fn normalize_content_holder(holder: &mut Value) {
    if let Some(Value::Object(content)) = holder.get_mut("content") {
        for media in content.values_mut() {
            if let Some(schema) = media.get_mut("schema") {
                normalize_schema_node(schema);
            }
        }
    }
}
