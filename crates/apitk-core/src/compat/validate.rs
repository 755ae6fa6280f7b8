//! Structural checks run on the adapted tree before typed decoding.

use serde_json::Value;

const OPERATION_KEYS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// Collect every structural defect of an OpenAPI 3 tree. An empty list means
/// the document can be decoded.
pub fn validate(doc: &Value) -> Vec<String> {
    let mut defects = Vec::new();
    let Some(root) = doc.as_object() else {
        defects.push("document root is not a mapping".to_string());
        return defects;
    };

    match root.get("openapi") {
        Some(Value::String(version)) if version.starts_with("3.") => {}
        Some(Value::String(version)) => {
            defects.push(format!("unsupported `openapi` version `{version}`"))
        }
        Some(other) => defects.push(format!("`openapi` must be a string, got {other}")),
        None => defects.push("missing `openapi` version".to_string()),
    }

    match root.get("info") {
        Some(Value::Object(info)) => {
            for key in ["title", "version"] {
                if !info.get(key).is_some_and(Value::is_string) {
                    defects.push(format!("missing `info.{key}`"));
                }
            }
        }
        Some(_) => defects.push("`info` must be a mapping".to_string()),
        None => defects.push("missing `info`".to_string()),
    }

    match root.get("paths") {
        Some(Value::Object(paths)) => {
            for (path, item) in paths {
                if !path.starts_with('/') {
                    defects.push(format!("path `{path}` must start with `/`"));
                }
                let Some(item) = item.as_object() else {
                    defects.push(format!("path item `{path}` must be a mapping"));
                    continue;
                };
                for method in OPERATION_KEYS {
                    if let Some(op) = item.get(method) {
                        if !op.is_object() {
                            defects.push(format!(
                                "operation `{} {path}` must be a mapping",
                                method.to_uppercase()
                            ));
                        }
                    }
                }
            }
        }
        Some(_) => defects.push("`paths` must be a mapping".to_string()),
        None => defects.push("missing `paths`".to_string()),
    }

    defects
}
