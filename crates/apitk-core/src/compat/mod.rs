//! Compatibility layer between Swagger 2.0 and OpenAPI 3 documents.

mod schema_walk;
mod swagger2;
mod validate;

use serde_json::Value;

use crate::error::ValidationError;

pub use schema_walk::normalize_schema_node;
pub use swagger2::is_swagger2;
pub use validate::validate;

/// Return a deep copy of `doc` in OpenAPI 3 shape.
///
/// Swagger 2.0 documents are rewritten; OpenAPI 3 documents only have their
/// boolean schemas expanded.
pub fn adapt(doc: &Value) -> Value {
    let mut adapted = match doc.as_object() {
        Some(map) if is_swagger2(doc) => {
            log::debug!("converting Swagger 2.0 document to OpenAPI 3.0");
            Value::Object(swagger2::convert(map))
        }
        _ => doc.clone(),
    };
    stringify_versions(&mut adapted);
    schema_walk::normalize_document(&mut adapted);
    adapted
}

/// Text of a version field. YAML reads an unquoted `2.0` as a number.
pub(crate) fn version_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn stringify_versions(doc: &mut Value) {
    let Some(root) = doc.as_object_mut() else {
        return;
    };
    stringify_number(root.get_mut("openapi"));
    if let Some(info) = root.get_mut("info").and_then(Value::as_object_mut) {
        stringify_number(info.get_mut("version"));
    }
}

fn stringify_number(slot: Option<&mut Value>) {
    if let Some(value) = slot {
        if value.is_number() {
            let text = value.to_string();
            *value = Value::String(text);
        }
    }
}

/// Adapt then validate, failing with every defect found.
pub fn prepare(doc: &Value) -> Result<Value, ValidationError> {
    let adapted = adapt(doc);
    let defects = validate(&adapted);
    if defects.is_empty() {
        Ok(adapted)
    } else {
        Err(ValidationError(defects))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load::{DocumentFormat, parse_document};
    use serde_json::json;

    #[test]
    fn openapi3_documents_pass_through() {
        let doc = json!({
            "openapi": "3.0.1",
            "info": { "title": "T", "version": "1" },
            "paths": { "/a": { "get": { "responses": { "200": { "description": "ok" } } } } },
            "components": { "schemas": { "A": { "type": "string" } } }
        });
        assert_eq!(adapt(&doc), doc);
    }

    #[test]
    fn adapting_twice_is_stable() {
        let doc = json!({
            "swagger": "2.0",
            "info": { "title": "T", "version": "1" },
            "paths": { "/a": { "get": {
                "operationId": "a",
                "responses": { "200": { "description": "ok", "schema": { "type": "string" } } }
            }}}
        });
        let once = adapt(&doc);
        assert_eq!(adapt(&once), once);
    }

    #[test]
    fn unquoted_yaml_versions_are_accepted() {
        let swagger = parse_document(
            "api.yaml",
            "swagger: 2.0\ninfo:\n  title: T\n  version: 1.0\npaths: {}\n",
            DocumentFormat::Yaml,
        )
        .unwrap();
        assert!(is_swagger2(&swagger));
        let adapted = prepare(&swagger).unwrap();
        assert_eq!(adapted["openapi"], json!("3.0.0"));
        assert_eq!(adapted["info"]["version"], json!("1.0"));

        let openapi = parse_document(
            "api.yaml",
            "openapi: 3.0\ninfo:\n  title: T\n  version: '1'\npaths: {}\n",
            DocumentFormat::Yaml,
        )
        .unwrap();
        assert_eq!(prepare(&openapi).unwrap()["openapi"], json!("3.0"));
    }

    #[test]
    fn prepare_reports_defects() {
        let err = prepare(&json!({ "openapi": "3.0.0" })).unwrap_err();
        assert_eq!(err.0, vec!["missing `info`", "missing `paths`"]);
    }
}
