//! Rendering of [`DataModelField`]s as `attrs` field declarations.

use std::collections::HashSet;

use apitk_core::ir::{DataModelField, DataType, TypeKind, python_literal};
use serde_json::Value;

/// A field ready to be placed in a class body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedField {
    pub name: String,
    pub annotation: String,
    /// Keyword arguments of `attrs.field(...)`, empty for a bare annotation.
    pub arguments: Vec<String>,
    /// `Optional[...]` was added around the declared type.
    pub wraps_optional: bool,
}

impl RenderedField {
    pub fn line(&self) -> String {
        if self.arguments.is_empty() {
            format!("{}: {}", self.name, self.annotation)
        } else {
            format!(
                "{}: {} = attrs.field({})",
                self.name,
                self.annotation,
                self.arguments.join(", ")
            )
        }
    }
}

/// Render `field`. `declared` tells which model names may appear unquoted.
pub fn render_field(field: &DataModelField, declared: &dyn Fn(&str) -> bool) -> RenderedField {
    let base = field.data_type.render(declared);
    let wraps_optional = !field.required && !field.data_type.is_optional;
    let annotation = if wraps_optional {
        format!("Optional[{base}]")
    } else {
        base
    };

    let mut arguments = Vec::new();
    arguments.extend(default_argument(field));
    arguments.extend(metadata_argument(field));

    RenderedField {
        name: field.name.clone(),
        annotation,
        arguments,
        wraps_optional,
    }
}

/// Names a class body over `fields` may refer to: `attrs`, `Optional`, every
/// name the field types import, and `extra`.
pub fn body_names<S: AsRef<str>>(
    fields: &[DataModelField],
    extra: impl IntoIterator<Item = S>,
) -> HashSet<String> {
    let mut names: HashSet<String> = ["attrs", "Optional"].iter().map(|s| s.to_string()).collect();
    for field in fields {
        names.extend(field.data_type.imports.iter().map(|i| i.bound_name().to_string()));
    }
    names.extend(extra.into_iter().map(|s| s.as_ref().to_string()));
    names
}

/// Copies of `fields` where none is named after an entry of `reserved`.
///
/// A class attribute assigned `attrs.field(...)` rebinds its name for the
/// rest of the class body, so a field called `date` would break every later
/// `date` annotation. Such fields get a trailing `_` and keep their wire name
/// as alias.
pub fn unshadowed(fields: &[DataModelField], reserved: &HashSet<String>) -> Vec<DataModelField> {
    let mut taken: HashSet<String> = fields.iter().map(|f| f.name.clone()).collect();
    fields
        .iter()
        .map(|field| {
            let mut field = field.clone();
            if reserved.contains(&field.name) {
                let mut name = format!("{}_", field.name);
                while reserved.contains(&name) || taken.contains(&name) {
                    name.push('_');
                }
                if field.alias.is_none() {
                    field.alias = Some(field.name.clone());
                }
                taken.insert(name.clone());
                field.name = name;
            }
            field
        })
        .collect()
}

fn default_argument(field: &DataModelField) -> Option<String> {
    let fallback = || {
        log::debug!(
            "default of `{}` does not match {}; using None",
            field.name,
            field.data_type.type_hint
        );
        Some("default=None".to_string())
    };
    match &field.default {
        None | Some(Value::Null) => (!field.required).then(|| "default=None".to_string()),
        Some(Value::Array(_)) if accepts(&field.data_type, &Value::Array(Vec::new())) => {
            Some("factory=list".to_string())
        }
        Some(Value::Object(_)) if accepts(&field.data_type, &Value::Object(Default::default())) => {
            Some("factory=dict".to_string())
        }
        Some(value) if accepts(&field.data_type, value) => {
            python_literal(value).map(|literal| format!("default={literal}"))
        }
        Some(_) => fallback(),
    }
}

/// Whether `value` is an instance of `ty` at runtime.
fn accepts(ty: &DataType, value: &Value) -> bool {
    match ty.kind {
        TypeKind::Optional | TypeKind::Union => {
            ty.data_types.is_empty() || ty.data_types.iter().any(|m| accepts(m, value))
        }
        TypeKind::List => value.is_array(),
        TypeKind::Dict => value.is_object(),
        TypeKind::Literal => !value.is_array() && !value.is_object(),
        TypeKind::Custom => false,
        TypeKind::Basic => match (ty.type_hint.as_str(), value) {
            ("Any", _) => true,
            ("str", Value::String(_)) => true,
            ("int", Value::Number(n)) => n.is_i64() || n.is_u64(),
            ("float", Value::Number(_)) => true,
            ("bool", Value::Bool(_)) => true,
            _ => false,
        },
    }
}

fn metadata_argument(field: &DataModelField) -> Option<String> {
    let mut entries = Vec::new();
    if let Some(description) = &field.description {
        entries.push(format!("\"description\": {}", text_literal(description)));
    }
    if let Some(alias) = &field.alias {
        entries.push(format!(
            "\"original_name\": {}",
            py_value(&Value::String(alias.clone()))
        ));
    }
    if !field.constraints.is_empty() {
        let constraints = Value::Object(field.constraints.to_map());
        entries.push(format!("\"jsonschema\": {}", py_value(&constraints)));
    }
    (!entries.is_empty()).then(|| format!("metadata={{{}}}", entries.join(", ")))
}

/// String literal for free text; triple-quoted when it spans lines.
pub fn text_literal(text: &str) -> String {
    if text.contains('\n') {
        let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"\"\"{escaped}\"\"\"")
    } else {
        py_value(&Value::String(text.to_string()))
    }
}

/// Any JSON value as a Python expression.
pub fn py_value(value: &Value) -> String {
    match value {
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(py_value).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", py_value(&Value::String(k.clone())), py_value(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
        scalar => python_literal(scalar).unwrap_or_else(|| "None".to_string()),
    }
}
