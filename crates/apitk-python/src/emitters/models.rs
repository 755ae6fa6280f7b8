use std::collections::HashSet;

use apitk_core::ir::{APIGroup, DataModel, Import, MODELS_MODULE, python_literal};
use minijinja::context;
use serde_json::Value;

use super::render;
use crate::error::GenerateError;
use crate::fields::{body_names, py_value, render_field, unshadowed};
use crate::generator::PythonConfig;
use crate::imports::ImportManager;

/// Emit `models.py`: one `attrs` class or `Enum` per model of the group.
pub fn emit_models(group: &APIGroup, config: &PythonConfig) -> Result<String, GenerateError> {
    let mut imports = ImportManager::new(&config.internal_packages);
    let model_names: Vec<&str> = group.models.keys().map(String::as_str).collect();
    let mut declared: HashSet<&str> = HashSet::new();
    let mut models = Vec::with_capacity(group.models.len());

    for model in declaration_order(group) {
        let is_declared = |name: &str| declared.contains(name);
        let ctx = if model.is_enum {
            imports.add(&Import::new("enum", "Enum"))?;
            enum_to_ctx(model)
        } else {
            imports.add(&Import::module("attrs"))?;
            class_to_ctx(model, &model_names, &is_declared, &mut imports)?
        };
        models.push(ctx);
        declared.insert(&model.normalized_name);
    }

    render(
        "models.py.j2",
        include_str!("../../templates/models.py.j2"),
        context! {
            imports => imports.render(),
            models => models,
        },
    )
}

fn enum_to_ctx(model: &DataModel) -> minijinja::Value {
    let members: Vec<String> = model
        .fields
        .iter()
        .map(|f| {
            let value = f
                .default
                .as_ref()
                .and_then(python_literal)
                .unwrap_or_else(|| py_value(&Value::String(f.wire_name().to_string())));
            format!("{} = {value}", f.name)
        })
        .collect();
    let bases = match model.fields.first().map(|f| f.data_type.type_hint.as_str()) {
        Some(first) if model.fields.iter().any(|f| f.data_type.type_hint != first) => "Enum",
        Some("str") => "str, Enum",
        Some("int") => "int, Enum",
        _ => "Enum",
    };
    context! {
        is_enum => true,
        name => model.normalized_name.clone(),
        description => model.description.clone(),
        bases => bases,
        members => members,
    }
}

fn class_to_ctx(
    model: &DataModel,
    model_names: &[&str],
    declared: &dyn Fn(&str) -> bool,
    imports: &mut ImportManager,
) -> Result<minijinja::Value, GenerateError> {
    let reserved = body_names(&model.fields, model_names);
    let mut fields = Vec::with_capacity(model.fields.len());
    for field in &unshadowed(&model.fields, &reserved) {
        let rendered = render_field(field, declared);
        if rendered.wraps_optional {
            imports.add(&Import::typing("Optional"))?;
        }
        imports.extend(
            field
                .data_type
                .imports
                .iter()
                .filter(|i| i.from.as_deref() != Some(MODELS_MODULE)),
        )?;
        fields.push(rendered.line());
    }
    Ok(context! {
        is_enum => false,
        name => model.normalized_name.clone(),
        description => model.description.clone(),
        fields => fields,
    })
}

/// Models ordered so that every eager dependency is declared first.
/// Forward references may point later in the file; their annotations are
/// quoted.
pub fn declaration_order(group: &APIGroup) -> Vec<&DataModel> {
    let mut done: HashSet<&str> = HashSet::new();
    let mut ordered = Vec::with_capacity(group.models.len());
    while ordered.len() < group.models.len() {
        let before = ordered.len();
        for (name, model) in &group.models {
            if done.contains(name.as_str()) {
                continue;
            }
            let ready = eager_dependencies(model)
                .into_iter()
                .all(|dep| done.contains(dep) || !group.models.contains_key(dep));
            if ready {
                done.insert(name);
                ordered.push(model);
            }
        }
        if ordered.len() == before {
            log::debug!("eager dependency cycle in `{}`; keeping registry order", group.tag);
            for (name, model) in &group.models {
                if done.insert(name) {
                    ordered.push(model);
                }
            }
        }
    }
    ordered
}

fn eager_dependencies(model: &DataModel) -> Vec<&str> {
    let mut deps = Vec::new();
    for field in &model.fields {
        for name in field.data_type.eager_custom_names() {
            if name != model.normalized_name && !deps.contains(&name) {
                deps.push(name);
            }
        }
    }
    deps
}
