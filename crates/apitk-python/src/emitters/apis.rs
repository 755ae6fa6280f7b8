use apitk_core::ir::{APIGroup, DataModelField, DataType, Endpoint, EndpointBody, Import};
use minijinja::context;
use serde_json::Value;

use super::render;
use crate::error::GenerateError;
use crate::fields::{body_names, py_value, render_field, unshadowed};
use crate::generator::PythonConfig;
use crate::imports::ImportManager;

/// Emit `apis.py`: one request class per endpoint of the group.
pub fn emit_apis(group: &APIGroup, config: &PythonConfig) -> Result<String, GenerateError> {
    let base = config.base_import();
    let router = config.router_import();

    let mut imports = ImportManager::new(&config.internal_packages);
    imports.add(&Import::module("attrs"))?;
    imports.add(&base)?;
    imports.add(&router)?;

    let model_names: Vec<&str> = group.models.keys().map(String::as_str).collect();
    let apis = group
        .endpoints
        .iter()
        .map(|endpoint| endpoint_to_ctx(endpoint, &model_names, &mut imports))
        .collect::<Result<Vec<_>, _>>()?;

    render(
        "apis.py.j2",
        include_str!("../../templates/apis.py.j2"),
        context! {
            imports => imports.render(),
            router => router.bound_name(),
            base => base.bound_name(),
            apis => apis,
        },
    )
}

fn endpoint_to_ctx(
    endpoint: &Endpoint,
    model_names: &[&str],
    imports: &mut ImportManager,
) -> Result<minijinja::Value, GenerateError> {
    imports.extend(&endpoint.imports)?;

    let mut constants = vec![format!("endpoint_id = {}", quoted(&endpoint.endpoint_id))];
    if let Some(content_type) = &endpoint.request_content_type {
        constants.push(format!("content_type = {}", quoted(content_type)));
    }
    if endpoint.deprecated {
        constants.push("deprecated = True".to_string());
    }

    let mut sections = Vec::new();
    let mut attributes = Vec::new();
    for (class_name, attribute, params) in [
        ("PathParams", "path_params", &endpoint.path_parameters),
        ("QueryParams", "query_params", &endpoint.query_parameters),
        ("Headers", "headers", &endpoint.header_parameters),
    ] {
        if params.is_empty() {
            continue;
        }
        sections.push(context! {
            name => class_name,
            fields => parameter_lines(params, model_names, imports)?,
        });
        if params.iter().any(|p| p.required) {
            attributes.push(format!("{attribute}: {class_name}"));
        } else {
            attributes.push(format!(
                "{attribute}: {class_name} = attrs.field(factory={class_name})"
            ));
        }
    }

    match &endpoint.request_body {
        Some(EndpointBody::Model(model)) => {
            attributes.push(format!("request_body: {}", model.normalized_name));
        }
        Some(EndpointBody::Type(ty)) => {
            attributes.push(format!("request_body: {}", ty.render(&|_| true)));
        }
        None => {}
    }
    if let Some(ty) = &endpoint.response_type {
        imports.add(&Import::typing("Optional"))?;
        let annotation = DataType::optional(ty.clone()).render(&|_| true);
        attributes.push(format!("response: {annotation} = attrs.field(default=None)"));
    }

    Ok(context! {
        class_name => endpoint.class_name.clone(),
        method => endpoint.method.as_lower(),
        path => quoted(&endpoint.path),
        doc => docstring_text(endpoint),
        constants => constants,
        sections => sections,
        attributes => attributes,
    })
}

fn parameter_lines(
    params: &[DataModelField],
    model_names: &[&str],
    imports: &mut ImportManager,
) -> Result<Vec<String>, GenerateError> {
    let reserved = body_names(params, model_names);
    let mut lines = Vec::with_capacity(params.len());
    for param in &unshadowed(params, &reserved) {
        let rendered = render_field(param, &|_| true);
        if rendered.wraps_optional {
            imports.add(&Import::typing("Optional"))?;
        }
        lines.push(rendered.line());
    }
    Ok(lines)
}

fn docstring_text(endpoint: &Endpoint) -> Option<String> {
    match (&endpoint.summary, &endpoint.description) {
        (Some(summary), Some(description)) if summary.trim() != description.trim() => {
            Some(format!("{}\n\n{}", summary.trim(), description.trim()))
        }
        (Some(text), _) | (None, Some(text)) => Some(text.clone()),
        (None, None) => None,
    }
}

fn quoted(text: &str) -> String {
    py_value(&Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use apitk_core::ir::{DataModel, HttpMethod};

    fn endpoint() -> Endpoint {
        let mut limit = DataModelField::new("limit", DataType::basic("int"));
        limit.default = Some(serde_json::json!(20));
        let mut pet_id = DataModelField::new("pet_id", DataType::basic("int"));
        pet_id.required = true;
        pet_id.alias = Some("petId".to_string());

        let mut endpoint = Endpoint {
            class_name: "ShowPetAPI".to_string(),
            path: "/pets/{petId}".to_string(),
            method: HttpMethod::Get,
            endpoint_id: "showPet".to_string(),
            tags: vec!["pets".to_string()],
            summary: Some("Show a pet".to_string()),
            description: None,
            deprecated: false,
            path_parameters: vec![pet_id],
            query_parameters: vec![limit],
            header_parameters: Vec::new(),
            request_body: None,
            request_content_type: None,
            response: Some(DataModel::new("Pet", "Pet")),
            response_type: Some(DataType::custom("Pet", None)),
            imports: Default::default(),
        };
        endpoint.collect_imports();
        endpoint
    }

    fn group_with(endpoint: Endpoint) -> APIGroup {
        let mut group = APIGroup::new("pets", "pets");
        group.add_endpoint(endpoint);
        group
    }

    #[test]
    fn renders_request_class() {
        let source = emit_apis(&group_with(endpoint()), &PythonConfig::default()).unwrap();
        assert!(source.contains("@router.get(\"/pets/{petId}\")"));
        assert!(source.contains("class ShowPetAPI(BaseAPI):"));
        assert!(source.contains("\"\"\"Show a pet\"\"\""));
        assert!(source.contains("endpoint_id = \"showPet\""));
        assert!(source.contains(
            "        pet_id: int = attrs.field(metadata={\"original_name\": \"petId\"})"
        ));
        assert!(source.contains("        limit: Optional[int] = attrs.field(default=20)"));
        assert!(source.contains("    path_params: PathParams"));
        assert!(source.contains("    query_params: QueryParams = attrs.field(factory=QueryParams)"));
        assert!(source.contains("    response: Optional[Pet] = attrs.field(default=None)"));
        assert!(source.contains("from .models import Pet"));
        assert!(source.contains("from apitk.core import BaseAPI, router"));
    }

    #[test]
    fn base_class_alias_is_used() {
        let config = PythonConfig {
            base_api_class: "myproject.http.Api".to_string(),
            base_api_class_alias: Some("Base".to_string()),
            internal_packages: vec!["myproject".to_string()],
            ..PythonConfig::default()
        };
        let source = emit_apis(&group_with(endpoint()), &config).unwrap();
        assert!(source.contains("from myproject.http import Api as Base"));
        assert!(source.contains("class ShowPetAPI(Base):"));
    }

    #[test]
    fn parameters_do_not_shadow_their_types() {
        let mut ep = endpoint();
        let mut since = DataModelField::new(
            "date",
            DataType::basic_with_import("date", Import::new("datetime", "date")),
        );
        since.required = true;
        ep.query_parameters = vec![since];
        ep.collect_imports();
        let source = emit_apis(&group_with(ep), &PythonConfig::default()).unwrap();
        assert!(source.contains("from datetime import date"));
        assert!(source.contains("        date_: date = attrs.field(metadata={\"original_name\": \"date\"})"));
    }

    #[test]
    fn bodies_and_flags() {
        let mut ep = endpoint();
        ep.method = HttpMethod::Post;
        ep.deprecated = true;
        ep.request_body = Some(EndpointBody::Type(DataType::list(DataType::basic("str"))));
        ep.request_content_type = Some("application/json".to_string());
        ep.response_type = None;
        ep.collect_imports();
        let source = emit_apis(&group_with(ep), &PythonConfig::default()).unwrap();
        assert!(source.contains("@router.post("));
        assert!(source.contains("content_type = \"application/json\""));
        assert!(source.contains("deprecated = True"));
        assert!(source.contains("request_body: List[str]"));
        assert!(!source.contains("response:"));
    }
}
